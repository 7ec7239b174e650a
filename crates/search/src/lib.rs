//! DuckDuckGo search adapter.
//!
//! Implements [`pipeline::SearchCapability`] on top of DuckDuckGo's HTML
//! results page, which needs no key. Organic results are extracted with
//! `scraper` and rendered as `title: snippet`, one per line.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Only this crate knows the wire format. The researcher
//! sees the joined text or a [`pipeline::CapabilityError`].

mod duckduckgo;

pub use duckduckgo::{
    DuckDuckGoClient, DuckDuckGoConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT, MAX_SNIPPETS,
};
