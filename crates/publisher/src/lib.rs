//! dev.to publishing adapter.
//!
//! Implements [`pipeline::PublishCapability`] against the Forem articles API
//! that backs dev.to.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The API key is held here and sent only as the
//! `api-key` header. It is never logged and never read from a config file;
//! callers pass it in from the environment.

mod devto;

pub use devto::{
    DevToClient, DevToConfig, API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_SERIES, DEFAULT_TIMEOUT,
};
