//! Ollama infrastructure adapter.
//!
//! Implements [`pipeline::GenerationCapability`] against a local or remote
//! Ollama daemon, plus the model management calls the CLI exposes
//! (`blogsmith models`, `blogsmith pull`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting and response
//! parsing live here. The [`pipeline`] crate sees only
//! [`pipeline::GenerationCapability`].
//!
//! Every failure is reported as a [`pipeline::CapabilityError`] tagged with
//! [`pipeline::Capability::Generation`]. No call is retried.

mod client;
mod models;

pub use client::{OllamaClient, OllamaConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
pub use models::{ModelSummary, PullProgress};
