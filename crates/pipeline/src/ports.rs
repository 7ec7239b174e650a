//! Capability ports consumed by the agent steps.
//!
//! Infrastructure crates implement these traits; the pipeline never sees an
//! HTTP client. Every call is awaited to completion before the run moves on.
//! Timeouts are the adapter's responsibility.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{CapabilityError, Tag, Temperature};

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Web lookup used by the researcher.
#[async_trait]
pub trait SearchCapability: Send + Sync {
    /// Runs one query and returns the raw result text.
    async fn search(&self, query: &str) -> Result<String, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// A single prompt-to-text generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: Temperature,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, temperature: Temperature) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Text generation used by the writer and reviewer.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generates the full response for `request`.
    async fn generate(&self, request: GenerationRequest) -> Result<String, CapabilityError>;
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// An article submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub body_markdown: String,
    pub tags: BTreeSet<Tag>,
    /// `true` submits a non-public draft.
    pub draft: bool,
}

/// Where a submitted article ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArticle {
    pub url: String,
}

/// Article publishing used by the publisher.
#[async_trait]
pub trait PublishCapability: Send + Sync {
    async fn publish(&self, request: PublishRequest) -> Result<PublishedArticle, CapabilityError>;
}
