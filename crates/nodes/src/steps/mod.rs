//! The four agent steps.
//!
//! Each step reads a borrowed [`ArticleState`] and returns a [`StatePatch`]
//! naming only the fields it changed. Steps hold their capabilities behind
//! `Arc<dyn ...>` so one adapter instance can serve several steps (the writer
//! and reviewer share a generator).

mod publisher;
mod researcher;
mod reviewer;
mod writer;

use async_trait::async_trait;
use pipeline::{ArticleState, PipelineError, StatePatch, StepName};

pub use publisher::{
    default_tags, draft_submission, published_feedback, Publisher, PUBLISH_FAILED,
};
pub use researcher::{research_query, ResearchOutcome, Researcher, RESEARCH_FALLBACK};
pub use reviewer::Reviewer;
pub use writer::{Writer, WriterMode};

/// A unit of work the executor can invoke.
#[async_trait]
pub trait AgentStep: Send + Sync {
    /// Which graph node this step implements.
    fn name(&self) -> StepName;

    /// Runs the step against the current state.
    ///
    /// # Errors
    ///
    /// Only generation failures surface here; research and publish failures
    /// are turned into sentinel values inside their steps.
    async fn run(&self, state: &ArticleState) -> Result<StatePatch, PipelineError>;
}
