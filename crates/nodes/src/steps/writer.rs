use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    ArticleState, GenerationCapability, GenerationRequest, PipelineError, StatePatch, StepName,
    Temperature,
};
use tracing::info;

use super::AgentStep;
use crate::prompts;

/// Whether the writer starts from research or reworks its last draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    FirstDraft,
    Revision,
}

impl WriterMode {
    pub fn for_state(state: &ArticleState) -> Self {
        if state.revision_count > 0 {
            WriterMode::Revision
        } else {
            WriterMode::FirstDraft
        }
    }
}

/// Drafts the article, or revises it against the latest review.
pub struct Writer {
    generator: Arc<dyn GenerationCapability>,
    temperature: Temperature,
}

impl Writer {
    pub fn new(generator: Arc<dyn GenerationCapability>) -> Self {
        Self {
            generator,
            temperature: Temperature::CREATIVE,
        }
    }

    /// Overrides the sampling temperature (default 0.7).
    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    fn prompt(state: &ArticleState, mode: WriterMode) -> String {
        match mode {
            WriterMode::FirstDraft => {
                prompts::render_first_draft(state.topic.as_str(), &state.research_data)
            }
            WriterMode::Revision => {
                prompts::render_revision(&state.blog_post, &state.review_feedback)
            }
        }
    }
}

#[async_trait]
impl AgentStep for Writer {
    fn name(&self) -> StepName {
        StepName::Writer
    }

    async fn run(&self, state: &ArticleState) -> Result<StatePatch, PipelineError> {
        let mode = WriterMode::for_state(state);
        let revision_count = state.revision_count + 1;
        info!(?mode, revision = revision_count, "Writing draft");

        let request = GenerationRequest::new(Self::prompt(state, mode), self.temperature);
        let blog_post = self
            .generator
            .generate(request)
            .await
            .map_err(|source| PipelineError::Generation {
                step: StepName::Writer,
                source,
            })?;

        Ok(StatePatch::draft(blog_post, revision_count))
    }
}
