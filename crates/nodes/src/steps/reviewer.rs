use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    ArticleState, GenerationCapability, GenerationRequest, PipelineError, StatePatch, StepName,
    Temperature, APPROVAL_TOKEN,
};
use tracing::info;

use super::AgentStep;
use crate::prompts;

/// Grades the current draft. The reply is stored verbatim; the router
/// interprets it.
pub struct Reviewer {
    generator: Arc<dyn GenerationCapability>,
    temperature: Temperature,
}

impl Reviewer {
    pub fn new(generator: Arc<dyn GenerationCapability>) -> Self {
        Self {
            generator,
            temperature: Temperature::DETERMINISTIC,
        }
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl AgentStep for Reviewer {
    fn name(&self) -> StepName {
        StepName::Reviewer
    }

    async fn run(&self, state: &ArticleState) -> Result<StatePatch, PipelineError> {
        let request = GenerationRequest::new(prompts::render_review(&state.blog_post), self.temperature);
        let feedback = self
            .generator
            .generate(request)
            .await
            .map_err(|source| PipelineError::Generation {
                step: StepName::Reviewer,
                source,
            })?;

        info!(
            revision = state.revision_count,
            approved = feedback.contains(APPROVAL_TOKEN),
            "Review complete"
        );
        Ok(StatePatch::review_feedback(feedback))
    }
}
