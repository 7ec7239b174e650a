use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    ArticleState, CapabilityError, PipelineError, SearchCapability, StatePatch, StepName, Topic,
};
use tracing::{debug, info, warn};

use super::AgentStep;

/// Research data substituted when the search capability fails.
pub const RESEARCH_FALLBACK: &str = "No data found due to error.";

/// The query sent to the search capability for `topic`.
pub fn research_query(topic: &Topic) -> String {
    format!("latest news and facts about {topic}")
}

/// Result of one research pass, resolved locally.
#[derive(Debug)]
pub enum ResearchOutcome {
    Found(String),
    Unavailable(CapabilityError),
}

impl ResearchOutcome {
    /// The search failure, if the research pass fell back.
    pub fn error(&self) -> Option<&CapabilityError> {
        match self {
            ResearchOutcome::Found(_) => None,
            ResearchOutcome::Unavailable(error) => Some(error),
        }
    }

    /// Always a single entry: the raw result, or the fallback sentinel.
    pub fn into_research_data(self) -> Vec<String> {
        match self {
            ResearchOutcome::Found(result) => vec![result],
            ResearchOutcome::Unavailable(error) => {
                warn!(
                    capability = %error.capability(),
                    error = %error,
                    "Research failed; continuing with fallback data"
                );
                vec![RESEARCH_FALLBACK.to_string()]
            }
        }
    }
}

/// Looks the topic up once. Never fails the run.
pub struct Researcher {
    search: Arc<dyn SearchCapability>,
}

impl Researcher {
    pub fn new(search: Arc<dyn SearchCapability>) -> Self {
        Self { search }
    }

    pub async fn research(&self, topic: &Topic) -> ResearchOutcome {
        let query = research_query(topic);
        match self.search.search(&query).await {
            Ok(result) => {
                info!(query = %query, bytes = result.len(), "Research complete");
                ResearchOutcome::Found(result)
            }
            Err(error) => {
                debug!(query = %query, "Search returned an error");
                ResearchOutcome::Unavailable(error)
            }
        }
    }
}

#[async_trait]
impl AgentStep for Researcher {
    fn name(&self) -> StepName {
        StepName::Researcher
    }

    async fn run(&self, state: &ArticleState) -> Result<StatePatch, PipelineError> {
        let outcome = self.research(&state.topic).await;
        Ok(StatePatch::research_data(outcome.into_research_data()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::Capability;
    use std::sync::Mutex;

    struct RecordingSearch {
        result: Result<String, ()>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchCapability for RecordingSearch {
        async fn search(&self, query: &str) -> Result<String, CapabilityError> {
            self.queries.lock().unwrap().push(query.to_string());
            self.result.clone().map_err(|_| CapabilityError::Unavailable {
                capability: Capability::Search,
                message: "network down".into(),
            })
        }
    }

    fn state() -> ArticleState {
        ArticleState::new(Topic::new("Test Topic").unwrap())
    }

    #[tokio::test]
    async fn wraps_result_as_single_entry() {
        let search = Arc::new(RecordingSearch {
            result: Ok("fact A".into()),
            queries: Mutex::new(Vec::new()),
        });
        let patch = Researcher::new(search.clone()).run(&state()).await.unwrap();

        assert_eq!(patch.research_data, Some(vec!["fact A".to_string()]));
        assert_eq!(patch.touched_fields(), vec!["research_data"]);
        assert_eq!(
            *search.queries.lock().unwrap(),
            vec!["latest news and facts about Test Topic".to_string()]
        );
    }

    #[tokio::test]
    async fn failing_search_yields_fallback_sentinel() {
        let search = Arc::new(RecordingSearch {
            result: Err(()),
            queries: Mutex::new(Vec::new()),
        });
        let patch = Researcher::new(search).run(&state()).await.unwrap();

        assert_eq!(
            patch.research_data,
            Some(vec!["No data found due to error.".to_string()])
        );
    }

    #[tokio::test]
    async fn failed_research_keeps_the_search_error() {
        let search = Arc::new(RecordingSearch {
            result: Err(()),
            queries: Mutex::new(Vec::new()),
        });
        let outcome = Researcher::new(search).research(&Topic::new("Rust").unwrap()).await;

        let error = outcome.error().expect("search failure should be kept");
        assert_eq!(error.capability(), Capability::Search);
        assert!(error.to_string().contains("network down"));
        assert_eq!(outcome.into_research_data(), vec![RESEARCH_FALLBACK.to_string()]);
    }

    #[test]
    fn found_outcome_has_no_error() {
        let outcome = ResearchOutcome::Found("fact".into());
        assert!(outcome.error().is_none());
        assert_eq!(outcome.into_research_data(), vec!["fact".to_string()]);
    }
}
