use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use pipeline::{
    ArticleState, PipelineError, PublishCapability, PublishRequest, StatePatch, StepName, Tag,
};
use tracing::{info, warn};

use super::AgentStep;

/// Feedback written when the publish capability fails.
pub const PUBLISH_FAILED: &str = "Failed to publish.";

/// Feedback written after a successful submission.
pub fn published_feedback(url: &str) -> String {
    format!("PUBLISHED: {url}")
}

/// Tags attached to every submission unless configured otherwise.
pub fn default_tags() -> BTreeSet<Tag> {
    ["ai", "agents", "writing"]
        .into_iter()
        .filter_map(Tag::new)
        .collect()
}

/// A draft (non-public) submission of `body` under `title`.
pub fn draft_submission(title: &str, body: &str, tags: &BTreeSet<Tag>) -> PublishRequest {
    PublishRequest {
        title: title.to_string(),
        body_markdown: body.to_string(),
        tags: tags.clone(),
        draft: true,
    }
}

/// Submits the approved article as a draft. Never fails the run.
pub struct Publisher {
    publisher: Arc<dyn PublishCapability>,
    tags: BTreeSet<Tag>,
}

impl Publisher {
    pub fn new(publisher: Arc<dyn PublishCapability>) -> Self {
        Self {
            publisher,
            tags: default_tags(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeSet<Tag>) -> Self {
        self.tags = tags;
        self
    }
}

#[async_trait]
impl AgentStep for Publisher {
    fn name(&self) -> StepName {
        StepName::Publisher
    }

    async fn run(&self, state: &ArticleState) -> Result<StatePatch, PipelineError> {
        let request = draft_submission(state.topic.as_str(), &state.blog_post, &self.tags);
        let feedback = match self.publisher.publish(request).await {
            Ok(article) => {
                info!(url = %article.url, "Article submitted as draft");
                published_feedback(&article.url)
            }
            Err(error) => {
                warn!(error = %error, "Publishing failed; keeping the article unpublished");
                PUBLISH_FAILED.to_string()
            }
        };
        Ok(StatePatch::review_feedback(feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{Capability, CapabilityError, PublishedArticle, Topic};
    use std::sync::Mutex;

    struct StubPublisher {
        url: Option<String>,
        seen: Mutex<Vec<PublishRequest>>,
    }

    #[async_trait]
    impl PublishCapability for StubPublisher {
        async fn publish(
            &self,
            request: PublishRequest,
        ) -> Result<PublishedArticle, CapabilityError> {
            self.seen.lock().unwrap().push(request);
            match &self.url {
                Some(url) => Ok(PublishedArticle { url: url.clone() }),
                None => Err(CapabilityError::Rejected {
                    capability: Capability::Publish,
                    status: 422,
                    body: "Title can't be blank".into(),
                }),
            }
        }
    }

    fn state() -> ArticleState {
        let mut state = ArticleState::new(Topic::new("Test Topic").unwrap());
        state.blog_post = "Final body".into();
        state.review_feedback = "APPROVE".into();
        state.revision_count = 1;
        state
    }

    #[tokio::test]
    async fn success_records_the_url() {
        let stub = Arc::new(StubPublisher {
            url: Some("https://dev.to/me/test-topic".into()),
            seen: Mutex::new(Vec::new()),
        });
        let patch = Publisher::new(stub.clone()).run(&state()).await.unwrap();

        assert_eq!(
            patch,
            StatePatch::review_feedback("PUBLISHED: https://dev.to/me/test-topic")
        );
        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen[0].title, "Test Topic");
        assert_eq!(seen[0].body_markdown, "Final body");
        assert!(seen[0].draft);
        assert_eq!(seen[0].tags, default_tags());
    }

    #[tokio::test]
    async fn failure_records_the_sentinel() {
        let stub = Arc::new(StubPublisher {
            url: None,
            seen: Mutex::new(Vec::new()),
        });
        let patch = Publisher::new(stub).run(&state()).await.unwrap();
        assert_eq!(patch, StatePatch::review_feedback("Failed to publish."));
    }

    #[test]
    fn default_tag_set() {
        let tags: Vec<String> = default_tags().into_iter().map(String::from).collect();
        assert_eq!(tags, vec!["agents", "ai", "writing"]);
    }
}
