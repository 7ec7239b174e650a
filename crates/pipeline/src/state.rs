//! The shared record threaded through every step of a run, and the partial
//! updates steps hand back.
//!
//! A step never mutates [`ArticleState`] directly. It reads a borrowed state
//! and returns a [`StatePatch`] naming only the fields it changed; the
//! executor merges the patch before the next step starts. Fields a patch does
//! not mention are carried over untouched, and `topic` cannot appear in a
//! patch at all.

use serde::{Deserialize, Serialize};

use crate::Topic;

/// Shared state for a single article run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleState {
    /// Subject of the article. Set by the caller, never changed.
    pub topic: Topic,

    /// Raw findings, one entry per research pass. Replaced, not appended.
    pub research_data: Vec<String>,

    /// Current draft. Empty only before the writer first runs.
    pub blog_post: String,

    /// Latest critique, approval token, or publish result.
    pub review_feedback: String,

    /// Number of completed draft/redraft cycles.
    pub revision_count: u32,
}

impl ArticleState {
    /// Creates a fresh state with every field except `topic` at its zero value.
    pub fn new(topic: Topic) -> Self {
        Self {
            topic,
            research_data: Vec::new(),
            blog_post: String::new(),
            review_feedback: String::new(),
            revision_count: 0,
        }
    }

    /// Merges a partial update into this state.
    ///
    /// Only the fields present in `patch` are overwritten.
    pub fn merge(&mut self, patch: StatePatch) {
        if let Some(research_data) = patch.research_data {
            self.research_data = research_data;
        }
        if let Some(blog_post) = patch.blog_post {
            self.blog_post = blog_post;
        }
        if let Some(review_feedback) = patch.review_feedback {
            self.review_feedback = review_feedback;
        }
        if let Some(revision_count) = patch.revision_count {
            self.revision_count = revision_count;
        }
    }

    /// Consumes the state, producing the caller-facing response.
    pub fn into_response(self) -> ArticleResponse {
        ArticleResponse {
            final_article: self.blog_post,
            revision_count: self.revision_count,
            review_feedback: self.review_feedback,
        }
    }
}

/// A partial update returned by a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub research_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_post: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_count: Option<u32>,
}

impl StatePatch {
    pub fn research_data(research_data: Vec<String>) -> Self {
        Self {
            research_data: Some(research_data),
            ..Self::default()
        }
    }

    pub fn draft(blog_post: impl Into<String>, revision_count: u32) -> Self {
        Self {
            blog_post: Some(blog_post.into()),
            revision_count: Some(revision_count),
            ..Self::default()
        }
    }

    pub fn review_feedback(review_feedback: impl Into<String>) -> Self {
        Self {
            review_feedback: Some(review_feedback.into()),
            ..Self::default()
        }
    }

    /// Names of the fields this patch touches, for logging.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.research_data.is_some() {
            fields.push("research_data");
        }
        if self.blog_post.is_some() {
            fields.push("blog_post");
        }
        if self.review_feedback.is_some() {
            fields.push("review_feedback");
        }
        if self.revision_count.is_some() {
            fields.push("revision_count");
        }
        fields
    }
}

// ---------------------------------------------------------------------------
// Run-level request/response contract
// ---------------------------------------------------------------------------

/// Input to a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRequest {
    pub topic: Topic,
}

/// Output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub final_article: String,
    pub revision_count: u32,
    pub review_feedback: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> Topic {
        Topic::new("Test Topic").unwrap()
    }

    #[test]
    fn fresh_state_has_zero_values() {
        let state = ArticleState::new(topic());
        assert!(state.research_data.is_empty());
        assert!(state.blog_post.is_empty());
        assert!(state.review_feedback.is_empty());
        assert_eq!(state.revision_count, 0);
    }

    #[test]
    fn merge_leaves_unmentioned_fields_alone() {
        let mut state = ArticleState::new(topic());
        state.merge(StatePatch::research_data(vec!["fact A".into()]));
        state.merge(StatePatch::draft("Draft 1", 1));

        assert_eq!(state.topic.as_str(), "Test Topic");
        assert_eq!(state.research_data, vec!["fact A".to_string()]);
        assert_eq!(state.blog_post, "Draft 1");
        assert_eq!(state.revision_count, 1);
        assert!(state.review_feedback.is_empty());
    }

    #[test]
    fn merge_replaces_research_instead_of_appending() {
        let mut state = ArticleState::new(topic());
        state.merge(StatePatch::research_data(vec!["first".into()]));
        state.merge(StatePatch::research_data(vec!["second".into()]));
        assert_eq!(state.research_data, vec!["second".to_string()]);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let mut state = ArticleState::new(topic());
        state.merge(StatePatch::draft("Draft", 2));
        let before = state.clone();
        state.merge(StatePatch::default());
        assert_eq!(state, before);
    }

    #[test]
    fn touched_fields_lists_only_present_fields() {
        assert_eq!(
            StatePatch::draft("x", 1).touched_fields(),
            vec!["blog_post", "revision_count"]
        );
        assert!(StatePatch::default().touched_fields().is_empty());
    }

    #[test]
    fn response_uses_final_article_key() {
        let mut state = ArticleState::new(topic());
        state.merge(StatePatch::draft("Body", 1));
        state.merge(StatePatch::review_feedback("APPROVE"));

        let json = serde_json::to_value(state.into_response()).unwrap();
        assert_eq!(json["final_article"], "Body");
        assert_eq!(json["revision_count"], 1);
        assert_eq!(json["review_feedback"], "APPROVE");
    }
}
