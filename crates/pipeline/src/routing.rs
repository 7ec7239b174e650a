//! The decision that closes the review loop.
//!
//! After every review the router picks one of three destinations. Checks run
//! in priority order and the first match wins:
//!
//! 1. revision budget used up → [`Destination::Terminate`]
//! 2. feedback contains [`APPROVAL_TOKEN`] → [`Destination::Publisher`]
//! 3. otherwise → [`Destination::Writer`]
//!
//! The budget check comes first so a run can never loop past the cap, even
//! on an approved draft.

use serde::{Deserialize, Serialize};

use crate::{ArticleState, RevisionBudget};

/// Token the reviewer replies with when a draft meets every criterion.
pub const APPROVAL_TOKEN: &str = "APPROVE";

/// Where control goes after a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Writer,
    Publisher,
    Terminate,
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Destination::Writer => "Writer",
            Destination::Publisher => "Publisher",
            Destination::Terminate => "Terminate",
        };
        f.write_str(name)
    }
}

/// Picks the next destination from the latest feedback and revision count.
///
/// `APPROVE` is matched as a substring anywhere in the feedback, not as an
/// exact reply.
pub fn route(review_feedback: &str, revision_count: u32, budget: RevisionBudget) -> Destination {
    if budget.is_exhausted_by(revision_count) {
        Destination::Terminate
    } else if review_feedback.contains(APPROVAL_TOKEN) {
        Destination::Publisher
    } else {
        Destination::Writer
    }
}

/// The router bound to a revision budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Router {
    budget: RevisionBudget,
}

impl Router {
    pub fn new(budget: RevisionBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> RevisionBudget {
        self.budget
    }

    /// Routes on the current state.
    pub fn decide(&self, state: &ArticleState) -> Destination {
        route(&state.review_feedback, state.revision_count, self.budget)
    }
}
