//! Core domain for Blogsmith.
//!
//! This crate holds the shared-state contract, the routing decision, the
//! workflow graph, and the capability ports every other crate builds on.
//! Infrastructure crates implement the ports defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`state`] | `ArticleState`, `StatePatch`, run request/response |
//! | [`routing`] | `Destination`, `route`, `Router` |
//! | [`graph`] | `StepName`, `Edge`, `WorkflowGraph` |
//! | [`ports`] | Search, generation and publish capability traits |
//! | [`identifiers`] | Newtype identifiers (`RunId`, `Topic`, ...) |
//! | [`types`] | Value types (`Temperature`, `RevisionBudget`, `Timestamp`) |
//! | [`errors`] | `CapabilityError`, `PipelineError` |

pub mod errors;
pub mod graph;
pub mod identifiers;
pub mod ports;
pub mod routing;
pub mod state;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{Capability, CapabilityError, PipelineError};
pub use graph::{Edge, GraphBuilder, Next, StepName, WorkflowGraph};
pub use identifiers::{ModelName, RunId, Tag, Topic};
pub use ports::{
    GenerationCapability, GenerationRequest, PublishCapability, PublishRequest, PublishedArticle,
    SearchCapability,
};
pub use routing::{route, Destination, Router, APPROVAL_TOKEN};
pub use state::{ArticleRequest, ArticleResponse, ArticleState, StatePatch};
pub use types::{RevisionBudget, Temperature, Timestamp};
