//! Blogsmith agent steps and graph executor.
//!
//! This crate provides the four agent steps (Researcher, Writer, Reviewer,
//! Publisher), the prompt templates they send to the generation capability,
//! and the [`PipelineExecutor`] that drives a [`pipeline::WorkflowGraph`] to
//! completion.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Steps sequence calls between the domain rules in
//! the [`pipeline`] crate and the capability ports (search, generation,
//! publish). They contain no transport code of their own.
//!
//! ## Failure policy
//!
//! | Step | Capability failure becomes |
//! |------|----------------------------|
//! | Researcher | `["No data found due to error."]` as research data |
//! | Writer, Reviewer | `PipelineError::Generation`, aborting the run |
//! | Publisher | `"Failed to publish."` as review feedback |

pub mod executor;
pub mod prompts;
pub mod steps;

pub use executor::{PipelineExecutor, PipelineSettings, RunReport};
pub use steps::{
    default_tags, draft_submission, published_feedback, research_query, AgentStep, Publisher,
    ResearchOutcome, Researcher, Reviewer, Writer, WriterMode, PUBLISH_FAILED, RESEARCH_FALLBACK,
};
