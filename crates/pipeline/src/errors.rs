//! Error types for the article pipeline.
//!
//! [`CapabilityError`] is what an adapter returns when an external call
//! (search, generation, publish) fails. Whether that failure is absorbed or
//! ends the run is decided by the step that made the call:
//!
//! - search failures are absorbed by the researcher (sentinel data);
//! - publish failures are absorbed by the publisher (sentinel feedback);
//! - generation failures end the run as [`PipelineError::Generation`].
//!
//! [`PipelineError`] covers every condition that halts a run or prevents one
//! from starting.

use thiserror::Error;

use crate::graph::StepName;

// ---------------------------------------------------------------------------
// Capability errors
// ---------------------------------------------------------------------------

/// The external capability an adapter fronts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Search,
    Generation,
    Publish,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Search => "search",
            Capability::Generation => "generation",
            Capability::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Failure of a single external capability call.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The service could not be reached (connection refused, DNS, timeout).
    #[error("{capability} service unavailable: {message}")]
    Unavailable {
        capability: Capability,
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("{capability} service rejected the request with status {status}: {body}")]
    Rejected {
        capability: Capability,
        status: u16,
        body: String,
    },

    /// The service answered, but the payload could not be interpreted.
    #[error("{capability} service returned an invalid response: {message}")]
    InvalidResponse {
        capability: Capability,
        message: String,
    },

    /// The service answered successfully with nothing usable.
    #[error("{capability} service returned no results")]
    EmptyResult { capability: Capability },

    /// The adapter is missing configuration it needs (e.g. an API key).
    #[error("{capability} adapter is not configured: {message}")]
    NotConfigured {
        capability: Capability,
        message: String,
    },
}

impl CapabilityError {
    /// Which capability produced this error.
    pub fn capability(&self) -> Capability {
        match self {
            CapabilityError::Unavailable { capability, .. }
            | CapabilityError::Rejected { capability, .. }
            | CapabilityError::InvalidResponse { capability, .. }
            | CapabilityError::EmptyResult { capability }
            | CapabilityError::NotConfigured { capability, .. } => *capability,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level errors
// ---------------------------------------------------------------------------

/// Errors that halt a run or stop one from being assembled.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A generation call failed inside the writer or reviewer.
    ///
    /// The run is aborted; there is no automatic retry of the call.
    #[error("{step} step failed: {source}")]
    Generation {
        step: StepName,
        #[source]
        source: CapabilityError,
    },

    /// The workflow graph is malformed (missing edge, duplicate edge, no branch).
    #[error("Invalid workflow graph: {reason}")]
    InvalidGraph { reason: String },

    /// The runtime configuration is invalid.
    ///
    /// Produced at load time; a run never starts with an invalid config.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_error_reports_its_capability() {
        let err = CapabilityError::Rejected {
            capability: Capability::Publish,
            status: 401,
            body: "unauthorized".into(),
        };
        assert_eq!(err.capability(), Capability::Publish);
        assert_eq!(
            err.to_string(),
            "publish service rejected the request with status 401: unauthorized"
        );
    }

    #[test]
    fn generation_error_names_the_step() {
        let err = PipelineError::Generation {
            step: StepName::Reviewer,
            source: CapabilityError::Unavailable {
                capability: Capability::Generation,
                message: "connection refused".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Reviewer step failed: generation service unavailable: connection refused"
        );
    }
}
