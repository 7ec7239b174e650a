//! Shared value types for the article pipeline.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (temperatures lie in `[0.0, 1.0]`, the revision
//! budget is never zero) and participate in routing and generation decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generation parameters
// ---------------------------------------------------------------------------

/// Sampling randomness passed to the generation capability, in `[0.0, 1.0]`.
///
/// `0.0` asks for deterministic output (used by the reviewer); the writer uses a
/// non-zero value so drafts do not read as stilted.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

impl Temperature {
    /// Fully deterministic sampling.
    pub const DETERMINISTIC: Temperature = Temperature(0.0);

    /// Default creative sampling for drafting.
    pub const CREATIVE: Temperature = Temperature(0.7);

    /// Creates a [`Temperature`], returning `None` if `value` is outside
    /// `[0.0, 1.0]` or not finite.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the value as an `f64` in `[0.0, 1.0]`.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns `true` for zero randomness.
    pub fn is_deterministic(self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for Temperature {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("temperature {value} is outside [0.0, 1.0]"))
    }
}

impl From<Temperature> for f64 {
    fn from(value: Temperature) -> Self {
        value.0
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Revision budget
// ---------------------------------------------------------------------------

/// Maximum number of writer passes per run.
///
/// Once the revision count reaches this value the router terminates the run
/// whatever the reviewer said. The budget is at least one, so the revision
/// loop always terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RevisionBudget(u32);

impl RevisionBudget {
    /// Creates a [`RevisionBudget`], returning `None` for zero.
    #[must_use]
    pub fn new(max_revisions: u32) -> Option<Self> {
        if max_revisions == 0 {
            None
        } else {
            Some(Self(max_revisions))
        }
    }

    /// Returns the cap as an integer.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns `true` if `revision_count` has used up the budget.
    pub fn is_exhausted_by(self, revision_count: u32) -> bool {
        revision_count >= self.0
    }
}

impl Default for RevisionBudget {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u32> for RevisionBudget {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "revision budget must be at least 1".to_string())
    }
}

impl From<RevisionBudget> for u32 {
    fn from(value: RevisionBudget) -> Self {
        value.0
    }
}

impl std::fmt::Display for RevisionBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Milliseconds elapsed between `self` and a later timestamp.
    pub fn millis_until(self, later: Timestamp) -> i64 {
        (later.0 - self.0).num_milliseconds()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
