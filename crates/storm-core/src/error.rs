//! Typed error surface for the storm generator.
//!
//! Configuration problems fail at setup, never during a year loop; the only
//! runtime condition that is *not* an error is storm-budget exhaustion, which
//! is surfaced as a per-year diagnostic flag instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StormError>;

#[derive(Debug, Error)]
pub enum StormError {
    /// A distribution failed validation (non-positive scale, inverted
    /// truncation bounds, ...).
    #[error("invalid distribution `{name}`: {reason}")]
    InvalidDistribution { name: &'static str, reason: String },

    /// Rejection sampling could not land inside the truncation interval.
    /// Indicates a truncation interval far out in the tail of the family.
    #[error("sampling `{name}` exhausted {attempts} rejection attempts without landing in [{lo}, {hi}]")]
    TruncationExhausted {
        name: &'static str,
        attempts: u32,
        lo: f64,
        hi: f64,
    },

    /// Categorical weight vector does not describe a probability mass.
    #[error("categorical weights must be non-negative and sum to ~1 (sum = {sum:.6})")]
    InvalidWeights { sum: f64 },

    /// Intensity-duration curve id outside 1..=11.
    #[error("unknown intensity-duration curve id {0} (valid ids are 1..=11)")]
    UnknownCurve(usize),

    /// A gauge appears in none of the three orographic membership groups.
    #[error("gauge {0} belongs to no orographic band grouping")]
    UngroupedGauge(u32),

    /// The target-location set came out empty; nothing to rain on.
    #[error("target location set is empty")]
    EmptyTargetSet,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A reference table failed to load or had the wrong shape.
    #[error("reference table {path}: {reason}")]
    BadTable { path: PathBuf, reason: String },

    #[error("reading {path}: {source}")]
    TableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
