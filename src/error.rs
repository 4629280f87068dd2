//! Batching engine error types

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the batching engine.
///
/// All of these are input contract violations detected before any batch is
/// built; the batching algorithm itself has no failure modes.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Budget constants are inconsistent
    #[error("Invalid token budget: {reason}")]
    InvalidBudget { reason: String },

    /// Window end is not after its start
    #[error("Invalid report window: end {end} is not after start {start}")]
    InvalidWindow { start: DateTime<Utc>, end: DateTime<Utc> },

    /// Window is longer than the configured number of days
    #[error("Report window from {start} to {end} is longer than {max_days} days")]
    WindowTooLong { start: DateTime<Utc>, end: DateTime<Utc>, max_days: u32 },

    /// Commit timestamp falls outside `[start, end)`
    #[error("Commit {sha} at {timestamp} lies outside the report window [{start}, {end})")]
    OutOfWindow {
        sha: String,
        timestamp: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The same sha was handed over twice
    #[error("Commit {sha} appears more than once in the input")]
    DuplicateCommit { sha: String },

    /// An exclude glob did not compile
    #[error("Invalid exclude glob '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
