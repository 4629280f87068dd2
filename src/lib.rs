//! diff-batcher: split a week of commit diffs into token-budgeted batches
//!
//! Commits are filtered down to code, safety-cropped, bucketed by UTC day and
//! grouped into batches that each fit one LLM generation call.

pub mod batch;
pub mod cli;
pub mod config;
pub mod crop;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod render;
pub mod utils;

pub use batch::{plan_repositories, BatchPlanner, EngineConfig};
pub use domain::{BatchPlan, Tier, TokenBudget};
pub use error::EngineError;
