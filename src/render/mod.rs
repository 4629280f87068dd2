//! Output rendering (batch payloads, plan reports)

pub mod context;
pub mod report;

pub use context::{render_batch, render_commit};
pub use report::{plan_summary, write_plan_report};
