//! Batch payload rendering.
//!
//! The commit and file text here is exactly what the token estimator
//! measured, so a batch renders to roughly `estimated_tokens` plus the few
//! section headings added below.

use serde_json::Value;

use crate::domain::{Batch, Commit, PullRequest, ReportWindow};

const COMMIT_SEPARATOR: &str = "\n---\n";

/// Commit header followed by every file block, in diff order.
pub fn render_commit(commit: &Commit) -> String {
    let mut out = commit.header_text();
    for file in &commit.files {
        out.push_str(&file.block_text());
    }
    out
}

/// Full payload for one batch: optional repository context, the commits and
/// the PRs attached to the batch.
pub fn render_batch(
    repository: &str,
    batch: &Batch,
    window: &ReportWindow,
    repo_context: Option<&Value>,
) -> String {
    let first = window.day_at(batch.day_range.start);
    let last = window.day_at(batch.day_range.end);

    let mut out = format!("# {} batch {}\n\n", repository, batch.ordinal);
    if first == last {
        out.push_str(&format!("Days: {first}\n"));
    } else {
        out.push_str(&format!("Days: {first} to {last}\n"));
    }
    out.push_str(&format!("Estimated tokens: {}\n", batch.estimated_tokens));
    if batch.compressed {
        out.push_str("Note: diffs in this batch were cropped to fit; only the beginning of large changes is shown.\n");
    }

    if let Some(context) = repo_context {
        out.push_str("\n## Repository Context\n\n");
        out.push_str(&render_repo_context(context));
    }

    out.push_str("\n## Commits\n\n");
    let commits: Vec<String> = batch.commits.iter().map(render_commit).collect();
    out.push_str(&commits.join(COMMIT_SEPARATOR));

    if !batch.pull_requests.is_empty() {
        out.push_str("\n## Pull Requests\n\n");
        out.push_str(&render_pull_requests(&batch.pull_requests));
    }

    out
}

fn render_pull_requests(pull_requests: &[PullRequest]) -> String {
    pull_requests.iter().map(PullRequest::text).collect::<Vec<_>>().join("\n")
}

/// Summary and stack first, any other keys after in key order. Non-object
/// context is emitted as pretty JSON.
fn render_repo_context(context: &Value) -> String {
    let Value::Object(map) = context else {
        return format!("{}\n", serde_json::to_string_pretty(context).unwrap_or_default());
    };

    let mut out = String::new();
    if let Some(summary) = map.get("summary").and_then(Value::as_str) {
        out.push_str(&format!("Summary: {summary}\n"));
    }
    if let Some(stack) = map.get("stack").or_else(|| map.get("tech_stack")) {
        out.push_str(&format!("Stack: {}\n", list_or_scalar(stack)));
    }
    for (key, value) in map {
        if matches!(key.as_str(), "summary" | "stack" | "tech_stack") {
            continue;
        }
        out.push_str(&format!("{key}: {}\n", list_or_scalar(value)));
    }
    out
}

fn list_or_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(list_or_scalar).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
