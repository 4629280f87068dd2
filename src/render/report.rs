//! Plan report JSON generation.

use crate::domain::{BatchPlan, PLAN_SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

/// Write one repository's plan as JSON, with the effective config and the
/// payload files that were written next to it.
pub fn write_plan_report(
    report_path: &Path,
    plan: &BatchPlan,
    output_files: &[String],
    config: &Value,
    include_timestamp: bool,
) -> Result<()> {
    let mut sorted_output_files = output_files.to_vec();
    sorted_output_files.sort();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(PLAN_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert("config".to_string(), config.clone());
    report.insert("output_files".to_string(), serde_json::to_value(sorted_output_files)?);
    report.insert("plan".to_string(), plan_summary(plan));

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}

/// Plan without the diff bodies: batches list their commit shas and PR
/// numbers only.
pub fn plan_summary(plan: &BatchPlan) -> Value {
    let batches = plan
        .batches
        .iter()
        .map(|b| {
            json!({
                "ordinal": b.ordinal,
                "days": b.day_range,
                "commits": b.commits.iter().map(|c| c.sha.as_str()).collect::<Vec<_>>(),
                "pull_requests": b.pull_requests.iter().map(|p| p.number).collect::<Vec<_>>(),
                "estimated_tokens": b.estimated_tokens,
                "compressed": b.compressed,
                "fingerprint": b.fingerprint,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "repository": plan.repository,
        "tier": plan.tier,
        "total_tokens": plan.total_tokens,
        "window": plan.window,
        "budget": plan.budget,
        "stats": plan.stats,
        "batches": batches,
    })
}
