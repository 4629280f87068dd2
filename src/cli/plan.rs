//! Plan command implementation

use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use super::utils::{resolve_config, BudgetArgs};
use crate::batch::{plan_repositories, BatchPlanner, RepositoryPlan};
use crate::domain::{ActivityFile, BatchPlan};
use crate::fetch::load_activity;
use crate::render::plan_summary;
use crate::utils::format_with_commas;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Activity JSON file (window plus per-repository commits and PRs)
    #[arg(value_name = "ACTIVITY")]
    pub activity: PathBuf,

    /// Only plan this repository
    #[arg(short, long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub budget: BudgetArgs,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let config = resolve_config(args.budget.config.as_deref(), args.budget.overrides())?;
    let planner = BatchPlanner::new(config.engine())?;
    let activity = select_repository(load_activity(&args.activity)?, args.repo.as_deref())?;

    let plans = plan_repositories(&planner, &activity);

    match args.format {
        OutputFormat::Text => {
            for plan in &plans {
                match &plan.result {
                    Ok(p) => print_plan(p),
                    Err(e) => println!("Repository: {}\n  Error: {}\n", plan.repository, e),
                }
            }
        }
        OutputFormat::Json => {
            let values: Vec<serde_json::Value> = plans
                .iter()
                .map(|plan| match &plan.result {
                    Ok(p) => plan_summary(p),
                    Err(e) => serde_json::json!({ "repository": plan.repository, "error": e.to_string() }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
    }

    ensure_all_planned(&plans)
}

/// Narrow the activity to one repository when `--repo` is given.
pub(crate) fn select_repository(mut activity: ActivityFile, repo: Option<&str>) -> Result<ActivityFile> {
    if let Some(name) = repo {
        let Some(selected) = activity.repositories.remove(name) else {
            anyhow::bail!("Repository '{}' not found in activity file", name);
        };
        activity.repositories.clear();
        activity.repositories.insert(name.to_string(), selected);
    }
    Ok(activity)
}

/// Fail the command when any repository failed, after everything was reported.
pub(crate) fn ensure_all_planned(plans: &[RepositoryPlan]) -> Result<()> {
    let failed: Vec<&RepositoryPlan> = plans.iter().filter(|p| p.result.is_err()).collect();
    for plan in &failed {
        if let Err(e) = &plan.result {
            tracing::error!(repository = %plan.repository, "planning failed: {}", e);
        }
    }
    if !failed.is_empty() {
        anyhow::bail!("{} of {} repositories failed to plan", failed.len(), plans.len());
    }
    Ok(())
}

fn print_plan(plan: &BatchPlan) {
    let stats = &plan.stats;
    println!("Repository: {}", plan.repository);
    println!("  Window: {} to {}", plan.window.start.to_rfc3339(), plan.window.end.to_rfc3339());
    println!("  Tier: {}", plan.tier);
    println!("  Total tokens: {}", format_with_commas(plan.total_tokens));
    println!("  Commits: {}  Pull requests: {}", stats.commits, stats.pull_requests);
    println!(
        "  Files: {} kept, {} non-code dropped, {} safety-cropped, {} budget-cropped",
        stats.files_kept, stats.files_dropped_non_code, stats.files_safety_cropped, stats.files_budget_cropped
    );
    println!("  Batches: {}", plan.batches.len());
    for batch in &plan.batches {
        println!(
            "    #{:<3} days {:<5} {:>10} tokens  {:>3} commits  {:>2} PRs{}",
            batch.ordinal,
            batch.day_range.to_string(),
            format_with_commas(batch.estimated_tokens),
            batch.commits.len(),
            batch.pull_requests.len(),
            if batch.compressed { "  (compressed)" } else { "" }
        );
    }
    println!();
}
