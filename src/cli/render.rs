//! Render command implementation

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::plan::{ensure_all_planned, select_repository};
use super::utils::{resolve_config, sanitize_repo_name, BudgetArgs};
use crate::batch::{plan_repositories, reassemble_in_order, BatchPlanner};
use crate::domain::{ActivityFile, BatchPlan};
use crate::fetch::load_activity;
use crate::render::{render_batch, write_plan_report};

#[derive(Args)]
pub struct RenderArgs {
    /// Activity JSON file (window plus per-repository commits and PRs)
    #[arg(value_name = "ACTIVITY")]
    pub activity: PathBuf,

    /// Directory to write `<repo>/batch-<n>.md` and `<repo>/plan.json` into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Only render this repository
    #[arg(short, long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Omit the generation timestamp from plan.json
    #[arg(long)]
    pub no_timestamp: bool,

    #[command(flatten)]
    pub budget: BudgetArgs,
}

pub fn run(args: RenderArgs) -> Result<()> {
    let config = resolve_config(args.budget.config.as_deref(), args.budget.overrides())?;
    let planner = BatchPlanner::new(config.engine())?;
    let activity = select_repository(load_activity(&args.activity)?, args.repo.as_deref())?;
    let config_value = serde_json::to_value(&config)?;

    let plans = plan_repositories(&planner, &activity);
    for plan in &plans {
        let Ok(batch_plan) = &plan.result else {
            continue;
        };
        let dir = args.output_dir.join(sanitize_repo_name(&plan.repository));
        let written = write_batches(&dir, batch_plan, &activity)?;
        write_plan_report(&dir.join("plan.json"), batch_plan, &written, &config_value, !args.no_timestamp)?;

        println!("{}: wrote {} batches to {}", plan.repository, written.len(), dir.display());
    }

    ensure_all_planned(&plans)
}

/// Render every batch concurrently, then write them in ordinal order.
fn write_batches(dir: &Path, plan: &BatchPlan, activity: &ActivityFile) -> Result<Vec<String>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let repo_context = activity
        .repositories
        .get(&plan.repository)
        .and_then(|repo| repo.context.as_ref());

    let rendered = plan
        .batches
        .par_iter()
        .map(|batch| {
            let text = render_batch(&plan.repository, batch, &plan.window, repo_context);
            (batch.ordinal, (batch.ordinal, text))
        })
        .collect::<Vec<_>>();

    let mut written = Vec::with_capacity(rendered.len());
    for (ordinal, text) in reassemble_in_order(rendered) {
        let name = format!("batch-{ordinal}.md");
        let path = dir.join(&name);
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(name);
    }

    info!(repository = %plan.repository, batches = written.len(), "rendered batches");
    Ok(written)
}
