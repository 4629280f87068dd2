//! Diff batching engine.
//!
//! Turns one repository's commits into an ordered sequence of token-bounded
//! batches: filter and safety-crop files, bucket commits by UTC day, pick a
//! tier from the window total, then run that tier's strategy.

use chrono::Duration;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::info;

use crate::domain::{
    ActivityFile, BatchPlan, Commit, PlanStats, ReportWindow, RepositoryActivity, TokenBudget,
    WindowPolicy,
};
use crate::error::EngineError;
use crate::filter::{ContentFilter, Preparer};

pub mod bucket;
pub mod compress;
pub mod strategy;
pub mod tier;

pub use bucket::{attach_pull_requests, bucketize};
pub use compress::{compress_commit, compress_day, per_commit_budget, Compressed};
pub use strategy::{build_batches, BuiltBatches};
pub use tier::{select_tier, validate_budget, window_tokens};

/// Everything the engine needs for one run. Passed by value into the
/// planner; nothing is read from global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub budget: TokenBudget,
    pub safety_crop_tokens: usize,
    /// Longest accepted window span.
    pub window_days: u32,
    pub window_policy: WindowPolicy,
    pub exclude_globs: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        crate::domain::Config::default().engine()
    }
}

/// Plans batches for repositories under one fixed configuration.
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    config: EngineConfig,
    preparer: Preparer,
}

impl BatchPlanner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        validate_budget(&config.budget)?;
        let filter = ContentFilter::new(&config.exclude_globs)?;
        let preparer = Preparer::new(filter, config.safety_crop_tokens);
        Ok(Self { config, preparer })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Plan one repository. Deterministic: identical input yields an
    /// identical plan.
    pub fn plan(
        &self,
        repository: &str,
        activity: &RepositoryActivity,
        window: &ReportWindow,
    ) -> Result<BatchPlan, EngineError> {
        self.validate_window(window)?;
        ensure_unique(&activity.commits)?;

        let (commits, prepared) = self.preparer.prepare(&activity.commits);
        let mut buckets = bucketize(commits, window, self.config.window_policy)?;

        let total_tokens = window_tokens(&buckets, &activity.pull_requests);
        let tier = select_tier(total_tokens, &self.config.budget);
        info!(
            repository,
            %tier,
            total_tokens,
            commits = activity.commits.len(),
            "selected batching tier"
        );

        attach_pull_requests(&mut buckets, &activity.pull_requests, window);
        let built = build_batches(tier, buckets, &self.config.budget, self.preparer.filter());
        let batches = built.batches;

        info!(repository, batches = batches.len(), "planned batches");

        Ok(BatchPlan {
            repository: repository.to_string(),
            tier,
            total_tokens,
            window: *window,
            budget: self.config.budget,
            stats: PlanStats {
                commits: activity.commits.len(),
                pull_requests: activity.pull_requests.len(),
                files_kept: prepared.files_kept,
                files_dropped_non_code: prepared.files_dropped,
                files_safety_cropped: prepared.files_cropped,
                files_budget_cropped: built.files_cropped,
            },
            batches,
        })
    }

    fn validate_window(&self, window: &ReportWindow) -> Result<(), EngineError> {
        if window.end <= window.start {
            return Err(EngineError::InvalidWindow { start: window.start, end: window.end });
        }
        if window.end - window.start > Duration::days(i64::from(self.config.window_days)) {
            return Err(EngineError::WindowTooLong {
                start: window.start,
                end: window.end,
                max_days: self.config.window_days,
            });
        }
        Ok(())
    }
}

/// Outcome of planning one repository from a multi-repository activity file.
#[derive(Debug)]
pub struct RepositoryPlan {
    pub repository: String,
    pub result: Result<BatchPlan, EngineError>,
}

/// Plan every repository in parallel. Results come back in repository-name
/// order; a failure in one repository does not affect the others.
pub fn plan_repositories(planner: &BatchPlanner, activity: &ActivityFile) -> Vec<RepositoryPlan> {
    let repositories: Vec<(&String, &RepositoryActivity)> = activity.repositories.iter().collect();
    repositories
        .par_iter()
        .map(|(name, repo)| RepositoryPlan {
            repository: (*name).clone(),
            result: planner.plan(name, repo, &activity.window),
        })
        .collect()
}

/// Restore ascending-ordinal order for per-batch results that were produced
/// concurrently.
pub fn reassemble_in_order<T>(outputs: impl IntoIterator<Item = (usize, T)>) -> Vec<T> {
    let mut outputs: Vec<(usize, T)> = outputs.into_iter().collect();
    outputs.sort_by_key(|(ordinal, _)| *ordinal);
    outputs.into_iter().map(|(_, output)| output).collect()
}

fn ensure_unique(commits: &[Commit]) -> Result<(), EngineError> {
    let mut seen = HashSet::with_capacity(commits.len());
    for commit in commits {
        if !seen.insert(commit.sha.as_str()) {
            return Err(EngineError::DuplicateCommit { sha: commit.sha.clone() });
        }
    }
    Ok(())
}
