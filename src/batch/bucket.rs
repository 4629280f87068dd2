//! Day bucketing

use crate::domain::{Commit, DayBucket, PullRequest, ReportWindow, WindowPolicy};
use crate::error::EngineError;

/// Partition commits into one bucket per UTC calendar day of the window.
///
/// Every day gets a bucket, empty or not, so bucket `i` always covers
/// `window.day_at(i)`. Commits inside a bucket are ordered by timestamp;
/// ties keep their input order.
pub fn bucketize(
    commits: Vec<Commit>,
    window: &ReportWindow,
    policy: WindowPolicy,
) -> Result<Vec<DayBucket>, EngineError> {
    let day_count = window.day_count();
    if day_count == 0 {
        return Err(EngineError::InvalidWindow { start: window.start, end: window.end });
    }

    let mut buckets: Vec<DayBucket> =
        (0..day_count).map(|i| DayBucket::new(i, window.day_at(i))).collect();

    for commit in commits {
        let index = day_index(&commit, window, day_count, policy)?;
        buckets[index].commits.push(commit);
    }

    for bucket in &mut buckets {
        bucket.commits.sort_by_key(|c| c.timestamp);
    }

    Ok(buckets)
}

/// Attach each PR to one day that has commits: the last such day on or
/// before the PR's day, or the first such day for earlier PRs. PRs are
/// placed before batching so every strategy sizes batches with them counted.
/// With no commits at all there is nothing to attach to and PRs are dropped.
pub fn attach_pull_requests(buckets: &mut [DayBucket], pull_requests: &[PullRequest], window: &ReportWindow) {
    let Some(first) = buckets.iter().position(|b| !b.is_empty()) else {
        if !pull_requests.is_empty() {
            tracing::debug!(pull_requests = pull_requests.len(), "no commits in window, dropping pull requests");
        }
        return;
    };

    let mut ordered: Vec<&PullRequest> = pull_requests.iter().collect();
    ordered.sort_by_key(|pr| (pr.timestamp, pr.number));

    for pr in ordered {
        let day = window.day_offset(pr.timestamp);
        let slot = buckets
            .iter()
            .rposition(|b| !b.is_empty() && (b.day_index as i64) <= day)
            .unwrap_or(first);
        buckets[slot].pull_requests.push(pr.clone());
    }
}

fn day_index(
    commit: &Commit,
    window: &ReportWindow,
    day_count: usize,
    policy: WindowPolicy,
) -> Result<usize, EngineError> {
    let offset = window.day_offset(commit.timestamp);
    if window.contains(commit.timestamp) {
        return Ok(offset as usize);
    }

    match policy {
        WindowPolicy::Reject => Err(EngineError::OutOfWindow {
            sha: commit.sha.clone(),
            timestamp: commit.timestamp,
            start: window.start,
            end: window.end,
        }),
        WindowPolicy::Clamp => {
            let index = offset.clamp(0, day_count as i64 - 1) as usize;
            tracing::warn!(
                sha = %commit.sha,
                timestamp = %commit.timestamp,
                day = index,
                "clamping out-of-window commit into nearest day"
            );
            Ok(index)
        }
    }
}
