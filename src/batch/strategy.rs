//! Batch construction strategies, one per tier.

use tracing::debug;

use super::compress::compress_day;
use crate::domain::{Batch, Commit, DayBucket, DayRange, PullRequest, Tier, TokenBudget};
use crate::filter::ContentFilter;
use crate::utils::{batch_fingerprint, estimate_bucket_tokens, estimate_commits_tokens, estimate_prs_tokens};

/// Batches built for one repository plus the number of files the
/// hierarchical compressor cropped along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltBatches {
    pub batches: Vec<Batch>,
    pub files_cropped: usize,
}

struct Draft {
    day_range: DayRange,
    commits: Vec<Commit>,
    pull_requests: Vec<PullRequest>,
    compressed: bool,
}

/// Greedy day merger shared by the Day-Merge and Hybrid strategies.
#[derive(Default)]
struct Accumulator {
    range: Option<DayRange>,
    commits: Vec<Commit>,
    pull_requests: Vec<PullRequest>,
    tokens: usize,
}

impl Accumulator {
    /// Append the bucket, flushing first when it would push the running
    /// total past `target`. A bucket larger than `target` on its own still
    /// becomes a batch of its own.
    fn merge(&mut self, bucket: DayBucket, tokens: usize, target: usize, drafts: &mut Vec<Draft>) {
        if self.tokens.saturating_add(tokens) > target {
            self.flush(drafts);
        }
        self.range = Some(match self.range {
            Some(range) => DayRange::new(range.start, bucket.day_index),
            None => DayRange::single(bucket.day_index),
        });
        self.tokens += tokens;
        self.commits.extend(bucket.commits);
        self.pull_requests.extend(bucket.pull_requests);
    }

    fn flush(&mut self, drafts: &mut Vec<Draft>) {
        if let Some(day_range) = self.range.take() {
            debug!(days = %day_range, tokens = self.tokens, commits = self.commits.len(), "flushing merged days");
            drafts.push(Draft {
                day_range,
                commits: std::mem::take(&mut self.commits),
                pull_requests: std::mem::take(&mut self.pull_requests),
                compressed: false,
            });
        }
        self.tokens = 0;
    }
}

/// Run the strategy for `tier` over buckets in day order.
pub fn build_batches(
    tier: Tier,
    buckets: Vec<DayBucket>,
    budget: &TokenBudget,
    filter: &ContentFilter,
) -> BuiltBatches {
    let (drafts, files_cropped) = match tier {
        Tier::Single => (single(buckets), 0),
        Tier::DayMerge => (day_merge(buckets, budget), 0),
        Tier::Hybrid => hybrid(buckets, budget, filter),
    };
    BuiltBatches { batches: seal(drafts), files_cropped }
}

/// Everything in one batch, chronological.
fn single(buckets: Vec<DayBucket>) -> Vec<Draft> {
    let days: Vec<DayBucket> = buckets.into_iter().filter(|b| !b.is_empty()).collect();
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };
    let day_range = DayRange::new(first.day_index, last.day_index);
    let mut commits = Vec::new();
    let mut pull_requests = Vec::new();
    for day in days {
        commits.extend(day.commits);
        pull_requests.extend(day.pull_requests);
    }
    vec![Draft { day_range, commits, pull_requests, compressed: false }]
}

/// Greedily merge adjacent days up to the merge target.
fn day_merge(buckets: Vec<DayBucket>, budget: &TokenBudget) -> Vec<Draft> {
    let mut drafts = Vec::new();
    let mut acc = Accumulator::default();
    for bucket in buckets.into_iter().filter(|b| !b.is_empty()) {
        let tokens = estimate_bucket_tokens(&bucket);
        acc.merge(bucket, tokens, budget.merge_target, &mut drafts);
    }
    acc.flush(&mut drafts);
    drafts
}

/// Day merge for small days; oversized days are compressed so that commits
/// and PRs together fit the single call limit, and emitted alone, in day
/// order with the merged batches. PRs are never cropped, so their tokens come
/// out of the commits' share.
fn hybrid(buckets: Vec<DayBucket>, budget: &TokenBudget, filter: &ContentFilter) -> (Vec<Draft>, usize) {
    let mut drafts = Vec::new();
    let mut acc = Accumulator::default();
    let mut files_cropped = 0;

    for bucket in buckets.into_iter().filter(|b| !b.is_empty()) {
        let tokens = estimate_bucket_tokens(&bucket);
        if tokens <= budget.merge_target {
            acc.merge(bucket, tokens, budget.merge_target, &mut drafts);
            continue;
        }

        acc.flush(&mut drafts);
        let target = budget.single_call_limit.saturating_sub(estimate_prs_tokens(&bucket.pull_requests));
        let compressed = compress_day(&bucket.commits, target, filter);
        debug!(
            day = bucket.day_index,
            before = tokens,
            target,
            after = estimate_commits_tokens(&compressed.commits),
            files_cropped = compressed.files_cropped,
            "compressed oversized day"
        );
        files_cropped += compressed.files_cropped;
        drafts.push(Draft {
            day_range: DayRange::single(bucket.day_index),
            commits: compressed.commits,
            pull_requests: bucket.pull_requests,
            compressed: compressed.files_cropped > 0,
        });
    }
    acc.flush(&mut drafts);

    (drafts, files_cropped)
}

fn seal(drafts: Vec<Draft>) -> Vec<Batch> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(ordinal, draft)| Batch {
            ordinal,
            day_range: draft.day_range,
            estimated_tokens: estimate_commits_tokens(&draft.commits)
                + estimate_prs_tokens(&draft.pull_requests),
            fingerprint: batch_fingerprint(ordinal, draft.day_range, &draft.commits),
            commits: draft.commits,
            pull_requests: draft.pull_requests,
            compressed: draft.compressed,
        })
        .collect()
}
