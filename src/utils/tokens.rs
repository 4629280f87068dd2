//! Token estimation

use crate::domain::{Commit, DayBucket, FileDiff, PullRequest};

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 3;

/// Estimate tokens using a simple heuristic (chars / 3).
///
/// Counts Unicode code points rather than bytes so multi-byte content (CJK
/// text, emoji) is not over-counted. Monotonic in input length.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Largest character count that still estimates to at most `tokens`.
pub fn max_chars_for_tokens(tokens: usize) -> usize {
    tokens.saturating_mul(CHARS_PER_TOKEN).saturating_add(CHARS_PER_TOKEN - 1)
}

pub fn estimate_file_tokens(file: &FileDiff) -> usize {
    estimate_tokens(&file.block_text())
}

/// Header plus every file block. Additive over files, so compressing one
/// file changes the commit total by exactly that file's delta.
pub fn estimate_commit_tokens(commit: &Commit) -> usize {
    estimate_tokens(&commit.header_text())
        + commit.files.iter().map(estimate_file_tokens).sum::<usize>()
}

pub fn estimate_commits_tokens(commits: &[Commit]) -> usize {
    commits.iter().map(estimate_commit_tokens).sum()
}

/// Commits plus the PRs attached to the day.
pub fn estimate_bucket_tokens(bucket: &DayBucket) -> usize {
    estimate_commits_tokens(&bucket.commits) + estimate_prs_tokens(&bucket.pull_requests)
}

pub fn estimate_pr_tokens(pr: &PullRequest) -> usize {
    estimate_tokens(&pr.text())
}

pub fn estimate_prs_tokens(pull_requests: &[PullRequest]) -> usize {
    pull_requests.iter().map(estimate_pr_tokens).sum()
}
