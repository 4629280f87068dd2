//! Hierarchical compression of oversized days.
//!
//! Two levels only: the day's target is split evenly across its commits, and
//! an over-budget commit's share is split evenly across its files. Unused
//! share from small commits or files is not handed to larger ones.

use crate::crop::{crop_file, CropPolicy};
use crate::domain::{Commit, FileDiff};
use crate::filter::ContentFilter;
use crate::utils::{estimate_commit_tokens, estimate_file_tokens, estimate_tokens};

/// Result of compressing one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub commits: Vec<Commit>,
    pub files_cropped: usize,
}

/// Floor division; the remainder stays unused. Zero commits yields zero.
pub fn per_commit_budget(target_tokens: usize, commit_count: usize) -> usize {
    target_tokens.checked_div(commit_count).unwrap_or(0)
}

/// Compress a day's commits toward `target_tokens` in total.
pub fn compress_day(commits: &[Commit], target_tokens: usize, filter: &ContentFilter) -> Compressed {
    let per_commit = per_commit_budget(target_tokens, commits.len());
    let mut files_cropped = 0;
    let commits = commits
        .iter()
        .map(|commit| {
            let (compressed, cropped) = compress_commit(commit, per_commit, filter);
            files_cropped += cropped;
            compressed
        })
        .collect();
    Compressed { commits, files_cropped }
}

/// Fit one commit into `budget` tokens, returning the new commit and the
/// number of files whose patch was cut.
///
/// A commit that already fits is returned as is. Otherwise the budget left
/// after the commit header is divided evenly over the code files; files under
/// their share are kept whole, larger ones are budget-cropped so their whole
/// block (path line and fences included) lands within the share.
pub fn compress_commit(commit: &Commit, budget: usize, filter: &ContentFilter) -> (Commit, usize) {
    let commit = commit.with_files(filter.retain_code(&commit.files));
    if commit.files.is_empty() || estimate_commit_tokens(&commit) <= budget {
        return (commit, 0);
    }

    let header_tokens = estimate_tokens(&commit.header_text());
    let per_file = budget.saturating_sub(header_tokens) / commit.files.len();

    let mut cropped = 0;
    let files: Vec<FileDiff> = commit
        .files
        .iter()
        .map(|file| {
            let block_tokens = estimate_file_tokens(file);
            if block_tokens <= per_file {
                return file.clone();
            }
            // +1 absorbs the rounding of estimating wrapper and patch separately.
            let overhead = block_tokens.saturating_sub(estimate_tokens(&file.patch)) + 1;
            let out = crop_file(file, per_file.saturating_sub(overhead), CropPolicy::Budget);
            if out.patch != file.patch {
                cropped += 1;
            }
            out
        })
        .collect();

    tracing::debug!(
        sha = %commit.short_sha(),
        budget,
        per_file,
        cropped,
        "compressed commit"
    );

    (commit.with_files(files), cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::test_support::{commit_at, commit_with_files, patch_of};
    use chrono::{TimeZone, Utc};

    fn ts(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 17, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_per_commit_budget_floors_and_handles_zero() {
        assert_eq!(per_commit_budget(100_000, 10), 10_000);
        assert_eq!(per_commit_budget(100_000, 3), 33_333);
        assert_eq!(per_commit_budget(100_000, 0), 0);
    }

    #[test]
    fn test_ten_commit_day_crops_large_commit_and_keeps_small_one() {
        let filter = ContentFilter::default();
        let mut commits: Vec<Commit> = (0..8)
            .map(|i| commit_at(&format!("mid{i}"), ts(i + 1), 25_000))
            .collect();
        let huge = commit_with_files("huge", ts(10), vec![FileDiff::new("src/big.rs", patch_of(40_000))]);
        let small = commit_at("small", ts(11), 5_000);
        commits.push(huge.clone());
        commits.push(small.clone());
        assert!(crate::utils::estimate_commits_tokens(&commits) >= 245_000);

        assert_eq!(per_commit_budget(100_000, commits.len()), 10_000);
        let out = compress_day(&commits, 100_000, &filter);

        let huge_out = &out.commits[8];
        let huge_tokens = estimate_commit_tokens(huge_out);
        assert!(huge_tokens <= 10_000, "got {huge_tokens}");
        assert!(huge_tokens > 9_000, "cropped toward the share, got {huge_tokens}");
        assert!(huge_out.files[0].truncated);
        assert!(huge.files[0].patch.starts_with(
            huge_out.files[0].patch.split("\n\n[TRUNCATED").next().unwrap()
        ));

        assert_eq!(out.commits[9], small);
        assert!(crate::utils::estimate_commits_tokens(&out.commits) <= 100_000);
        assert_eq!(out.files_cropped, 9);
    }

    #[test]
    fn test_files_under_their_share_are_untouched() {
        let filter = ContentFilter::default();
        let tiny = FileDiff::new("src/tiny.rs", patch_of(50));
        let big = FileDiff::new("src/big.rs", patch_of(40_000));
        let commit = commit_with_files("mixed", ts(9), vec![big, tiny.clone()]);

        let (out, cropped) = compress_commit(&commit, 10_000, &filter);

        assert_eq!(cropped, 1);
        assert_eq!(out.files[1], tiny);
        assert!(estimate_commit_tokens(&out) <= 10_000);
    }

    #[test]
    fn test_non_code_files_never_consume_budget() {
        let filter = ContentFilter::default();
        let commit = commit_with_files(
            "assets",
            ts(9),
            vec![FileDiff::new("img/a.png", patch_of(40_000)), FileDiff::new("src/a.rs", patch_of(100))],
        );
        let (out, cropped) = compress_commit(&commit, 1_000, &filter);
        assert_eq!(cropped, 0);
        assert_eq!(out.files.len(), 1);
        assert_eq!(out.files[0].path, "src/a.rs");
    }

    #[test]
    fn test_commit_without_files_is_a_no_op() {
        let filter = ContentFilter::default();
        let commit = commit_with_files("empty", ts(9), Vec::new());
        let (out, cropped) = compress_commit(&commit, 0, &filter);
        assert_eq!(out, commit);
        assert_eq!(cropped, 0);
    }

    #[test]
    fn test_compression_is_stable_when_repeated() {
        let filter = ContentFilter::default();
        let commits: Vec<Commit> = (0..4).map(|i| commit_at(&format!("c{i}"), ts(i + 1), 60_000)).collect();
        let once = compress_day(&commits, 100_000, &filter);
        let twice = compress_day(&once.commits, 100_000, &filter);
        assert_eq!(once.commits, twice.commits);
        assert_eq!(twice.files_cropped, 0);
    }
}
