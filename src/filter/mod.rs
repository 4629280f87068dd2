//! Content filtering and safety cropping, applied to every commit before any
//! token accounting happens.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::crop::{crop_file, CropPolicy};
use crate::domain::{Commit, FileDiff};
use crate::error::EngineError;
use crate::utils::normalize_path;

/// Decides which file diffs count as code.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    exclude: GlobSet,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self { exclude: GlobSet::empty() }
    }
}

impl ContentFilter {
    /// Build a filter with extra exclude globs on top of the built-in denylist.
    pub fn new(exclude_globs: &[String]) -> Result<Self, EngineError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_globs {
            let glob = Glob::new(pattern).map_err(|source| EngineError::InvalidFilter {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|source| EngineError::InvalidFilter { pattern: exclude_globs.join(","), source })?;
        Ok(Self { exclude })
    }

    pub fn is_code(&self, file: &FileDiff) -> bool {
        file.is_code() && !self.exclude.is_match(normalize_path(&file.path))
    }

    /// Copy of `files` with non-code entries removed, order preserved.
    pub fn retain_code(&self, files: &[FileDiff]) -> Vec<FileDiff> {
        files.iter().filter(|f| self.is_code(f)).cloned().collect()
    }
}

/// Counters gathered while preparing a repository's commits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareStats {
    pub files_kept: usize,
    pub files_dropped: usize,
    pub files_cropped: usize,
}

/// Drops non-code files and applies the safety crop to what remains.
#[derive(Debug, Clone)]
pub struct Preparer {
    filter: ContentFilter,
    safety_crop_tokens: usize,
}

impl Preparer {
    pub fn new(filter: ContentFilter, safety_crop_tokens: usize) -> Self {
        Self { filter, safety_crop_tokens }
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    /// Produce new commit values; the input is left untouched. Commits whose
    /// files are all dropped still pass through with an empty file list.
    pub fn prepare(&self, commits: &[Commit]) -> (Vec<Commit>, PrepareStats) {
        let mut stats = PrepareStats::default();
        let prepared = commits
            .iter()
            .map(|commit| {
                let mut files = Vec::with_capacity(commit.files.len());
                for file in &commit.files {
                    if !self.filter.is_code(file) {
                        stats.files_dropped += 1;
                        tracing::trace!(sha = %commit.short_sha(), path = %file.path, "dropping non-code file");
                        continue;
                    }
                    let cropped = crop_file(file, self.safety_crop_tokens, CropPolicy::Safety);
                    if cropped.truncated && !file.truncated {
                        stats.files_cropped += 1;
                    }
                    stats.files_kept += 1;
                    files.push(cropped);
                }
                commit.with_files(files)
            })
            .collect();
        (prepared, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::estimate_commits_tokens;
    use chrono::{TimeZone, Utc};

    fn commit(files: Vec<FileDiff>) -> Commit {
        Commit {
            sha: "feedface00".to_string(),
            message: "Update assets".to_string(),
            author: "dev".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap(),
            files,
            url: None,
        }
    }

    #[test]
    fn test_binary_asset_contributes_nothing_to_budget() {
        let asset = FileDiff::new("assets/hero.png", "\u{0}".repeat(5 * 1024 * 1024));
        let code = FileDiff::new("src/lib.rs", "+".repeat(600));
        let preparer = Preparer::new(ContentFilter::default(), 30_000);

        let (mixed, stats) = preparer.prepare(&[commit(vec![asset, code.clone()])]);
        let (code_only, _) = preparer.prepare(&[commit(vec![code])]);

        assert_eq!(stats.files_dropped, 1);
        assert_eq!(stats.files_kept, 1);
        assert_eq!(estimate_commits_tokens(&mixed), estimate_commits_tokens(&code_only));
    }

    #[test]
    fn test_safety_crop_applies_per_file() {
        let huge = FileDiff::new("vendor.js", "x\n".repeat(200_000));
        let small = FileDiff::new("src/main.rs", "+fn main() {}");
        let preparer = Preparer::new(ContentFilter::default(), 1_000);

        let (prepared, stats) = preparer.prepare(&[commit(vec![huge, small.clone()])]);

        assert_eq!(stats.files_cropped, 1);
        assert!(prepared[0].files[0].truncated);
        assert_eq!(prepared[0].files[1], small);
    }

    #[test]
    fn test_exclude_globs_extend_denylist() {
        let filter = ContentFilter::new(&["docs/**".to_string(), "*.snap".to_string()]).unwrap();
        assert!(!filter.is_code(&FileDiff::new("docs/guide.md", "+a")));
        assert!(!filter.is_code(&FileDiff::new("tests/snapshots/x.snap", "+a")));
        assert!(filter.is_code(&FileDiff::new("src/guide.rs", "+a")));
    }

    #[test]
    fn test_invalid_glob_is_reported() {
        let err = ContentFilter::new(&["src/[".to_string()]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilter { .. }));
    }

    #[test]
    fn test_commit_without_code_files_passes_through() {
        let preparer = Preparer::new(ContentFilter::default(), 30_000);
        let (prepared, _) = preparer.prepare(&[commit(vec![FileDiff::new("a.gif", "")])]);
        assert_eq!(prepared.len(), 1);
        assert!(prepared[0].files.is_empty());
    }
}
