//! Local git collector
//!
//! Walks a repository on disk with libgit2 and turns the commits inside a
//! report window into `RepositoryActivity`, one unified diff per file against
//! the first parent.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, Delta, DiffFormat, DiffOptions, Oid, Repository, Sort};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::domain::{Commit, FileDiff, ReportWindow, RepositoryActivity};
use crate::fetch::bots::is_bot_author;

/// What the collector keeps.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub window: ReportWindow,
    pub skip_bots: bool,
}

/// Open the repository containing `path`, searching parent directories.
pub fn open_repository(path: &Path) -> Result<Repository> {
    Repository::discover(path)
        .with_context(|| format!("No git repository found at or above {}", path.display()))
}

/// Directory name of the repository's working tree, used as its name in the
/// activity file.
pub fn repository_name(repo: &Repository) -> String {
    let root = repo.workdir().unwrap_or_else(|| repo.path());
    root.file_name()
        .map(|n| n.to_string_lossy().trim_end_matches(".git").to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "repository".to_string())
}

/// Collect every commit reachable from a local branch (or HEAD when there are
/// none) whose author time falls inside the window. Commits reachable from
/// several branches appear once. Output is in chronological order.
pub fn collect_local(repo: &Repository, options: &CollectOptions) -> Result<RepositoryActivity> {
    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;

    let mut pushed = 0;
    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        if let Some(target) = branch.get().target() {
            revwalk.push(target)?;
            pushed += 1;
        }
    }
    if pushed == 0 {
        revwalk.push_head().context("Repository has no branches and no HEAD")?;
    }

    let mut seen: HashSet<Oid> = HashSet::new();
    let mut commits = Vec::new();
    let mut skipped_bots = 0usize;

    for oid in revwalk {
        let oid = oid?;
        if !seen.insert(oid) {
            continue;
        }
        let commit = repo.find_commit(oid)?;
        let Some(timestamp) = commit_time(&commit) else {
            debug!(sha = %oid, "skipping commit with unrepresentable time");
            continue;
        };
        if !options.window.contains(timestamp) {
            continue;
        }

        let author = commit.author().name().unwrap_or("Unknown").to_string();
        if options.skip_bots && is_bot_author(&author) {
            skipped_bots += 1;
            continue;
        }

        commits.push(Commit {
            sha: oid.to_string(),
            message: commit.message().unwrap_or_default().trim().to_string(),
            author,
            timestamp,
            files: file_diffs(repo, &commit)?,
            url: None,
        });
    }

    commits.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.sha.cmp(&b.sha)));
    info!(
        repository = %repository_name(repo),
        commits = commits.len(),
        skipped_bots,
        "collected local activity"
    );

    Ok(RepositoryActivity { commits, pull_requests: Vec::new(), context: None })
}

fn commit_time(commit: &git2::Commit<'_>) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(commit.author().when().seconds(), 0).single()
}

/// Per-file patches of `commit` against its first parent (or the empty tree
/// for a root commit), in diff order.
fn file_diffs(repo: &Repository, commit: &git2::Commit<'_>) -> Result<Vec<FileDiff>> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 { Some(commit.parent(0)?.tree()?) } else { None };

    let mut opts = DiffOptions::new();
    opts.context_lines(3);
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

    let mut files: Vec<FileDiff> = Vec::new();
    diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        if files.last().map(|f| f.path != path).unwrap_or(true) {
            let mut file = FileDiff::new(path, String::new());
            file.status = status_label(delta.status()).to_string();
            files.push(file);
        }
        let Some(file) = files.last_mut() else {
            return true;
        };

        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            origin @ ('+' | '-' | ' ') => {
                file.patch.push(origin);
                file.patch.push_str(&content);
                match origin {
                    '+' => file.additions += 1,
                    '-' => file.deletions += 1,
                    _ => {}
                }
            }
            'H' | 'B' => file.patch.push_str(&content),
            _ => {}
        }
        true
    })?;

    for file in &mut files {
        let trimmed = file.patch.trim_end_matches('\n').len();
        file.patch.truncate(trimmed);
    }
    Ok(files)
}

fn status_label(delta: Delta) -> &'static str {
    match delta {
        Delta::Added => "added",
        Delta::Deleted => "removed",
        Delta::Renamed => "renamed",
        Delta::Copied => "copied",
        _ => "modified",
    }
}
