//! Integration tests for CLI

use assert_cmd::Command;
use git2::{Repository, Signature, Time};
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn bin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("diff-batcher"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn patch(lines: usize) -> String {
    (0..lines).map(|i| format!("+let value_{i} = compute({i});")).collect::<Vec<_>>().join("\n")
}

fn write_activity(dir: &Path) -> PathBuf {
    let activity = json!({
        "window": {"start": "2024-01-15T00:00:00Z", "end": "2024-01-22T00:00:00Z"},
        "repositories": {
            "acme/api": {
                "commits": [
                    {"sha": "a1b2c3d4e5", "message": "Add handler", "author": "alice",
                     "timestamp": "2024-01-15T09:00:00Z",
                     "files": [{"path": "src/handler.rs", "patch": patch(40), "status": "added"},
                               {"path": "assets/logo.png", "patch": "Binary files a/logo.png and b/logo.png differ"}]},
                    {"sha": "f6e5d4c3b2", "message": "Wire routes", "author": "bob",
                     "timestamp": "2024-01-17T14:30:00Z",
                     "files": [{"path": "src/routes.rs", "patch": patch(20)}]}
                ],
                "pull_requests": [
                    {"number": 42, "title": "Routing", "status": "open", "author": "bob",
                     "timestamp": "2024-01-17T15:00:00Z"}
                ],
                "context": {"summary": "HTTP API for widgets", "stack": ["rust", "axum"]}
            },
            "acme/web": {
                "commits": [
                    {"sha": "0011223344", "message": "Tweak layout", "author": "carol",
                     "timestamp": "2024-01-19T10:00:00Z",
                     "files": [{"path": "web/app.ts", "patch": patch(10)}]}
                ]
            }
        }
    });
    let path = dir.join("activity.json");
    fs::write(&path, serde_json::to_string_pretty(&activity).expect("json")).expect("write");
    path
}

#[test]
fn test_cli_version() {
    bin().arg("--version").assert().success().stdout(predicate::str::contains("diff-batcher"));
}

#[test]
fn test_cli_help() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("token-budgeted batches"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("collect"));
}

#[test]
fn test_plan_text_output() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());

    bin()
        .current_dir(tmp.path())
        .args(["plan", activity.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository: acme/api"))
        .stdout(predicate::str::contains("Tier 1 (single call)"))
        .stdout(predicate::str::contains("1 non-code dropped"))
        .stdout(predicate::str::contains("Repository: acme/web"));
}

#[test]
fn test_plan_json_with_small_budget_splits_by_day() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());

    let output = bin()
        .current_dir(tmp.path())
        .args([
            "plan",
            activity.to_str().unwrap(),
            "--repo",
            "acme/api",
            "--format",
            "json",
            "--single-call-limit",
            "400",
            "--merge-target",
            "400",
        ])
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let plans: Value = serde_json::from_slice(&output.stdout).expect("json");
    let plans = plans.as_array().expect("array");
    assert_eq!(plans.len(), 1);
    let plan = &plans[0];
    assert_eq!(plan["repository"], json!("acme/api"));
    assert_eq!(plan["tier"], json!("day-merge"));
    let batches = plan["batches"].as_array().expect("batches");
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0]["commits"], json!(["a1b2c3d4e5"]));
    assert_eq!(batches[1]["commits"], json!(["f6e5d4c3b2"]));
    assert_eq!(batches[1]["pull_requests"], json!([42]));
}

#[test]
fn test_plan_rejects_out_of_window_commit() {
    let tmp = TempDir::new().expect("tmp");
    let activity = json!({
        "window": {"start": "2024-01-15T00:00:00Z", "end": "2024-01-22T00:00:00Z"},
        "repositories": {
            "acme/api": {"commits": [{"sha": "deadbeef", "timestamp": "2024-01-22T00:00:00Z"}]}
        }
    });
    let path = tmp.path().join("activity.json");
    fs::write(&path, activity.to_string()).expect("write");

    bin()
        .current_dir(tmp.path())
        .args(["plan", path.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("outside the report window"))
        .stderr(predicate::str::contains("1 of 1 repositories failed"));

    bin()
        .current_dir(tmp.path())
        .args(["plan", path.to_str().unwrap(), "--out-of-window", "clamp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Batches: 1"));
}

#[test]
fn test_plan_unknown_repo_fails() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());

    bin()
        .current_dir(tmp.path())
        .args(["plan", activity.to_str().unwrap(), "--repo", "acme/missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in activity file"));
}

#[test]
fn test_plan_rejects_inconsistent_budget() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());

    bin()
        .current_dir(tmp.path())
        .args(["plan", activity.to_str().unwrap(), "--merge-target", "200000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid token budget"));
}

#[test]
fn test_env_and_config_file_overrides() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());
    fs::write(tmp.path().join("diff-batcher.toml"), "single_call_limit = 400\nmerge_target = 400\n")
        .expect("write config");

    // File config alone splits acme/api into two day-merge batches.
    bin()
        .current_dir(tmp.path())
        .args(["plan", activity.to_str().unwrap(), "--repo", "acme/api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tier 2 (day merge)"));

    // Environment beats the file.
    bin()
        .current_dir(tmp.path())
        .env("DIFF_BATCHER_SINGLE_CALL_LIMIT", "100000")
        .env("DIFF_BATCHER_MERGE_TARGET", "90000")
        .args(["plan", activity.to_str().unwrap(), "--repo", "acme/api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tier 1 (single call)"));
}

#[test]
fn test_render_writes_batches_and_plan() {
    let tmp = TempDir::new().expect("tmp");
    let activity = write_activity(tmp.path());
    let out = tmp.path().join("out");

    bin()
        .current_dir(tmp.path())
        .args([
            "render",
            activity.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--no-timestamp",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/api: wrote 1 batches"));

    let batch = fs::read_to_string(out.join("acme_api").join("batch-0.md")).expect("batch");
    assert!(batch.contains("Summary: HTTP API for widgets"));
    assert!(batch.contains("Commit: a1b2c3d"));
    assert!(batch.contains("File: src/handler.rs (added)"));
    assert!(!batch.contains("logo.png"));
    assert!(batch.contains("\n---\n"));
    assert!(batch.contains("PR #42: Routing [open]"));

    let report: Value =
        serde_json::from_str(&fs::read_to_string(out.join("acme_api").join("plan.json")).expect("plan"))
            .expect("json");
    assert!(report.get("generated_at").is_none());
    assert_eq!(report["output_files"], json!(["batch-0.md"]));
    assert_eq!(report["config"]["merge_target"], json!(90000));

    assert!(out.join("acme_web").join("batch-0.md").exists());
}

fn commit(repo: &Repository, path: &str, content: &str, author: &str, at: i64, msg: &str) {
    let root = repo.workdir().expect("workdir");
    let full = root.join(path);
    fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
    fs::write(&full, content).expect("write");
    let mut index = repo.index().expect("index");
    index.add_path(Path::new(path)).expect("add");
    index.write().expect("write index");
    let tree = repo.find_tree(index.write_tree().expect("tree")).expect("find tree");
    let sig = Signature::new(author, "dev@example.com", &Time::new(at, 0)).expect("sig");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, msg, &tree, &parents).expect("commit");
}

#[test]
fn test_collect_then_plan() {
    let tmp = TempDir::new().expect("tmp");
    let repo_dir = tmp.path().join("widget");
    let repo = Repository::init(&repo_dir).expect("init");
    // 2024-01-16T10:00:00Z and a week before it.
    commit(&repo, "src/main.rs", "fn main() {}\n", "alice", 1_705_399_200 - 8 * 86_400, "Initial");
    commit(&repo, "src/main.rs", "fn main() {\n    serve();\n}\n", "alice", 1_705_399_200, "Serve");
    commit(&repo, "README.md", "# widget\n", "dependabot[bot]", 1_705_399_200 + 60, "Bump");

    let activity_path = tmp.path().join("activity.json");
    bin()
        .current_dir(tmp.path())
        .args([
            "collect",
            "--path",
            repo_dir.to_str().unwrap(),
            "--end",
            "2024-01-22T00:00:00Z",
            "--output",
            activity_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("widget: collected 1 commits"));

    let activity: Value =
        serde_json::from_str(&fs::read_to_string(&activity_path).expect("read")).expect("json");
    let commits = activity["repositories"]["widget"]["commits"].as_array().expect("commits");
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0]["message"], json!("Serve"));
    assert!(commits[0]["files"][0]["patch"].as_str().expect("patch").contains("+    serve();"));

    bin()
        .current_dir(tmp.path())
        .args(["plan", activity_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository: widget"))
        .stdout(predicate::str::contains("Batches: 1"));
}

#[test]
fn test_collect_rounds_midday_end_up_to_midnight() {
    let tmp = TempDir::new().expect("tmp");
    let repo_dir = tmp.path().join("widget");
    let repo = Repository::init(&repo_dir).expect("init");
    commit(&repo, "src/main.rs", "fn main() {}\n", "alice", 1_705_399_200, "Initial");

    let output = bin()
        .current_dir(tmp.path())
        .args(["collect", "--path", repo_dir.to_str().unwrap(), "--end", "2024-01-21T10:30:00Z"])
        .output()
        .expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let activity: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(activity["window"]["start"], json!("2024-01-15T00:00:00Z"));
    assert_eq!(activity["window"]["end"], json!("2024-01-22T00:00:00Z"));
}
