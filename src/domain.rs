//! Core domain types: commits, diffs, day buckets, batches and configuration.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::{is_binary_patch, is_code_path};

pub const PLAN_SCHEMA_VERSION: &str = "1.0.0";

pub const DEFAULT_SINGLE_CALL_LIMIT: usize = 100_000;
pub const DEFAULT_MERGE_TARGET: usize = 90_000;
pub const DEFAULT_MEGA_THRESHOLD: usize = 700_000;
/// Roughly 90k characters at three characters per token.
pub const DEFAULT_SAFETY_CROP_TOKENS: usize = 30_000;
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// A single file's unified diff inside a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path: String,
    #[serde(default)]
    pub patch: String,
    #[serde(default = "default_file_status")]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    /// Set when the patch was cut down by the safety or budget crop.
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

impl FileDiff {
    pub fn new(path: impl Into<String>, patch: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            patch: patch.into(),
            status: default_file_status(),
            additions: 0,
            deletions: 0,
            truncated: false,
        }
    }

    pub fn byte_size(&self) -> usize {
        self.patch.len()
    }

    /// Built-in code classification: extension denylist, lock files and
    /// binary patch markers. Configured exclude globs live in `ContentFilter`.
    pub fn is_code(&self) -> bool {
        is_code_path(&self.path) && !is_binary_patch(&self.patch)
    }

    /// The text block this file contributes to a batch payload.
    pub fn block_text(&self) -> String {
        let mut text = format!("File: {} ({})\n", self.path, self.status);
        if !self.patch.is_empty() {
            text.push_str("```\n");
            text.push_str(&self.patch);
            text.push_str("\n```\n");
        }
        text
    }

    /// Copy of this file with a replaced patch body.
    pub fn with_patch(&self, patch: String, truncated: bool) -> Self {
        Self { patch, truncated: self.truncated || truncated, ..self.clone() }
    }
}

/// A commit with its file-level diffs, in diff listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_author")]
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<FileDiff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Commit {
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }

    pub fn header_text(&self) -> String {
        format!(
            "Commit: {}\nAuthor: {}\nDate: {}\nMessage: {}\n",
            self.short_sha(),
            self.author,
            self.timestamp.to_rfc3339(),
            self.message
        )
    }

    /// Copy of this commit carrying a different file list.
    pub fn with_files(&self, files: Vec<FileDiff>) -> Self {
        Self { files, ..self.clone() }
    }

    pub fn is_truncated(&self) -> bool {
        self.files.iter().any(|f| f.truncated)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrStatus::Open => write!(f, "open"),
            PrStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Pull request attached at repository level. Never bucketed or cropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: PrStatus,
    #[serde(default = "default_author")]
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub head_sha: String,
    #[serde(default)]
    pub base_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PullRequest {
    pub fn text(&self) -> String {
        let mut text = format!(
            "PR #{}: {} [{}]\nAuthor: {}\nDate: {}\n",
            self.number,
            self.title,
            self.status,
            self.author,
            self.timestamp.to_rfc3339()
        );
        if !self.base_branch.is_empty() {
            text.push_str(&format!("Base: {}\n", self.base_branch));
        }
        if !self.description.is_empty() {
            text.push_str(&format!("Description: {}\n", self.description));
        }
        text
    }
}

/// Half-open reporting window `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days leading up to `end`.
    pub fn trailing_days(end: DateTime<Utc>, days: u32) -> Self {
        Self { start: end - Duration::days(i64::from(days)), end }
    }

    /// The `days` whole UTC days ending at the first midnight at or after
    /// `end`, so the window touches exactly `days` calendar days.
    pub fn trailing_whole_days(end: DateTime<Utc>, days: u32) -> Self {
        let midnight = end.date_naive().and_time(NaiveTime::MIN).and_utc();
        let end = if midnight == end { end } else { midnight + Duration::days(1) };
        Self::trailing_days(end, days)
    }

    /// Seven midnight-aligned days starting at `monday`.
    pub fn week_starting(monday: NaiveDate) -> Self {
        let start = monday.and_time(NaiveTime::MIN).and_utc();
        Self { start, end: start + Duration::days(7) }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    pub fn start_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Number of UTC calendar days the window touches: 7 for a
    /// midnight-aligned week, 8 for a trailing week starting mid-day.
    pub fn day_count(&self) -> usize {
        if self.end <= self.start {
            return 0;
        }
        let last = (self.end - Duration::nanoseconds(1)).date_naive();
        (last - self.start_day()).num_days() as usize + 1
    }

    /// Calendar-day offset of `timestamp` from the window's first day.
    /// Negative or past-the-end values mean the timestamp is outside.
    pub fn day_offset(&self, timestamp: DateTime<Utc>) -> i64 {
        (timestamp.date_naive() - self.start_day()).num_days()
    }

    pub fn day_at(&self, index: usize) -> NaiveDate {
        self.start_day() + Duration::days(index as i64)
    }
}

/// Tuning knobs for the batching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    /// Ceiling for one generation call. Also the Tier 1 boundary and the
    /// compression target for oversized days.
    pub single_call_limit: usize,
    /// Flush threshold while greedily merging adjacent days.
    pub merge_target: usize,
    /// Total at or above which hybrid compression activates.
    pub mega_threshold: usize,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            single_call_limit: DEFAULT_SINGLE_CALL_LIMIT,
            merge_target: DEFAULT_MERGE_TARGET,
            mega_threshold: DEFAULT_MEGA_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Single,
    DayMerge,
    Hybrid,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Single => write!(f, "Tier 1 (single call)"),
            Tier::DayMerge => write!(f, "Tier 2 (day merge)"),
            Tier::Hybrid => write!(f, "Tier 3 (hybrid compress)"),
        }
    }
}

/// Commits whose UTC date falls on one calendar day of the window, plus the
/// PRs that ride along with that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub day_index: usize,
    pub date: NaiveDate,
    pub commits: Vec<Commit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_requests: Vec<PullRequest>,
}

impl DayBucket {
    pub fn new(day_index: usize, date: NaiveDate) -> Self {
        Self { day_index, date, commits: Vec::new(), pull_requests: Vec::new() }
    }

    /// A bucket without commits never forms a batch, whatever PRs it holds.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Inclusive range of day indices covered by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRange {
    pub start: usize,
    pub end: usize,
}

impl DayRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(day: usize) -> Self {
        Self { start: day, end: day }
    }
}

impl fmt::Display for DayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// One bounded group of commits and PRs destined for a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub ordinal: usize,
    pub day_range: DayRange,
    pub commits: Vec<Commit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_requests: Vec<PullRequest>,
    pub estimated_tokens: usize,
    /// Whether the hierarchical compressor produced this batch.
    #[serde(default)]
    pub compressed: bool,
    pub fingerprint: String,
}

/// The output of planning one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub repository: String,
    pub tier: Tier,
    pub total_tokens: usize,
    pub window: ReportWindow,
    pub budget: TokenBudget,
    pub stats: PlanStats,
    pub batches: Vec<Batch>,
}

impl BatchPlan {
    pub fn commit_count(&self) -> usize {
        self.batches.iter().map(|b| b.commits.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStats {
    pub commits: usize,
    pub pull_requests: usize,
    pub files_kept: usize,
    pub files_dropped_non_code: usize,
    pub files_safety_cropped: usize,
    pub files_budget_cropped: usize,
}

/// One repository's collected activity, as handed over by the collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryActivity {
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,
    /// Opaque repository summary passed through to the payload renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// Activity for many repositories over one shared window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFile {
    pub window: ReportWindow,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryActivity>,
}

/// What to do with a commit timestamped outside the report window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Fail the repository's run.
    #[default]
    Reject,
    /// Move the commit into the nearest valid day bucket.
    Clamp,
}

impl std::str::FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(WindowPolicy::Reject),
            "clamp" => Ok(WindowPolicy::Clamp),
            other => Err(format!("Invalid window policy '{other}': expected reject or clamp")),
        }
    }
}

/// Tool configuration as read from config files, environment and CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub single_call_limit: usize,
    pub merge_target: usize,
    pub mega_threshold: usize,
    pub safety_crop_tokens: usize,
    pub window_days: u32,
    pub out_of_window: WindowPolicy,
    #[serde(deserialize_with = "deserialize_string_list")]
    pub exclude_globs: Vec<String>,
    pub skip_bots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            single_call_limit: DEFAULT_SINGLE_CALL_LIMIT,
            merge_target: DEFAULT_MERGE_TARGET,
            mega_threshold: DEFAULT_MEGA_THRESHOLD,
            safety_crop_tokens: DEFAULT_SAFETY_CROP_TOKENS,
            window_days: DEFAULT_WINDOW_DAYS,
            out_of_window: WindowPolicy::Reject,
            exclude_globs: Vec::new(),
            skip_bots: true,
        }
    }
}

impl Config {
    pub fn budget(&self) -> TokenBudget {
        TokenBudget {
            single_call_limit: self.single_call_limit,
            merge_target: self.merge_target,
            mega_threshold: self.mega_threshold,
        }
    }

    pub fn engine(&self) -> crate::batch::EngineConfig {
        crate::batch::EngineConfig {
            budget: self.budget(),
            safety_crop_tokens: self.safety_crop_tokens,
            window_days: self.window_days,
            window_policy: self.out_of_window,
            exclude_globs: self.exclude_globs.clone(),
        }
    }
}

/// Accept either a list of strings or one comma-separated string.
fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(v) => v,
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

fn default_file_status() -> String {
    "modified".to_string()
}

fn default_author() -> String {
    "Unknown".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}
