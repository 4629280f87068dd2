//! Shared CLI utilities.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::{load_config, merge_cli_with_config, CliOverrides};
use crate::domain::{Config, WindowPolicy};

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

pub fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp such as 2024-01-22T00:00:00Z ({e})"))
}

/// Budget and filter flags shared by `plan` and `render`.
#[derive(Args, Debug, Clone, Default)]
pub struct BudgetArgs {
    /// Config file path (default: auto-discover diff-batcher.toml/.yaml in the current directory)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Token ceiling for one generation call
    #[arg(long, value_name = "TOKENS")]
    pub single_call_limit: Option<usize>,

    /// Flush threshold when merging adjacent days
    #[arg(long, value_name = "TOKENS")]
    pub merge_target: Option<usize>,

    /// Window total at which oversized days get compressed
    #[arg(long, value_name = "TOKENS")]
    pub mega_threshold: Option<usize>,

    /// Per-file cap applied before any budgeting
    #[arg(long, value_name = "TOKENS")]
    pub safety_crop_tokens: Option<usize>,

    /// Longest accepted report window, in days
    #[arg(long, value_name = "DAYS")]
    pub window_days: Option<u32>,

    /// What to do with commits outside the window: reject or clamp
    #[arg(long, value_name = "POLICY")]
    pub out_of_window: Option<WindowPolicy>,

    /// Extra paths to treat as non-code (comma-separated globs)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude_glob: Option<String>,
}

impl BudgetArgs {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            single_call_limit: self.single_call_limit,
            merge_target: self.merge_target,
            mega_threshold: self.mega_threshold,
            safety_crop_tokens: self.safety_crop_tokens,
            window_days: self.window_days,
            out_of_window: self.out_of_window,
            exclude_globs: parse_csv(&self.exclude_glob),
            include_bots: false,
        }
    }
}

/// File and environment config from the working directory, with `overrides`
/// applied last.
pub fn resolve_config(config_path: Option<&Path>, overrides: CliOverrides) -> Result<Config> {
    let cwd = std::env::current_dir().context("Cannot determine current directory")?;
    let file_config = load_config(&cwd, config_path)?;
    Ok(merge_cli_with_config(file_config, overrides))
}

/// Directory-safe form of a repository name such as `owner/repo`.
pub fn sanitize_repo_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
