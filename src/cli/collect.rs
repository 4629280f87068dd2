//! Collect command implementation

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::utils::{parse_rfc3339, resolve_config};
use crate::config::CliOverrides;
use crate::domain::{ActivityFile, ReportWindow};
use crate::fetch::{collect_local, open_repository, repository_name, write_activity, CollectOptions};

#[derive(Args)]
pub struct CollectArgs {
    /// Local repository path
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Length of the trailing window in days (default: window_days from config)
    #[arg(short, long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// End of the window, exclusive; rounded up to the next UTC midnight (default: now)
    #[arg(long, value_name = "RFC3339", value_parser = parse_rfc3339)]
    pub end: Option<DateTime<Utc>>,

    /// Name to record the repository under (default: its directory name)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Write the activity file here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep commits authored by bots
    #[arg(long)]
    pub include_bots: bool,

    /// Config file path
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: CollectArgs) -> Result<()> {
    let overrides = CliOverrides { window_days: args.days, include_bots: args.include_bots, ..CliOverrides::default() };
    let config = resolve_config(args.config.as_deref(), overrides)?;

    if config.window_days == 0 {
        anyhow::bail!("Window must span at least one day");
    }
    let end = args.end.unwrap_or_else(Utc::now);
    let window = ReportWindow::trailing_whole_days(end, config.window_days);

    let repo = open_repository(&args.path)?;
    let name = args.name.clone().unwrap_or_else(|| repository_name(&repo));
    let activity = collect_local(&repo, &CollectOptions { window, skip_bots: config.skip_bots })?;
    let commit_count = activity.commits.len();

    let mut repositories = BTreeMap::new();
    repositories.insert(name.clone(), activity);
    let file = ActivityFile { window, repositories };

    match &args.output {
        Some(path) => {
            write_activity(path, &file)?;
            eprintln!("{}: collected {} commits into {}", name, commit_count, path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&file)?),
    }
    Ok(())
}
