//! CLI overrides on top of file and environment config

use crate::domain::{Config, WindowPolicy};

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub single_call_limit: Option<usize>,
    pub merge_target: Option<usize>,
    pub mega_threshold: Option<usize>,
    pub safety_crop_tokens: Option<usize>,
    pub window_days: Option<u32>,
    pub out_of_window: Option<WindowPolicy>,
    /// Appended to the configured globs rather than replacing them.
    pub exclude_globs: Option<Vec<String>>,
    pub include_bots: bool,
}

pub fn merge_cli_with_config(mut config: Config, cli: CliOverrides) -> Config {
    if let Some(v) = cli.single_call_limit {
        config.single_call_limit = v;
    }
    if let Some(v) = cli.merge_target {
        config.merge_target = v;
    }
    if let Some(v) = cli.mega_threshold {
        config.mega_threshold = v;
    }
    if let Some(v) = cli.safety_crop_tokens {
        config.safety_crop_tokens = v;
    }
    if let Some(v) = cli.window_days {
        config.window_days = v;
    }
    if let Some(v) = cli.out_of_window {
        config.out_of_window = v;
    }
    if let Some(globs) = cli.exclude_globs {
        for glob in globs {
            if !config.exclude_globs.contains(&glob) {
                config.exclude_globs.push(glob);
            }
        }
    }
    if cli.include_bots {
        config.skip_bots = false;
    }
    config
}
