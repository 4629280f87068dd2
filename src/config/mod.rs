//! Budget and window settings
//!
//! A `diff-batcher.toml` (or YAML) file sets the defaults, `DIFF_BATCHER_*`
//! variables override the file, and command-line flags override both.

pub mod loader;
pub mod merge;

pub use loader::{load_config, load_file_config, ENV_PREFIX};
pub use merge::{merge_cli_with_config, CliOverrides};
