//! diff-batcher: split a week of commit diffs into token-budgeted batches

use anyhow::Result;

fn main() -> Result<()> {
    diff_batcher::cli::run()
}
