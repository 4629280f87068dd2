//! Activity input (JSON activity files, local git history)

pub mod activity;
pub mod bots;
pub mod local;

pub use activity::{load_activity, write_activity};
pub use bots::is_bot_author;
pub use local::{collect_local, open_repository, repository_name, CollectOptions};
