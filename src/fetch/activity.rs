//! Activity file loading and saving

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::ActivityFile;

pub fn load_activity(path: &Path) -> Result<ActivityFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read activity file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse activity file: {}", path.display()))
}

pub fn write_activity(path: &Path, activity: &ActivityFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(activity)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write activity file: {}", path.display()))
}
