//! Stable hashing for batch fingerprints

use crate::domain::{Commit, DayRange};
use sha2::{Digest, Sha256};

pub fn batch_fingerprint(ordinal: usize, day_range: DayRange, commits: &[Commit]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{ordinal}:{}-{}:", day_range.start, day_range.end).as_bytes());
    for commit in commits {
        hasher.update(commit.sha.as_bytes());
        hasher.update(b"\n");
    }
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
