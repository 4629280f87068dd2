//! Shared helpers: token estimation, file classification, hashing, paths.

pub mod classify;
pub mod hashing;
pub mod paths;
pub mod tokens;

pub use classify::{is_binary_patch, is_code_path, is_lock_file, is_non_code_extension};
pub use hashing::batch_fingerprint;
pub use paths::normalize_path;
pub use tokens::{
    estimate_bucket_tokens, estimate_commit_tokens, estimate_commits_tokens, estimate_file_tokens,
    estimate_pr_tokens, estimate_prs_tokens, estimate_tokens, max_chars_for_tokens, CHARS_PER_TOKEN,
};

/// Format an integer with thousands separators (e.g. `123456` -> `123,456`).
pub fn format_with_commas(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
