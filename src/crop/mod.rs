//! Deterministic prefix cropping for diff text.
//!
//! Two policies share one algorithm. The safety crop runs once per file
//! against a large fixed ceiling to neutralize huge generated or vendored
//! diffs. The budget crop runs inside the hierarchical compressor against a
//! per-file share of a day's budget. Both keep a prefix of the input, append
//! a marker, and guarantee the result estimates to at most the budget, so
//! cropping already-cropped text is a no-op.

use crate::domain::FileDiff;
use crate::utils::{estimate_tokens, max_chars_for_tokens};

pub const SAFETY_MARKER: &str = "\n\n[TRUNCATED: File diff exceeds size limit. The content above represents only the beginning of the changes.]";
pub const BUDGET_MARKER: &str = "\n\n[TRUNCATED: File diff shortened to fit the batch token budget. The content above represents only the beginning of the changes.]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropPolicy {
    Safety,
    Budget,
}

impl CropPolicy {
    pub fn marker(self) -> &'static str {
        match self {
            CropPolicy::Safety => SAFETY_MARKER,
            CropPolicy::Budget => BUDGET_MARKER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cropped {
    pub text: String,
    pub truncated: bool,
}

/// Crop `text` so it estimates to at most `max_tokens`.
///
/// Text that already fits is returned unchanged. Otherwise the longest prefix
/// that leaves room for the policy marker is kept, backed off to the last line
/// break when one exists in the second half of that prefix. When the budget
/// is too small to hold the marker, the bare prefix is returned.
pub fn crop(text: &str, max_tokens: usize, policy: CropPolicy) -> Cropped {
    if estimate_tokens(text) <= max_tokens {
        return Cropped { text: text.to_string(), truncated: false };
    }

    let max_chars = max_chars_for_tokens(max_tokens);
    let marker = policy.marker();
    let marker_chars = marker.chars().count();

    let text = if max_chars > marker_chars {
        let prefix = line_aligned_prefix(text, max_chars - marker_chars).trim_end_matches('\n');
        format!("{prefix}{marker}")
    } else {
        line_aligned_prefix(text, max_chars).to_string()
    };

    Cropped { text, truncated: true }
}

/// Crop a file's patch, returning a new `FileDiff` value.
pub fn crop_file(file: &FileDiff, max_tokens: usize, policy: CropPolicy) -> FileDiff {
    let cropped = crop(&file.patch, max_tokens, policy);
    if !cropped.truncated {
        return file.clone();
    }
    file.with_patch(cropped.text, true)
}

fn line_aligned_prefix(text: &str, keep_chars: usize) -> &str {
    let cut = match text.char_indices().nth(keep_chars) {
        Some((idx, _)) => idx,
        None => return text,
    };
    let prefix = &text[..cut];
    match prefix.rfind('\n') {
        Some(newline) if newline + 1 >= cut / 2 => &prefix[..newline + 1],
        _ => prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff_lines(count: usize) -> String {
        (0..count).map(|i| format!("+let value_{i} = compute({i});\n")).collect()
    }

    #[test]
    fn test_text_within_budget_is_untouched() {
        let text = diff_lines(5);
        let out = crop(&text, 10_000, CropPolicy::Budget);
        assert_eq!(out.text, text);
        assert!(!out.truncated);
    }

    #[test]
    fn test_cropped_text_fits_budget_and_keeps_prefix() {
        let text = diff_lines(2_000);
        let out = crop(&text, 500, CropPolicy::Budget);
        assert!(out.truncated);
        assert!(estimate_tokens(&out.text) <= 500);
        assert!(out.text.ends_with(BUDGET_MARKER));
        let body = out.text.strip_suffix(BUDGET_MARKER).unwrap();
        assert!(text.starts_with(body));
        // Backed off to a whole line.
        assert!(body.ends_with(')') || body.ends_with(';'));
    }

    #[test]
    fn test_crop_is_idempotent() {
        let inputs = [diff_lines(3_000), "x".repeat(50_000), "日本語".repeat(9_000), String::new()];
        for text in &inputs {
            for budget in [0, 1, 10, 37, 500, 30_000] {
                for policy in [CropPolicy::Safety, CropPolicy::Budget] {
                    let once = crop(text, budget, policy);
                    let twice = crop(&once.text, budget, policy);
                    assert_eq!(once.text, twice.text, "budget {budget}");
                    assert!(!twice.truncated);
                }
            }
        }
    }

    #[test]
    fn test_crop_is_deterministic() {
        let text = diff_lines(1_000);
        assert_eq!(crop(&text, 200, CropPolicy::Safety), crop(&text, 200, CropPolicy::Safety));
    }

    #[test]
    fn test_tiny_budget_drops_marker() {
        let out = crop(&"y".repeat(100), 2, CropPolicy::Safety);
        assert!(out.truncated);
        assert_eq!(out.text, "y".repeat(8));
        assert!(estimate_tokens(&out.text) <= 2);
    }

    #[test]
    fn test_crop_file_marks_truncation() {
        let file = FileDiff::new("gen/schema.rs", diff_lines(5_000));
        let cropped = crop_file(&file, 1_000, CropPolicy::Safety);
        assert!(cropped.truncated);
        assert!(cropped.patch.ends_with(SAFETY_MARKER));
        assert_eq!(cropped.path, file.path);
        assert!(!file.truncated);

        let small = FileDiff::new("src/a.rs", "+a");
        assert_eq!(crop_file(&small, 1_000, CropPolicy::Safety), small);
    }
}
