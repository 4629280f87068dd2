//! File classification helpers for separating code diffs from binary, media and lock files.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Extensions whose diffs carry no reviewable source change.
static NON_CODE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Images
        "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "bmp", "tiff",
        // Video
        "mp4", "avi", "mov", "wmv", "flv", "webm",
        // Audio
        "mp3", "wav", "ogg", "flac",
        // Archives and compiled binaries
        "zip", "tar", "gz", "rar", "7z", "exe", "dll", "so", "dylib",
        // Documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        // Fonts
        "woff", "woff2", "ttf", "eot", "otf",
        // Lock files
        "lock",
    ]
    .into_iter()
    .collect()
});

/// git prints this instead of hunks for binary content.
static BINARY_PATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(Binary files .* differ|GIT binary patch)$").unwrap());

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Lowercased extension of the file name, without the dot.
fn extension(path: &str) -> Option<String> {
    file_name(path).rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check if a path's extension is on the non-code denylist.
///
/// # Arguments
/// * `path` - Repository-relative path from the diff listing
///
/// # Returns
/// `true` for images, video, audio, archives, binaries, documents, fonts and `.lock`
pub fn is_non_code_extension(path: &str) -> bool {
    extension(path).is_some_and(|ext| NON_CODE_EXTENSIONS.contains(ext.as_str()))
}

/// Check if a file is a dependency lock file that lacks a `.lock` extension.
pub fn is_lock_file(path: &str) -> bool {
    matches!(
        file_name(path).to_ascii_lowercase().as_str(),
        "package-lock.json" | "pnpm-lock.yaml" | "npm-shrinkwrap.json" | "go.sum"
    )
}

/// Path-only code classification.
pub fn is_code_path(path: &str) -> bool {
    !is_non_code_extension(path) && !is_lock_file(path)
}

/// Check if a patch body is a binary-file marker rather than a text diff.
pub fn is_binary_patch(patch: &str) -> bool {
    !patch.is_empty() && BINARY_PATCH.is_match(patch)
}
