//! Path normalization

/// Convert backslashes to forward slashes so diff paths match glob patterns
/// the same way on every platform.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}
