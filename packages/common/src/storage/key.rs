use super::error::StorageError;

/// Checks if a path string contains path traversal components.
fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
}

/// Validates an object key (a slash-separated virtual path).
///
/// Returns the trimmed key. Keys must be relative, free of traversal and
/// hidden segments, and restricted to a filesystem-safe character set so
/// every backend can map them to paths directly.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    let trimmed = key.trim();

    if trimmed.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".into()));
    }

    if trimmed.len() > 512 {
        return Err(StorageError::InvalidKey(
            "key exceeds maximum length of 512 characters".into(),
        ));
    }

    if trimmed.contains('\0') {
        return Err(StorageError::InvalidKey(
            "key must not contain null bytes".into(),
        ));
    }

    if trimmed.contains('\\') {
        return Err(StorageError::InvalidKey(
            "key must not contain backslashes".into(),
        ));
    }

    if trimmed.starts_with('/') || trimmed.ends_with('/') {
        return Err(StorageError::InvalidKey(
            "key must not start or end with '/'".into(),
        ));
    }

    if trimmed.contains("//") {
        return Err(StorageError::InvalidKey(
            "key must not contain consecutive slashes".into(),
        ));
    }

    if contains_path_traversal(trimmed) {
        return Err(StorageError::InvalidKey(
            "key must not contain '..' traversal".into(),
        ));
    }

    for segment in trimmed.split('/') {
        if segment.starts_with('.') {
            return Err(StorageError::InvalidKey(
                "key segments must not start with '.'".into(),
            ));
        }
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidKey(
            "key contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)".into(),
        ));
    }

    Ok(trimmed)
}
