use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Result of validating an uploaded filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
    /// Filename exceeds 255 characters.
    TooLong,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::TooLong => "Filename must be at most 255 characters",
        }
    }
}

/// Validates an uploaded filename (no directory components allowed).
pub fn validate_original_name(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.chars().count() > 255 {
        return Err(FilenameError::TooLong);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Reduce a filename stem to storage-safe characters: lowercase
/// alphanumerics, `-` and `_`; everything else becomes `_`. Capped at 64
/// characters; an empty result becomes `file`.
fn sanitize_stem(stem: &str) -> String {
    let sanitized: String = stem
        .chars()
        .take(64)
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '_') {
        "file".to_string()
    } else {
        sanitized
    }
}

/// Extension of a filename, sanitized to lowercase alphanumerics and capped
/// at 16 characters.
fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Generate a collision-resistant stored name for an uploaded file:
/// sanitized stem, UTC timestamp, and a random suffix, keeping the
/// original extension.
pub fn generate_stored_name(original: &str, now: DateTime<Utc>) -> String {
    let (stem, ext) = match original.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (original, None),
    };

    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase();

    let base = format!(
        "{}_{}_{}",
        sanitize_stem(stem),
        now.format("%Y%m%d%H%M%S"),
        suffix
    );

    match ext.map(sanitize_extension) {
        Some(ext) if !ext.is_empty() => format!("{base}.{ext}"),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_normal_names() {
        assert!(validate_original_name("resume.pdf").is_ok());
        assert!(validate_original_name("Design Mockup (v2).png").is_ok());
        assert!(validate_original_name("  padded.txt  ").is_ok());
    }

    #[test]
    fn validate_rejects_bad_names() {
        assert!(matches!(
            validate_original_name(""),
            Err(FilenameError::Empty)
        ));
        assert!(matches!(
            validate_original_name("a/b.txt"),
            Err(FilenameError::ContainsPathSeparator)
        ));
        assert!(matches!(
            validate_original_name(".."),
            Err(FilenameError::PathTraversal)
        ));
        assert!(matches!(
            validate_original_name(".hidden"),
            Err(FilenameError::Hidden)
        ));
        assert!(matches!(
            validate_original_name("a\r\nb.txt"),
            Err(FilenameError::ControlCharacter)
        ));
        assert!(matches!(
            validate_original_name("a\0b"),
            Err(FilenameError::NullByte)
        ));
        let long = format!("{}.txt", "a".repeat(300));
        assert!(matches!(
            validate_original_name(&long),
            Err(FilenameError::TooLong)
        ));
    }

    #[test]
    fn stored_name_keeps_extension_and_is_safe() {
        let now = Utc::now();
        let name = generate_stored_name("My Résumé (final).PDF", now);
        assert!(name.ends_with(".pdf"));
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        );
    }

    #[test]
    fn stored_names_differ_for_same_input() {
        let now = Utc::now();
        let a = generate_stored_name("file.txt", now);
        let b = generate_stored_name("file.txt", now);
        assert_ne!(a, b);
    }

    #[test]
    fn stored_name_handles_missing_extension() {
        let now = Utc::now();
        let name = generate_stored_name("README", now);
        assert!(!name.contains('.'));
        assert!(name.starts_with("readme_"));
    }

    #[test]
    fn stored_name_handles_all_symbol_stem() {
        let now = Utc::now();
        let name = generate_stored_name("???.png", now);
        assert!(name.starts_with("file"));
        assert!(name.ends_with(".png"));
    }
}
