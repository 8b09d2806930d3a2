//! Centralized validation and helper functions.

/// Maximum size of a snapshot document (DOS protection)
pub const MAX_SNAPSHOT_BYTES: u64 = 16 * 1024 * 1024;

/// Maximum length of a single line or match identifier
pub const MAX_ID_LENGTH: usize = 64;

/// Validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Identifier is empty")]
    EmptyId,
    #[error("Identifier too long: exceeds {MAX_ID_LENGTH} characters")]
    IdTooLong,
    #[error("Identifier contains control characters")]
    InvalidId,
    #[error("Snapshot too large: {0} bytes exceeds maximum of {MAX_SNAPSHOT_BYTES}")]
    SnapshotTooLarge(u64),
}

/// Validate and normalize a server-assigned identifier.
///
/// Surrounding whitespace is trimmed. The result must be non-empty, free of
/// control characters, and at most [`MAX_ID_LENGTH`] characters long.
///
/// # Examples
///
/// ```
/// use bankrec::utils::validation::normalize_id;
///
/// assert_eq!(normalize_id(" 42 ").unwrap(), "42");
/// assert!(normalize_id("").is_err());
/// assert!(normalize_id("4\n2").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::EmptyId`, `ValidationError::IdTooLong` or
/// `ValidationError::InvalidId`.
pub fn normalize_id(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if trimmed.chars().count() > MAX_ID_LENGTH {
        return Err(ValidationError::IdTooLong);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidId);
    }
    Ok(trimmed.to_string())
}

/// Check a snapshot size before reading it into memory.
///
/// # Errors
///
/// Returns `ValidationError::SnapshotTooLarge` when `len` exceeds the limit.
pub fn check_snapshot_size(len: u64) -> Result<(), ValidationError> {
    if len > MAX_SNAPSHOT_BYTES {
        Err(ValidationError::SnapshotTooLarge(len))
    } else {
        Ok(())
    }
}
