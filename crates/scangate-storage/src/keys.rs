//! Shared key validation for storage backends.

use crate::traits::{StorageError, StorageResult};

/// Validate an object key before it reaches a backend.
///
/// Rejects empty keys, a leading `/`, and any empty, `.` or `..` segment.
/// All backends call this so a key accepted by one is accepted by all.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }

    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must not start with '/': {}",
            key
        )));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains an invalid segment: {}",
            key
        )));
    }

    Ok(())
}
