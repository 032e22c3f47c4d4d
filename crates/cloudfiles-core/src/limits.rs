//! Service-imposed limits and the name checks built on them.

use crate::{Error, Result};

/// Maximum container name length in bytes.
pub const MAX_CONTAINER_NAME_LEN: usize = 256;

/// Maximum object name length in bytes.
pub const MAX_OBJECT_NAME_LEN: usize = 1024;

/// Maximum object size in bytes (5 GiB + 1).
pub const MAX_OBJECT_SIZE: u64 = 5 * 1024 * 1024 * 1024 + 1;

/// Maximum metadata key length in bytes.
pub const MAX_META_KEY_LEN: usize = 128;

/// Maximum metadata value length in bytes.
pub const MAX_META_VALUE_LEN: usize = 256;

/// Validates a container name.
///
/// Names must be non-empty, must not contain `/` and must fit in
/// [`MAX_CONTAINER_NAME_LEN`] bytes.
pub fn validate_container_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Syntax("Container name cannot be empty".into()));
    }

    if name.contains('/') {
        return Err(Error::Syntax(format!(
            "Container name '{name}' cannot contain a '/' character"
        )));
    }

    if name.len() > MAX_CONTAINER_NAME_LEN {
        return Err(Error::Syntax(format!(
            "Container name exceeds {MAX_CONTAINER_NAME_LEN} bytes ({} bytes)",
            name.len()
        )));
    }

    Ok(())
}

/// Validates an object name.
///
/// Names must be non-empty, must not start with `/` and must fit in
/// [`MAX_OBJECT_NAME_LEN`] bytes. Inner `/` characters are allowed and act as
/// pseudo-directory separators.
pub fn validate_object_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Syntax("Object name cannot be empty".into()));
    }

    if name.starts_with('/') {
        return Err(Error::Syntax(format!(
            "Object name '{name}' cannot begin with a '/' character"
        )));
    }

    if name.len() > MAX_OBJECT_NAME_LEN {
        return Err(Error::Syntax(format!(
            "Object name exceeds {MAX_OBJECT_NAME_LEN} bytes ({} bytes)",
            name.len()
        )));
    }

    Ok(())
}

/// Validates an object payload size.
pub fn validate_object_size(size: u64) -> Result<()> {
    if size > MAX_OBJECT_SIZE {
        return Err(Error::Syntax(format!(
            "Object size {size} exceeds the maximum of {MAX_OBJECT_SIZE} bytes"
        )));
    }
    Ok(())
}
