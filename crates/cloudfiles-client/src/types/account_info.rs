use cloudfiles_core::ResponseFields;
use serde::{Deserialize, Serialize};

/// Container count and storage usage of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Number of containers.
    pub container_count: u64,
    /// Total bytes stored.
    pub bytes_used: u64,
}

impl AccountInfo {
    pub(crate) fn from_fields(fields: &ResponseFields) -> Self {
        Self {
            container_count: fields.account_container_count,
            bytes_used: fields.account_bytes_used,
        }
    }
}
