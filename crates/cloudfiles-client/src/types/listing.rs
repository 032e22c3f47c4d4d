//! JSON listing entries.

use serde::{Deserialize, Serialize};

/// Container entry of a `format=json` account listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Container name.
    pub name: String,
    /// Number of objects.
    #[serde(default)]
    pub count: u64,
    /// Bytes stored.
    #[serde(default)]
    pub bytes: u64,
}

/// Object entry of a `format=json` container listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object name.
    pub name: String,
    /// MD5 of the content.
    #[serde(default)]
    pub hash: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub bytes: u64,
    /// Content type.
    #[serde(default)]
    pub content_type: Option<String>,
    /// Last modification time as reported by the service.
    #[serde(default)]
    pub last_modified: Option<String>,
}
