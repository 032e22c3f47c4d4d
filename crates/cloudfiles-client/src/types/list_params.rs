//! Listing parameters.

use serde::{Deserialize, Serialize};

/// Paging parameters for account-level listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Maximum number of entries; zero or `None` means the service default.
    pub limit: Option<u32>,
    /// Return entries after this name.
    pub marker: Option<String>,
}

impl ListParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the marker.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(marker) = self.marker.as_deref().filter(|m| !m.is_empty()) {
            pairs.push(("marker", marker.to_owned()));
        }
        pairs
    }
}

/// Paging and filtering parameters for object listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectListParams {
    /// Paging parameters.
    #[serde(flatten)]
    pub page: ListParams,
    /// Only names starting with this prefix.
    pub prefix: Option<String>,
    /// Only names directly under this pseudo-directory.
    pub path: Option<String>,
}

impl ObjectListParams {
    /// Creates empty parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry limit.
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.page.limit = Some(limit);
        self
    }

    /// Sets the marker.
    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.page.marker = Some(marker.into());
        self
    }

    /// Sets the name prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets the pseudo-directory path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.page.query_pairs();
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            pairs.push(("prefix", prefix.to_owned()));
        }
        if let Some(path) = &self.path {
            pairs.push(("path", path.clone()));
        }
        pairs
    }
}
