//! Per-call response fields.

use crate::{Error, Metadata};

/// Structured view of a single response.
///
/// A fresh value is produced for every request; nothing carries over between
/// calls. Numeric fields default to zero when the service omits them, which it
/// does for empty accounts and containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFields {
    /// HTTP status code of the last response acted upon.
    pub status: u16,
    /// Reason phrase of the last response acted upon.
    pub reason: String,

    /// `X-Account-Container-Count`.
    pub account_container_count: u64,
    /// `X-Account-Bytes-Used`.
    pub account_bytes_used: u64,
    /// `X-Container-Object-Count`.
    pub container_object_count: u64,
    /// `X-Container-Bytes-Used`.
    pub container_bytes_used: u64,

    /// `ETag`.
    pub etag: Option<String>,
    /// `Last-Modified`.
    pub last_modified: Option<String>,
    /// `Content-Type`.
    pub content_type: Option<String>,
    /// `Content-Length`.
    pub content_length: Option<u64>,
    /// `X-Object-Meta-*` entries with the prefix stripped.
    pub metadata: Metadata,

    /// `X-CDN-Enabled`.
    pub cdn_enabled: bool,
    /// `X-CDN-URI`.
    pub cdn_uri: Option<String>,
    /// `X-TTL`.
    pub cdn_ttl: u64,
    /// `X-Log-Retention`.
    pub cdn_log_retention: bool,
    /// `X-User-Agent-ACL`.
    pub cdn_acl_user_agent: Option<String>,
    /// `X-Referrer-ACL`.
    pub cdn_acl_referrer: Option<String>,

    /// `X-Storage-Url`, authentication responses only.
    pub storage_url: Option<String>,
    /// `X-CDN-Management-Url`, authentication responses only.
    pub cdn_management_url: Option<String>,
    /// `X-Auth-Token` or `X-Storage-Token`, authentication responses only.
    pub auth_token: Option<String>,
}

impl ResponseFields {
    /// Creates empty fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates fields carrying only a status line.
    pub fn with_status(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// Returns whether the status is in the 2xx range.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Builds the error reported when the status is outside the expected set.
    pub fn invalid_response(&self) -> Error {
        Error::invalid_response(self.status, self.reason.clone())
    }
}
