//! CDN publishing state of a container.

use cloudfiles_core::ResponseFields;
use serde::{Deserialize, Serialize};

/// Default CDN cache TTL: one day.
pub const DEFAULT_CDN_TTL: u64 = 86_400;

/// CDN publishing state of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnInfo {
    /// Whether the container is served through the CDN.
    pub enabled: bool,
    /// Public CDN URI.
    pub uri: Option<String>,
    /// Cache TTL in seconds.
    pub ttl: u64,
    /// Whether CDN access logs are kept.
    pub log_retention: bool,
    /// User-agent access control string.
    pub acl_user_agent: Option<String>,
    /// Referrer access control string.
    pub acl_referrer: Option<String>,
}

impl CdnInfo {
    pub(crate) fn from_fields(fields: &ResponseFields) -> Self {
        Self {
            enabled: fields.cdn_enabled,
            uri: fields.cdn_uri.clone(),
            ttl: fields.cdn_ttl,
            log_retention: fields.cdn_log_retention,
            acl_user_agent: fields.cdn_acl_user_agent.clone(),
            acl_referrer: fields.cdn_acl_referrer.clone(),
        }
    }

    /// Returns whether the container has been published before.
    #[inline]
    pub fn is_published(&self) -> bool {
        self.uri.is_some()
    }
}
