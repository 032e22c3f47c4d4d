//! Storage and CDN endpoints and request path building.

use url::Url;

use crate::{Error, Result};

/// Effective endpoints of an authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    storage: Option<Url>,
    cdn: Option<Url>,
}

impl Endpoints {
    /// Creates endpoints from optional storage and CDN URLs.
    pub fn new(storage: Option<Url>, cdn: Option<Url>) -> Self {
        Self { storage, cdn }
    }

    /// Returns whether no endpoint is known yet.
    pub fn is_empty(&self) -> bool {
        self.storage.is_none() && self.cdn.is_none()
    }

    /// Returns the storage endpoint.
    pub fn storage(&self) -> Result<&Url> {
        self.storage.as_ref().ok_or_else(|| {
            Error::Authentication("Not authenticated: no storage endpoint available".into())
        })
    }

    /// Returns the CDN management endpoint.
    pub fn cdn(&self) -> Result<&Url> {
        self.cdn.as_ref().ok_or_else(|| {
            Error::CdnNotEnabled("Account has no CDN management endpoint".into())
        })
    }

    /// Returns whether a CDN management endpoint is known.
    pub fn has_cdn(&self) -> bool {
        self.cdn.is_some()
    }

    /// Builds a storage URL for an account, container or object.
    pub fn storage_path(&self, container: Option<&str>, object: Option<&str>) -> Result<Url> {
        join_path(self.storage()?, container, object)
    }

    /// Builds a CDN management URL for the account or a container.
    pub fn cdn_path(&self, container: Option<&str>) -> Result<Url> {
        join_path(self.cdn()?, container, None)
    }
}

/// Appends a container and an object name to a base URL.
///
/// The container becomes a single percent-encoded path segment. The object
/// name is split on `/` and each part encoded separately, so pseudo-directory
/// separators survive.
pub fn join_path(base: &Url, container: Option<&str>, object: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Syntax(format!("Endpoint '{base}' cannot be a base URL")))?;
        segments.pop_if_empty();

        if let Some(container) = container {
            segments.push(container);
            if let Some(object) = object {
                segments.extend(object.split('/'));
            }
        }
    }
    Ok(url)
}
