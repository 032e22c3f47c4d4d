//! Container handle: CDN publishing and object management.

use std::time::Instant;

use cloudfiles_core::headers::{
    CDN_ACL_REFERRER, CDN_ACL_USER_AGENT, CDN_ENABLED, CDN_LOG_RETENTION, CDN_TTL, encode_flag,
};
use cloudfiles_core::{
    Error, Method, Request, RequestShape, ResponseFields, Result, Sink, split_lines,
    validate_object_name,
};
use tracing::{debug, error, info, instrument};

use super::Object;
use super::account_operations::ListFormat;
use super::status::unexpected;
use crate::types::{CdnInfo, DEFAULT_CDN_TTL, DIRECTORY_CONTENT_TYPE, ObjectInfo, ObjectListParams};
use crate::{Connection, TRACING_TARGET_CDN, TRACING_TARGET_OBJECTS};

/// A container of the account.
///
/// Handles are snapshots: the object count, bytes used and CDN state are the
/// values seen when the handle was created or last refreshed.
#[derive(Debug, Clone)]
pub struct Container {
    connection: Connection,
    name: String,
    object_count: u64,
    bytes_used: u64,
    cdn: CdnInfo,
}

impl Container {
    pub(crate) fn new(
        connection: Connection,
        name: String,
        object_count: u64,
        bytes_used: u64,
    ) -> Self {
        Self {
            connection,
            name,
            object_count,
            bytes_used,
            cdn: CdnInfo::default(),
        }
    }

    /// Returns the container name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn object_count(&self) -> u64 {
        self.object_count
    }

    #[inline]
    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }

    /// Returns the last known CDN state.
    #[inline]
    pub fn cdn(&self) -> &CdnInfo {
        &self.cdn
    }

    /// Returns the connection this handle was obtained from.
    #[inline]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns whether the container is published on the CDN.
    #[inline]
    pub fn is_public(&self) -> bool {
        self.cdn.enabled
    }

    /// Fetches the CDN state of the container.
    ///
    /// A container that was never published reports the default state.
    ///
    /// # Errors
    ///
    /// Returns `CdnNotEnabled` when the account has no CDN management endpoint.
    #[instrument(skip(self), target = TRACING_TARGET_CDN, fields(container = %self.name))]
    pub async fn refresh_cdn(&mut self) -> Result<&CdnInfo> {
        let this = &*self;
        let cdn = this
            .connection
            .retry(move || async move {
                let fields = this.cdn_request(Method::Head, Vec::new()).await?;
                match fields.status {
                    200..=299 => Ok(CdnInfo::from_fields(&fields)),
                    404 => Ok(CdnInfo::default()),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await?;

        debug!(
            target: TRACING_TARGET_CDN,
            container = %self.name,
            enabled = cdn.enabled,
            "CDN state refreshed"
        );
        self.cdn = cdn;
        Ok(&self.cdn)
    }

    /// Publishes the container on the CDN and returns its public URI.
    ///
    /// An already published container has its TTL updated; when the service
    /// no longer knows it, it is enabled again. `ttl` defaults to
    /// [`DEFAULT_CDN_TTL`].
    #[instrument(skip(self), target = TRACING_TARGET_CDN, fields(container = %self.name))]
    pub async fn make_public(&mut self, ttl: Option<u64>) -> Result<String> {
        let ttl = ttl.unwrap_or(DEFAULT_CDN_TTL);
        let update = CdnInfo {
            ttl,
            ..self.cdn.clone()
        };

        let this = &*self;
        let settings = &update;
        let start = Instant::now();
        let result = this
            .connection
            .retry(move || async move {
                let fields = if this.cdn.is_published() {
                    let fields = this
                        .cdn_request(Method::Post, cdn_settings(settings))
                        .await?;
                    match fields.status {
                        404 => this.cdn_enable(ttl).await?,
                        _ => fields,
                    }
                } else {
                    this.cdn_enable(ttl).await?
                };

                match fields.status {
                    201 | 202 => Ok(fields),
                    404 => Err(Error::NotFound(this.not_found())),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await;
        let elapsed = start.elapsed();

        let fields = match result {
            Ok(fields) => fields,
            Err(e) => {
                error!(
                    target: TRACING_TARGET_CDN,
                    container = %self.name,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to publish container"
                );
                return Err(e);
            }
        };

        let Some(uri) = fields.cdn_uri.clone().or_else(|| self.cdn.uri.clone()) else {
            return Err(Error::invalid_response(
                fields.status,
                "CDN URI missing from response",
            ));
        };

        info!(
            target: TRACING_TARGET_CDN,
            container = %self.name,
            uri = %uri,
            ttl,
            elapsed = ?elapsed,
            "Container published"
        );

        // A fresh publication starts without ACLs or log retention.
        self.cdn = CdnInfo {
            enabled: true,
            uri: Some(uri.clone()),
            ttl,
            ..CdnInfo::default()
        };
        Ok(uri)
    }

    /// Stops publishing the container on the CDN.
    ///
    /// Already cached copies stay reachable until their TTL expires.
    #[instrument(skip(self), target = TRACING_TARGET_CDN, fields(container = %self.name))]
    pub async fn make_private(&mut self) -> Result<()> {
        let headers = vec![(CDN_ENABLED, encode_flag(false).to_owned())];
        self.cdn_update(headers).await?;

        info!(
            target: TRACING_TARGET_CDN,
            container = %self.name,
            "Container unpublished"
        );
        self.cdn = CdnInfo::default();
        Ok(())
    }

    /// Restricts CDN access to user agents matching `acl`.
    pub async fn set_acl_user_agent(&mut self, acl: &str) -> Result<()> {
        let next = CdnInfo {
            acl_user_agent: Some(acl.to_owned()),
            ..self.cdn.clone()
        };
        self.apply_cdn_settings(next).await
    }

    /// Restricts CDN access to referrers matching `acl`.
    pub async fn set_acl_referrer(&mut self, acl: &str) -> Result<()> {
        let next = CdnInfo {
            acl_referrer: Some(acl.to_owned()),
            ..self.cdn.clone()
        };
        self.apply_cdn_settings(next).await
    }

    /// Enables or disables CDN access log retention.
    pub async fn set_log_retention(&mut self, enabled: bool) -> Result<()> {
        let next = CdnInfo {
            log_retention: enabled,
            ..self.cdn.clone()
        };
        self.apply_cdn_settings(next).await
    }

    /// Returns a handle for a new object; nothing is sent until it is written.
    pub fn create_object(&self, name: &str) -> Result<Object> {
        validate_object_name(name)?;
        Ok(Object::new(self.clone(), name.to_owned()))
    }

    /// Returns a handle to an existing object, with its metadata loaded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the object does not exist.
    pub async fn get_object(&self, name: &str) -> Result<Object> {
        let mut object = self.create_object(name)?;
        object.refresh().await?;
        Ok(object)
    }

    /// Lists object names.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(container = %self.name))]
    pub async fn list_objects(&self, params: &ObjectListParams) -> Result<Vec<String>> {
        let body = self
            .connection
            .storage_listing(
                Some(&self.name),
                params.query_pairs(),
                ListFormat::Text,
                &self.not_found(),
            )
            .await?;
        Ok(split_lines(&body))
    }

    /// Lists objects with their hash, size, content type and modification
    /// time.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(container = %self.name))]
    pub async fn list_objects_info(&self, params: &ObjectListParams) -> Result<Vec<ObjectInfo>> {
        let body = self
            .connection
            .storage_listing(
                Some(&self.name),
                params.query_pairs(),
                ListFormat::Json,
                &self.not_found(),
            )
            .await?;

        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Lists objects as handles populated from the listing.
    pub async fn get_objects(&self, params: &ObjectListParams) -> Result<Vec<Object>> {
        let objects = self
            .list_objects_info(params)
            .await?
            .into_iter()
            .map(|info| Object::from_info(self.clone(), info))
            .collect();

        Ok(objects)
    }

    /// Deletes an object.
    #[instrument(skip(self), target = TRACING_TARGET_OBJECTS, fields(container = %self.name, object = %name))]
    pub async fn delete_object(&self, name: &str) -> Result<()> {
        validate_object_name(name)?;

        let connection = &self.connection;
        connection
            .retry(move || async move {
                let url = connection
                    .endpoints()
                    .await
                    .storage_path(Some(&self.name), Some(name))?;
                let request = Request::new(RequestShape::DeleteOrUpdate, url);
                let fields = connection.send(request, &mut Sink::discard()).await?;

                match fields.status {
                    204 => Ok(()),
                    404 => Err(Error::NotFound(format!("Object '{}/{name}'", self.name))),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await?;

        info!(
            target: TRACING_TARGET_OBJECTS,
            container = %self.name,
            object = %name,
            "Object deleted"
        );
        Ok(())
    }

    /// Creates a directory marker object for every parent prefix of `path`.
    ///
    /// `photos/2024/pic.jpg` creates `photos` and `photos/2024`; the last
    /// element is left alone. Returns the names of the created markers.
    pub async fn create_paths(&self, path: &str) -> Result<Vec<String>> {
        let mut created = Vec::new();
        let Some((parents, _)) = path.rsplit_once('/') else {
            return Ok(created);
        };

        let mut prefix = String::new();
        for element in parents.split('/').filter(|element| !element.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(element);

            let mut marker = self.create_object(&prefix)?;
            marker.set_content_type(DIRECTORY_CONTENT_TYPE);
            marker.write(".", false).await?;
            created.push(prefix.clone());
        }

        Ok(created)
    }

    fn not_found(&self) -> String {
        format!("Container '{}'", self.name)
    }

    async fn apply_cdn_settings(&mut self, next: CdnInfo) -> Result<()> {
        self.cdn_update(cdn_settings(&next)).await?;

        debug!(
            target: TRACING_TARGET_CDN,
            container = %self.name,
            "CDN settings updated"
        );
        self.cdn = next;
        Ok(())
    }

    async fn cdn_update(&self, headers: Vec<(&'static str, String)>) -> Result<()> {
        let headers = &headers;
        self.connection
            .retry(move || async move {
                let fields = self.cdn_request(Method::Post, headers.clone()).await?;
                match fields.status {
                    202 => Ok(()),
                    404 => Err(Error::NotFound(self.not_found())),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await
    }

    async fn cdn_enable(&self, ttl: u64) -> Result<ResponseFields> {
        let headers = vec![
            (CDN_ENABLED, encode_flag(true).to_owned()),
            (CDN_TTL, ttl.to_string()),
        ];
        self.cdn_request(Method::Put, headers).await
    }

    async fn cdn_request(
        &self,
        method: Method,
        headers: Vec<(&'static str, String)>,
    ) -> Result<ResponseFields> {
        let url = self.connection.endpoints().await.cdn_path(Some(&self.name))?;
        let shape = match method {
            Method::Head => RequestShape::MetadataOnly,
            Method::Put => RequestShape::WriteNoBody,
            _ => RequestShape::DeleteOrUpdate,
        };

        let request = Request::new(shape, url)
            .with_method(method)
            .with_headers(headers);
        self.connection.send(request, &mut Sink::discard()).await
    }
}

/// Headers carrying the full CDN configuration of a published container.
///
/// A zero TTL means the handle never loaded its CDN state, so the service
/// keeps its current value.
fn cdn_settings(cdn: &CdnInfo) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        (CDN_ENABLED, encode_flag(true).to_owned()),
        (CDN_LOG_RETENTION, encode_flag(cdn.log_retention).to_owned()),
    ];
    if cdn.ttl > 0 {
        headers.push((CDN_TTL, cdn.ttl.to_string()));
    }
    if let Some(acl) = &cdn.acl_user_agent {
        headers.push((CDN_ACL_USER_AGENT, acl.clone()));
    }
    if let Some(acl) = &cdn.acl_referrer {
        headers.push((CDN_ACL_REFERRER, acl.clone()));
    }
    headers
}
