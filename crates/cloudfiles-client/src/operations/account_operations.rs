//! Account operations.

use std::time::Instant;

use bytes::Bytes;
use cloudfiles_core::{
    Error, Request, RequestShape, Result, Sink, split_lines, validate_container_name,
};
use tracing::{debug, error, info, instrument};
use url::Url;

use super::Container;
use super::status::{listing, unexpected};
use crate::types::{AccountInfo, ContainerInfo, ListParams};
use crate::{Connection, TRACING_TARGET_ACCOUNT, TRACING_TARGET_CONTAINERS};

/// Body format of a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListFormat {
    Text,
    Json,
}

impl Connection {
    /// Returns the container count and bytes used by the account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the storage endpoint does not know the account.
    #[instrument(skip(self), target = TRACING_TARGET_ACCOUNT)]
    pub async fn info(&self) -> Result<AccountInfo> {
        self.retry(move || async move {
            let url = self.endpoints().await.storage_path(None, None)?;
            let request = Request::new(RequestShape::MetadataOnly, url);
            let fields = self.send(request, &mut Sink::discard()).await?;

            match fields.status {
                200..=299 => Ok(AccountInfo::from_fields(&fields)),
                404 => Err(Error::NotFound("Account".into())),
                _ => Err(unexpected(&fields)),
            }
        })
        .await
    }

    /// Lists container names.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS)]
    pub async fn list_containers(&self, params: &ListParams) -> Result<Vec<String>> {
        let body = self
            .storage_listing(None, params.query_pairs(), ListFormat::Text, "Account")
            .await?;
        Ok(split_lines(&body))
    }

    /// Lists containers with their object count and bytes used.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS)]
    pub async fn list_containers_info(&self, params: &ListParams) -> Result<Vec<ContainerInfo>> {
        let body = self
            .storage_listing(None, params.query_pairs(), ListFormat::Json, "Account")
            .await?;

        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Lists containers as handles.
    ///
    /// The handles carry the counts from the listing; their CDN state is not
    /// fetched.
    pub async fn get_containers(&self, params: &ListParams) -> Result<Vec<Container>> {
        let containers = self
            .list_containers_info(params)
            .await?
            .into_iter()
            .map(|info| Container::new(self.clone(), info.name, info.count, info.bytes))
            .collect();

        Ok(containers)
    }

    /// Lists the names of containers published on the CDN.
    ///
    /// # Errors
    ///
    /// Returns `CdnNotEnabled` when the account has no CDN management endpoint.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS)]
    pub async fn list_public_containers(&self) -> Result<Vec<String>> {
        let body = self
            .retry(move || async move {
                let url = self.endpoints().await.cdn_path(None)?;
                let query = vec![("enabled_only", "true".to_owned())];
                self.fetch_listing(url, query, ListFormat::Text, None).await
            })
            .await?;

        Ok(split_lines(&body))
    }

    /// Creates a container, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` for an empty name, a name containing `/` or longer
    /// than 256 bytes.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS, fields(container = %name))]
    pub async fn create_container(&self, name: &str) -> Result<Container> {
        validate_container_name(name)?;

        debug!(
            target: TRACING_TARGET_CONTAINERS,
            container = %name,
            "Creating container"
        );

        let start = Instant::now();
        let result = self
            .retry(move || async move {
                let url = self.endpoints().await.storage_path(Some(name), None)?;
                let request = Request::new(RequestShape::WriteNoBody, url);
                let fields = self.send(request, &mut Sink::discard()).await?;

                match fields.status {
                    201 | 202 => Ok(()),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(()) => {
                info!(
                    target: TRACING_TARGET_CONTAINERS,
                    container = %name,
                    elapsed = ?elapsed,
                    "Container created"
                );
                Ok(Container::new(self.clone(), name.to_owned(), 0, 0))
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_CONTAINERS,
                    container = %name,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to create container"
                );
                Err(e)
            }
        }
    }

    /// Deletes an empty container.
    ///
    /// # Errors
    ///
    /// - `Syntax` for an invalid name, before any request.
    /// - `Conflict` when the container still holds objects.
    /// - `NotFound` when the container does not exist.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS, fields(container = %name))]
    pub async fn delete_container(&self, name: &str) -> Result<()> {
        validate_container_name(name)?;

        let start = Instant::now();
        let result = self
            .retry(move || async move {
                let url = self.endpoints().await.storage_path(Some(name), None)?;
                let request = Request::new(RequestShape::DeleteOrUpdate, url);
                let fields = self.send(request, &mut Sink::discard()).await?;

                match fields.status {
                    204 => Ok(()),
                    409 => Err(Error::Conflict(format!("Container '{name}' is not empty"))),
                    404 => Err(Error::NotFound(format!("Container '{name}'"))),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await;
        let elapsed = start.elapsed();

        match result {
            Ok(()) => {
                info!(
                    target: TRACING_TARGET_CONTAINERS,
                    container = %name,
                    elapsed = ?elapsed,
                    "Container deleted"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_CONTAINERS,
                    container = %name,
                    error = %e,
                    elapsed = ?elapsed,
                    "Failed to delete container"
                );
                Err(e)
            }
        }
    }

    /// Returns a handle to an existing container.
    ///
    /// The CDN state is fetched as well when the account has a CDN endpoint.
    #[instrument(skip(self), target = TRACING_TARGET_CONTAINERS, fields(container = %name))]
    pub async fn get_container(&self, name: &str) -> Result<Container> {
        validate_container_name(name)?;

        let fields = self
            .retry(move || async move {
                let url = self.endpoints().await.storage_path(Some(name), None)?;
                let request = Request::new(RequestShape::MetadataOnly, url);
                let fields = self.send(request, &mut Sink::discard()).await?;

                match fields.status {
                    200..=299 => Ok(fields),
                    404 => Err(Error::NotFound(format!("Container '{name}'"))),
                    _ => Err(unexpected(&fields)),
                }
            })
            .await?;

        let mut container = Container::new(
            self.clone(),
            name.to_owned(),
            fields.container_object_count,
            fields.container_bytes_used,
        );

        if self.endpoints().await.has_cdn() {
            container.refresh_cdn().await?;
        }

        Ok(container)
    }

    /// Fetches a listing under the storage endpoint, retrying once on an
    /// expired token when the policy allows it.
    pub(crate) async fn storage_listing(
        &self,
        container: Option<&str>,
        query: Vec<(&'static str, String)>,
        format: ListFormat,
        not_found: &str,
    ) -> Result<Bytes> {
        let query = &query;
        self.retry(move || async move {
            let url = self.endpoints().await.storage_path(container, None)?;
            self.fetch_listing(url, query.clone(), format, Some(not_found))
                .await
        })
        .await
    }

    async fn fetch_listing(
        &self,
        url: Url,
        query: Vec<(&'static str, String)>,
        format: ListFormat,
        not_found: Option<&str>,
    ) -> Result<Bytes> {
        let mut request = Request::new(RequestShape::Read, url).with_query(query);
        let mut sink = match format {
            ListFormat::Text => Sink::text_list(),
            ListFormat::Json => {
                request = request.with_query([("format", "json".to_owned())]);
                Sink::buffer()
            }
        };

        let fields = self.send(request, &mut sink).await?;
        debug!(
            target: TRACING_TARGET_CONTAINERS,
            status = fields.status,
            bytes = sink.len(),
            "Listing received"
        );

        listing(&fields, sink.into_bytes(), not_found)
    }
}
