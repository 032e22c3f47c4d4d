//! Transport contract between the operation layer and an HTTP implementation.

use crate::{AuthRequest, AuthSession, Endpoints, ProgressFn, Request, ResponseFields, Result, Sink};

/// The component that speaks HTTP for every account, container, object and
/// CDN operation.
///
/// Implementations never retry and never interpret statuses beyond decoding
/// them into [`ResponseFields`]; mapping statuses to errors is the caller's
/// job. A failure to obtain any response must be reported as
/// [`Error::Transport`](crate::Error::Transport).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request on the pooled connection for its shape.
    ///
    /// The session token and user agent headers are added when the caller did
    /// not set them. The response body, if any, is written into `sink`.
    async fn send(&self, request: Request, sink: &mut Sink<'_>) -> Result<ResponseFields>;

    /// Runs the authentication exchange outside the connection pool.
    async fn authenticate(&self, request: AuthRequest) -> Result<ResponseFields>;

    /// Installs the token and endpoints used by every later request.
    ///
    /// With `use_internal_network` the storage endpoint is rewritten to the
    /// provider's internal network host.
    async fn set_credentials(&self, session: &AuthSession, use_internal_network: bool);

    /// Returns the endpoints installed by [`Transport::set_credentials`].
    async fn endpoints(&self) -> Endpoints;

    /// Returns whether a token and an endpoint have been installed.
    async fn is_authenticated(&self) -> bool;

    /// Releases every pooled connection. Safe to call repeatedly.
    async fn close(&self);

    /// Enables or disables verbose connection logging on current and future
    /// pooled connections.
    async fn set_verbose(&self, verbose: bool) -> Result<()>;

    /// Replaces or clears the upload progress callback.
    async fn set_upload_progress(&self, callback: Option<ProgressFn>);

    /// Replaces or clears the download progress callback.
    async fn set_download_progress(&self, callback: Option<ProgressFn>);
}
