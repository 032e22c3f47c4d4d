//! Account-level connection.

use std::future::Future;
use std::sync::Arc;

use cloudfiles_core::{
    Endpoints, Error, ProgressFn, Request, ResponseFields, Result, Sink, Transport,
};
use cloudfiles_reqwest::{HttpSession, ReqwestConfig};
use tracing::{info, instrument, warn};

use super::{ClientConfig, ReauthPolicy};
use crate::TRACING_TARGET_CLIENT;

struct ConnectionInner {
    transport: Arc<dyn Transport>,
    reauth: ReauthPolicy,
}

/// An authenticated account.
///
/// Cheap to clone; clones share the transport session. Account operations
/// (info, container management and listings) live on this type, container and
/// object operations on the handles it returns.
///
/// # Examples
///
/// ```rust,ignore
/// use cloudfiles_client::{ClientConfig, Connection, ReqwestConfig};
///
/// let config = ClientConfig::new("username", "api-key");
/// let connection = Connection::connect(&config, ReqwestConfig::default()).await?;
/// let mut photos = connection.create_container("photos").await?;
/// photos.create_object("pic.jpg")?.write(&b"..."[..], true).await?;
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("reauth", &self.inner.reauth.is_enabled())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Wraps an authenticated transport.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` when the transport has no token or endpoints.
    pub async fn new(transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_policy(transport, ReauthPolicy::Disabled).await
    }

    /// Wraps an authenticated transport with a re-authentication policy.
    pub async fn with_policy(transport: Arc<dyn Transport>, reauth: ReauthPolicy) -> Result<Self> {
        if !transport.is_authenticated().await {
            return Err(Error::Authentication(
                "Connection requires an authenticated session".into(),
            ));
        }

        Ok(Self {
            inner: Arc::new(ConnectionInner { transport, reauth }),
        })
    }

    /// Opens an HTTP session, authenticates and wraps the result.
    #[instrument(skip_all, target = TRACING_TARGET_CLIENT, fields(username = %config.username))]
    pub async fn connect(config: &ClientConfig, transport_config: ReqwestConfig) -> Result<Self> {
        config.validate()?;

        let session = HttpSession::new(transport_config)?;
        config.authentication().authenticate(&session).await?;

        let connection = Self::with_policy(Arc::new(session), config.reauth_policy()).await?;
        info!(
            target: TRACING_TARGET_CLIENT,
            reauth = connection.inner.reauth.is_enabled(),
            "Connection established"
        );
        Ok(connection)
    }

    /// Returns the underlying transport.
    #[inline]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// Returns the re-authentication policy.
    #[inline]
    pub fn reauth_policy(&self) -> &ReauthPolicy {
        &self.inner.reauth
    }

    /// Returns whether the transport still holds a token and endpoints.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.transport.is_authenticated().await
    }

    /// Enables or disables verbose connection logging.
    pub async fn set_verbose(&self, verbose: bool) -> Result<()> {
        self.inner.transport.set_verbose(verbose).await
    }

    /// Replaces or clears the upload progress callback.
    pub async fn set_upload_progress(&self, callback: Option<ProgressFn>) {
        self.inner.transport.set_upload_progress(callback).await;
    }

    /// Replaces or clears the download progress callback.
    pub async fn set_download_progress(&self, callback: Option<ProgressFn>) {
        self.inner.transport.set_download_progress(callback).await;
    }

    /// Releases every pooled connection of the transport.
    pub async fn close(&self) {
        self.inner.transport.close().await;
    }

    pub(crate) async fn endpoints(&self) -> Endpoints {
        self.inner.transport.endpoints().await
    }

    pub(crate) async fn send(&self, request: Request, sink: &mut Sink<'_>) -> Result<ResponseFields> {
        self.inner.transport.send(request, sink).await
    }

    /// Returns whether `error` should trigger a re-authentication.
    pub(crate) fn should_reauthenticate(&self, error: &Error) -> bool {
        error.is_authentication() && self.inner.reauth.is_enabled()
    }

    /// Runs the policy's authentication exchange again.
    pub(crate) async fn reauthenticate(&self) -> Result<()> {
        let Some(authentication) = self.inner.reauth.authentication() else {
            return Err(Error::Authentication("Re-authentication is disabled".into()));
        };

        warn!(
            target: TRACING_TARGET_CLIENT,
            "Session token rejected, authenticating again"
        );
        authentication
            .authenticate(self.inner.transport.as_ref())
            .await
            .map(|_| ())
    }

    /// Runs `operation`, re-authenticating and retrying it once when it fails
    /// with an authentication error and the policy allows it.
    pub(crate) async fn retry<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match operation().await {
            Err(e) if self.should_reauthenticate(&e) => {
                self.reauthenticate().await?;
                operation().await
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    use axum::Router;
    use axum::body::{Body, Bytes};
    use axum::extract::State;
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::response::Response;
    use cloudfiles_core::Credentials;
    use url::Url;

    use super::*;
    use crate::client::Authentication;
    use crate::mock::{MockTransport, auth_ok};

    #[tokio::test]
    async fn test_requires_authenticated_transport() {
        let err = Connection::new(Arc::new(MockTransport::new()))
            .await
            .unwrap_err();
        assert!(err.is_authentication());

        assert!(
            Connection::new(Arc::new(MockTransport::authenticated()))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_passthroughs() {
        let transport = Arc::new(MockTransport::authenticated());
        let connection = Connection::new(transport.clone()).await.unwrap();

        connection.set_verbose(true).await.unwrap();
        assert!(transport.verbose());

        connection.close().await;
        connection.close().await;
        assert_eq!(transport.closed(), 2);
        assert!(connection.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_reauth_retries_once_then_surfaces_error() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(401).push(401);
        transport.push_auth(auth_ok("fresh"));

        let policy = ReauthPolicy::once(Authentication::new(Credentials::new("u", "k")));
        let connection = Connection::with_policy(transport.clone(), policy)
            .await
            .unwrap();

        let err = connection.info().await.unwrap_err();
        assert!(err.is_authentication());
        assert_eq!(transport.auth_calls(), 1);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_reauth_recovers_expired_token() {
        let transport = Arc::new(MockTransport::authenticated());
        let mut fields = ResponseFields::with_status(204, "No Content");
        fields.account_container_count = 4;
        transport.push(401).push_fields(fields);
        transport.push_auth(auth_ok("fresh"));

        let policy = ReauthPolicy::once(Authentication::new(Credentials::new("u", "k")));
        let connection = Connection::with_policy(transport.clone(), policy)
            .await
            .unwrap();

        assert_eq!(connection.info().await.unwrap().container_count, 4);
        assert_eq!(transport.auth_calls(), 1);
    }

    #[tokio::test]
    async fn test_without_policy_401_is_returned() {
        let transport = Arc::new(MockTransport::authenticated());
        transport.push(401);

        let connection = Connection::new(transport.clone()).await.unwrap();
        assert!(connection.info().await.unwrap_err().is_authentication());
        assert_eq!(transport.auth_calls(), 0);
    }

    /// In-process service double speaking the storage dialect.
    #[derive(Default)]
    struct Service {
        addr: Mutex<Option<SocketAddr>>,
        containers: Mutex<HashMap<String, HashMap<String, (Bytes, String)>>>,
    }

    fn reply(status: StatusCode) -> axum::http::response::Builder {
        Response::builder().status(status)
    }

    async fn handle(
        State(service): State<Arc<Service>>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Response {
        let addr = service.addr.lock().unwrap().unwrap();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };

        if uri.path() == "/auth/v1.0" {
            let accepted =
                header("x-auth-user").as_deref() == Some("u") && header("x-auth-key").as_deref() == Some("k");
            let builder = if accepted {
                reply(StatusCode::NO_CONTENT)
                    .header("X-Storage-Url", format!("http://{addr}/v1/acct"))
                    .header("X-Auth-Token", "tok")
            } else {
                reply(StatusCode::UNAUTHORIZED)
            };
            return builder.body(Body::empty()).unwrap();
        }

        if header("x-auth-token").as_deref() != Some("tok") {
            return reply(StatusCode::UNAUTHORIZED).body(Body::empty()).unwrap();
        }

        let Some(rest) = uri.path().strip_prefix("/v1/acct/") else {
            return reply(StatusCode::NOT_FOUND).body(Body::empty()).unwrap();
        };
        let (container, object) = match rest.split_once('/') {
            Some((container, object)) => (container.to_owned(), Some(object.to_owned())),
            None => (rest.to_owned(), None),
        };

        let mut containers = service.containers.lock().unwrap();
        match (method.as_str(), object) {
            ("PUT", None) => {
                containers.entry(container).or_default();
                reply(StatusCode::CREATED).body(Body::empty()).unwrap()
            }
            ("PUT", Some(object)) => {
                let Some(objects) = containers.get_mut(&container) else {
                    return reply(StatusCode::NOT_FOUND).body(Body::empty()).unwrap();
                };
                let computed = format!("{:x}", md5::compute(&body));
                if header("etag").is_some_and(|etag| etag != computed) {
                    return reply(StatusCode::UNPROCESSABLE_ENTITY)
                        .body(Body::empty())
                        .unwrap();
                }
                objects.insert(object, (body, computed.clone()));
                reply(StatusCode::CREATED)
                    .header("ETag", computed)
                    .body(Body::empty())
                    .unwrap()
            }
            ("GET", Some(object)) => match containers.get(&container).and_then(|c| c.get(&object)) {
                Some((data, etag)) => reply(StatusCode::OK)
                    .header("ETag", etag.as_str())
                    .body(Body::from(data.clone()))
                    .unwrap(),
                None => reply(StatusCode::NOT_FOUND).body(Body::empty()).unwrap(),
            },
            _ => reply(StatusCode::METHOD_NOT_ALLOWED)
                .body(Body::empty())
                .unwrap(),
        }
    }

    async fn spawn_service() -> SocketAddr {
        let service = Arc::new(Service::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        *service.addr.lock().unwrap() = Some(addr);

        let app = Router::new().fallback(handle).with_state(service);
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[tokio::test]
    async fn test_end_to_end_upload_and_read() {
        let addr = spawn_service().await;
        let auth_host = Url::parse(&format!("http://{addr}/auth")).unwrap();
        let config = ClientConfig::new("u", "k").with_auth_host(auth_host);

        let connection = Connection::connect(&config, ReqwestConfig::default())
            .await
            .unwrap();

        let photos = connection.create_container("photos").await.unwrap();
        let mut object = photos.create_object("pic.jpg").unwrap();

        let payload: Vec<u8> = (0..1024u32).map(|i| (i % 256) as u8).collect();
        let local_hash = format!("{:x}", md5::compute(&payload));
        object.write(payload.clone(), true).await.unwrap();

        assert_eq!(object.etag(), Some(local_hash.as_str()));
        assert_eq!(object.content_type(), Some("image/jpeg"));
        assert_eq!(object.content_length(), 1024);

        let read = object.read(&[]).await.unwrap();
        assert_eq!(read.as_ref(), payload.as_slice());

        connection.close().await;
        connection.close().await;
    }

    #[tokio::test]
    async fn test_end_to_end_checksum_mismatch() {
        let addr = spawn_service().await;
        let auth_host = Url::parse(&format!("http://{addr}/auth")).unwrap();
        let config = ClientConfig::new("u", "k").with_auth_host(auth_host);
        let connection = Connection::connect(&config, ReqwestConfig::default())
            .await
            .unwrap();

        let photos = connection.create_container("photos").await.unwrap();
        let mut object = photos.create_object("pic.jpg").unwrap();
        object.set_etag("00000000000000000000000000000000");

        let err = object.write(vec![1u8; 1024], true).await.unwrap_err();
        assert!(err.is_checksum_mismatch());
    }

    #[tokio::test]
    async fn test_end_to_end_rejected_credentials() {
        let addr = spawn_service().await;
        let auth_host = Url::parse(&format!("http://{addr}/auth")).unwrap();
        let config = ClientConfig::new("u", "wrong").with_auth_host(auth_host);

        let err = Connection::connect(&config, ReqwestConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }
}
