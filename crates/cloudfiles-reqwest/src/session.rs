//! Reqwest-backed transport session.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use cloudfiles_core::headers::{AUTH_TOKEN, CONTENT_LENGTH, USER_AGENT};
use cloudfiles_core::{
    AuthRequest, AuthSession, Endpoints, Error, MAX_OBJECT_SIZE, Method, ProgressFn,
    ProgressHooks, Request, RequestShape, ResponseFields, Result, Sink, Transport,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Certificate, Client};
use tokio::sync::RwLock;
use url::Url;

use crate::body::{SizeGuard, streaming_body};
use crate::config::load_certificate;
use crate::pool::ConnectionPool;
use crate::response::decode_response;
use crate::{ReqwestConfig, TRACING_TARGET_SESSION};

/// Token and endpoints installed by `set_credentials`.
#[derive(Default)]
struct SessionState {
    token: Option<String>,
    endpoints: Endpoints,
}

/// Options baked into every client at build time.
struct ClientOptions {
    ca_certificate: Option<Certificate>,
    verbose: bool,
}

struct HttpSessionInner {
    config: ReqwestConfig,
    user_agent: String,
    pool: ConnectionPool,
    state: RwLock<SessionState>,
    options: RwLock<ClientOptions>,
    progress: RwLock<ProgressHooks>,
}

/// Transport session speaking HTTP through reqwest.
///
/// Holds one pooled client per [`RequestShape`], the session token and
/// endpoints, and the progress callbacks. Cloning is cheap and clones share
/// all of that state.
///
/// # Examples
///
/// ```rust,ignore
/// use cloudfiles_core::{Credentials, DEFAULT_API_VERSION, AuthSession, Transport};
/// use cloudfiles_reqwest::{HttpSession, ReqwestConfig};
///
/// let session = HttpSession::new(ReqwestConfig::default())?;
/// let request = Credentials::new("username", "api-key").auth_request(DEFAULT_API_VERSION)?;
/// let fields = session.authenticate(request).await?;
/// session.set_credentials(&AuthSession::from_auth_response(&fields)?, false).await;
/// ```
#[derive(Clone)]
pub struct HttpSession {
    inner: Arc<HttpSessionInner>,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("config", &self.inner.config)
            .field("user_agent", &self.inner.user_agent)
            .finish_non_exhaustive()
    }
}

impl HttpSession {
    /// Creates a session with the given configuration.
    ///
    /// The CA bundle, if configured, is loaded here; a missing file fails
    /// with an I/O error instead of surfacing on the first request.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        config.validate()?;
        let ca_certificate = config.load_ca_bundle()?;
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            connect_timeout_ms = config.effective_connect_timeout().as_millis(),
            ca_bundle = config.ca_bundle.is_some(),
            verbose = config.verbose,
            "Creating transport session"
        );

        let options = ClientOptions {
            ca_certificate,
            verbose: config.verbose,
        };

        let inner = HttpSessionInner {
            user_agent,
            pool: ConnectionPool::new(),
            state: RwLock::new(SessionState::default()),
            options: RwLock::new(options),
            progress: RwLock::new(ProgressHooks::new()),
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Returns the session configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Returns the shapes with an open pooled client.
    pub async fn open_shapes(&self) -> Vec<RequestShape> {
        self.inner.pool.open_shapes().await
    }

    /// Trusts the CA certificates in `path` from now on.
    ///
    /// Open pooled clients are rebuilt. Fails with an I/O error when the file
    /// is missing or unreadable, leaving the session unchanged.
    pub async fn set_ca_bundle(&self, path: impl AsRef<Path>) -> Result<()> {
        let certificate = load_certificate(path.as_ref())?;

        let mut options = self.inner.options.write().await;
        options.ca_certificate = Some(certificate);
        self.inner
            .pool
            .rebuild(|shape| build_client(&self.inner.config, Some(shape), &options))
            .await?;

        tracing::info!(
            target: TRACING_TARGET_SESSION,
            path = %path.as_ref().display(),
            "Using custom CA bundle"
        );
        Ok(())
    }

    async fn client(&self, shape: RequestShape) -> Result<Client> {
        let options = self.inner.options.read().await;
        self.inner
            .pool
            .get_or_open(shape, |shape| {
                build_client(&self.inner.config, Some(shape), &options)
            })
            .await
    }

    async fn token(&self) -> Result<String> {
        let state = self.inner.state.read().await;
        state
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Authentication("Session is not authenticated".into()))
    }
}

#[async_trait::async_trait]
impl Transport for HttpSession {
    async fn send(&self, request: Request, sink: &mut Sink<'_>) -> Result<ResponseFields> {
        request.validate()?;
        let token = self.token().await?;
        let client = self.client(request.shape).await?;
        let hooks = self.inner.progress.read().await.clone();

        sink.reset();

        let has_token = request.has_header(AUTH_TOKEN);
        let has_user_agent = request.has_header(USER_AGENT);
        let has_length = request.has_header(CONTENT_LENGTH);
        let Request {
            shape,
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = client.request(http_method(method), url.clone());
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !has_token {
            builder = builder.header(AUTH_TOKEN, token);
        }
        if !has_user_agent {
            builder = builder.header(header::USER_AGENT, self.inner.user_agent.as_str());
        }

        let mut exceeded = None;
        if let Some(body) = body {
            let streamed = streaming_body(body, hooks.upload().cloned());
            if let Some(length) = streamed.length
                && !has_length
            {
                builder = builder.header(header::CONTENT_LENGTH, length);
            }
            builder = builder.body(streamed.body);
            exceeded = Some(streamed.guard);
        }

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            shape = %shape,
            method = %method,
            path = %url.path(),
            "Sending request"
        );

        let started = Instant::now();
        let mut response = builder.send().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_SESSION,
                shape = %shape,
                method = %method,
                path = %url.path(),
                error = %e,
                elapsed = ?started.elapsed(),
                "Request failed without a response"
            );
            if exceeded.as_ref().is_some_and(SizeGuard::exceeded) {
                return Error::Syntax(format!(
                    "Object size exceeds the maximum of {MAX_OBJECT_SIZE} bytes"
                ));
            }
            Error::from(crate::error::Error::from(e))
        })?;

        let fields = decode_response(&response);

        if shape.reads_body() && fields.is_success() {
            while let Some(chunk) = response.chunk().await.map_err(|e| {
                Error::transport_with_source("Response body interrupted", e)
            })? {
                hooks.report_download(chunk.len() as u64);
                sink.write_chunk(&chunk).await?;
            }
            sink.finish().await?;
        }

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            shape = %shape,
            method = %method,
            status = fields.status,
            received = sink.len(),
            elapsed = ?started.elapsed(),
            "Request completed"
        );

        Ok(fields)
    }

    async fn authenticate(&self, request: AuthRequest) -> Result<ResponseFields> {
        let client = {
            let options = self.inner.options.read().await;
            build_client(&self.inner.config, None, &options)?
        };

        let mut builder = client
            .get(request.url.clone())
            .header(header::USER_AGENT, self.inner.user_agent.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            url = %request.url,
            "Authenticating"
        );

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_SESSION,
                url = %request.url,
                error = %e,
                "Authentication request failed without a response"
            );
            Error::from(crate::error::Error::from(e))
        })?;

        let fields = decode_response(&response);

        tracing::debug!(
            target: TRACING_TARGET_SESSION,
            status = fields.status,
            elapsed = ?started.elapsed(),
            "Authentication response received"
        );

        Ok(fields)
    }

    async fn set_credentials(&self, session: &AuthSession, use_internal_network: bool) {
        let storage = session.storage_url().cloned().map(|url| {
            if use_internal_network {
                internal_network_url(url)
            } else {
                url
            }
        });

        let mut state = self.inner.state.write().await;
        state.token = Some(session.token().to_owned());
        state.endpoints = Endpoints::new(storage, session.cdn_management_url().cloned());

        tracing::info!(
            target: TRACING_TARGET_SESSION,
            token = %session.token_masked(),
            internal_network = use_internal_network,
            cdn = state.endpoints.has_cdn(),
            "Session credentials installed"
        );
    }

    async fn endpoints(&self) -> Endpoints {
        self.inner.state.read().await.endpoints.clone()
    }

    async fn is_authenticated(&self) -> bool {
        let state = self.inner.state.read().await;
        state.token.as_deref().is_some_and(|t| !t.is_empty()) && !state.endpoints.is_empty()
    }

    async fn close(&self) {
        let closed = self.inner.pool.close().await;
        if closed > 0 {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                closed,
                "Closed pooled connections"
            );
        }
    }

    async fn set_verbose(&self, verbose: bool) -> Result<()> {
        let mut options = self.inner.options.write().await;
        if options.verbose == verbose {
            return Ok(());
        }

        options.verbose = verbose;
        self.inner
            .pool
            .rebuild(|shape| build_client(&self.inner.config, Some(shape), &options))
            .await
    }

    async fn set_upload_progress(&self, callback: Option<ProgressFn>) {
        self.inner.progress.write().await.set_upload(callback);
    }

    async fn set_download_progress(&self, callback: Option<ProgressFn>) {
        self.inner.progress.write().await.set_download(callback);
    }
}

/// Builds a client for `shape`, or for the authentication exchange when
/// `shape` is `None`.
fn build_client(
    config: &ReqwestConfig,
    shape: Option<RequestShape>,
    options: &ClientOptions,
) -> Result<Client> {
    let mut builder = Client::builder()
        .connect_timeout(config.effective_connect_timeout())
        .redirect(Policy::limited(config.max_redirects))
        .connection_verbose(options.verbose)
        .pool_max_idle_per_host(1);

    if let Some(certificate) = &options.ca_certificate {
        builder = builder.add_root_certificate(certificate.clone());
    }

    let streams_body = matches!(
        shape,
        Some(RequestShape::Read | RequestShape::WriteStreamed)
    );
    if !streams_body && let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    if shape == Some(RequestShape::WriteNoBody) {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| Error::transport_with_source("Failed to build HTTP client", e))
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Rewrites the storage host to its internal network (`snet-`) form.
fn internal_network_url(mut url: Url) -> Url {
    let Some(host) = url.host_str() else {
        return url;
    };
    if host.starts_with("snet-") {
        return url;
    }

    let internal = format!("snet-{host}");
    if let Err(e) = url.set_host(Some(&internal)) {
        tracing::warn!(
            target: TRACING_TARGET_SESSION,
            host = %internal,
            error = %e,
            "Cannot route storage endpoint through the internal network"
        );
    }
    url
}
