//! Recording transport double for façade tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use bytes::Bytes;
use cloudfiles_core::{
    AuthRequest, AuthSession, Endpoints, Method, ProgressFn, Request, RequestShape,
    ResponseFields, Result, Sink, Transport,
};
use tokio::io::AsyncReadExt;
use url::Url;

pub(crate) const STORAGE: &str = "https://storage.example/v1/acct";
pub(crate) const CDN: &str = "https://cdn.example/v1/acct";

/// A request as seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub shape: RequestShape,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    token: Option<String>,
    endpoints: Endpoints,
    responses: VecDeque<(ResponseFields, Bytes)>,
    auth_responses: VecDeque<ResponseFields>,
    requests: Vec<Recorded>,
    auth_calls: usize,
    closed: usize,
    verbose: bool,
}

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct MockTransport {
    state: Mutex<State>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that already holds a token and both endpoints.
    pub fn authenticated() -> Self {
        let transport = Self::new();
        {
            let mut state = transport.state.lock().unwrap();
            state.token = Some("tok".into());
            state.endpoints = Endpoints::new(
                Some(Url::parse(STORAGE).unwrap()),
                Some(Url::parse(CDN).unwrap()),
            );
        }
        transport
    }

    /// Creates an authenticated transport without a CDN endpoint.
    pub fn without_cdn() -> Self {
        let transport = Self::authenticated();
        transport.state.lock().unwrap().endpoints =
            Endpoints::new(Some(Url::parse(STORAGE).unwrap()), None);
        transport
    }

    pub fn push(&self, status: u16) -> &Self {
        self.push_fields(ResponseFields::with_status(status, reason(status)))
    }

    pub fn push_fields(&self, fields: ResponseFields) -> &Self {
        self.push_body(fields, Bytes::new())
    }

    pub fn push_body(&self, fields: ResponseFields, body: impl Into<Bytes>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back((fields, body.into()));
        self
    }

    pub fn push_auth(&self, fields: ResponseFields) -> &Self {
        self.state.lock().unwrap().auth_responses.push_back(fields);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests().pop().expect("no request was sent")
    }

    pub fn auth_calls(&self) -> usize {
        self.state.lock().unwrap().auth_calls
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    pub fn verbose(&self) -> bool {
        self.state.lock().unwrap().verbose
    }
}

pub(crate) fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        304 => "Not Modified",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        412 => "Precondition Failed",
        422 => "Unprocessable Entity",
        _ => "Unknown",
    }
}

/// Successful authentication response pointing at the mock endpoints.
pub(crate) fn auth_ok(token: &str) -> ResponseFields {
    let mut fields = ResponseFields::with_status(204, "No Content");
    fields.auth_token = Some(token.into());
    fields.storage_url = Some(STORAGE.into());
    fields.cdn_management_url = Some(CDN.into());
    fields
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request, sink: &mut Sink<'_>) -> Result<ResponseFields> {
        request.validate()?;
        if self.state.lock().unwrap().token.is_none() {
            return Err(cloudfiles_core::Error::Authentication(
                "Session is not authenticated".into(),
            ));
        }

        let Request {
            shape,
            method,
            url,
            headers,
            body,
        } = request;

        let body = match body {
            Some(body) => {
                let (mut reader, _) = body.into_parts();
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).await?;
                Some(buffer)
            }
            None => None,
        };

        let (fields, payload) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(Recorded {
                shape,
                method,
                url,
                headers,
                body,
            });
            state
                .responses
                .pop_front()
                .expect("no response queued for request")
        };

        sink.reset();
        if shape.reads_body() && fields.is_success() {
            sink.write_chunk(&payload).await?;
            sink.finish().await?;
        }

        Ok(fields)
    }

    async fn authenticate(&self, _request: AuthRequest) -> Result<ResponseFields> {
        let mut state = self.state.lock().unwrap();
        state.auth_calls += 1;
        Ok(state
            .auth_responses
            .pop_front()
            .expect("no authentication response queued"))
    }

    async fn set_credentials(&self, session: &AuthSession, _use_internal_network: bool) {
        let mut state = self.state.lock().unwrap();
        state.token = Some(session.token().to_owned());
        state.endpoints = Endpoints::new(
            session.storage_url().cloned(),
            session.cdn_management_url().cloned(),
        );
    }

    async fn endpoints(&self) -> Endpoints {
        self.state.lock().unwrap().endpoints.clone()
    }

    async fn is_authenticated(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.token.is_some() && !state.endpoints.is_empty()
    }

    async fn close(&self) {
        self.state.lock().unwrap().closed += 1;
    }

    async fn set_verbose(&self, verbose: bool) -> Result<()> {
        self.state.lock().unwrap().verbose = verbose;
        Ok(())
    }

    async fn set_upload_progress(&self, _callback: Option<ProgressFn>) {}

    async fn set_download_progress(&self, _callback: Option<ProgressFn>) {}
}
