//! Request shapes and the request type handed to a [`Transport`].
//!
//! [`Transport`]: crate::Transport

use bytes::Bytes;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use tokio::io::{AsyncRead, AsyncSeek};
use url::Url;

use crate::{Error, Result};

/// Category of request.
///
/// A transport keeps one pooled connection per shape, each with the fixed
/// options the shape needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum RequestShape {
    /// GET with the body drained into a sink.
    Read,
    /// PUT with a streamed upload body.
    WriteStreamed,
    /// HEAD, no body expected.
    MetadataOnly,
    /// PUT with an empty body.
    WriteNoBody,
    /// DELETE or POST with headers only.
    DeleteOrUpdate,
}

impl RequestShape {
    /// All shapes, in pool order.
    pub const ALL: [RequestShape; 5] = [
        RequestShape::Read,
        RequestShape::WriteStreamed,
        RequestShape::MetadataOnly,
        RequestShape::WriteNoBody,
        RequestShape::DeleteOrUpdate,
    ];

    /// Returns the method used when the caller does not pick one.
    pub fn default_method(self) -> Method {
        match self {
            RequestShape::Read => Method::Get,
            RequestShape::WriteStreamed | RequestShape::WriteNoBody => Method::Put,
            RequestShape::MetadataOnly => Method::Head,
            RequestShape::DeleteOrUpdate => Method::Delete,
        }
    }

    /// Returns whether `method` can be sent with this shape.
    pub fn accepts(self, method: Method) -> bool {
        match self {
            RequestShape::Read => method == Method::Get,
            RequestShape::WriteStreamed | RequestShape::WriteNoBody => method == Method::Put,
            RequestShape::MetadataOnly => method == Method::Head,
            RequestShape::DeleteOrUpdate => matches!(method, Method::Delete | Method::Post),
        }
    }

    /// Returns whether requests of this shape carry an upload body.
    #[inline]
    pub fn has_upload(self) -> bool {
        self == RequestShape::WriteStreamed
    }

    /// Returns whether the response body should be drained into a sink.
    #[inline]
    pub fn reads_body(self) -> bool {
        self == RequestShape::Read
    }
}

/// HTTP method used by the service dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Head,
    Post,
    Delete,
}

/// Async byte source that can be rewound, used for verified uploads.
pub trait UploadSource: AsyncRead + AsyncSeek + Send + Sync + Unpin {}

impl<T> UploadSource for T where T: AsyncRead + AsyncSeek + Send + Sync + Unpin {}

/// Body of a streamed upload.
pub struct UploadBody {
    reader: Box<dyn AsyncRead + Send + Sync + Unpin>,
    length: Option<u64>,
}

impl std::fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl UploadBody {
    /// Creates a body from in-memory bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let length = data.len() as u64;
        Self {
            reader: Box::new(std::io::Cursor::new(data)),
            length: Some(length),
        }
    }

    /// Creates a body from a reader.
    ///
    /// With `length` unknown the upload is sent chunked.
    pub fn from_reader(
        reader: impl AsyncRead + Send + Sync + Unpin + 'static,
        length: Option<u64>,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            length,
        }
    }

    /// Returns the declared length.
    #[inline]
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Splits the body into its reader and declared length.
    pub fn into_parts(self) -> (Box<dyn AsyncRead + Send + Sync + Unpin>, Option<u64>) {
        (self.reader, self.length)
    }
}

/// A request ready to be sent by a transport.
#[derive(Debug)]
pub struct Request {
    /// Shape selecting the pooled connection.
    pub shape: RequestShape,
    /// Method, defaulting to the shape's method.
    pub method: Method,
    /// Fully built target URL.
    pub url: Url,
    /// Caller headers, sent as given.
    pub headers: Vec<(String, String)>,
    /// Upload body for [`RequestShape::WriteStreamed`].
    pub body: Option<UploadBody>,
}

impl Request {
    /// Creates a request using the shape's default method.
    pub fn new(shape: RequestShape, url: Url) -> Self {
        Self {
            shape,
            method: shape.default_method(),
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Overrides the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Adds one header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds several headers.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attaches an upload body.
    #[must_use]
    pub fn with_body(mut self, body: UploadBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Appends query parameters to the URL.
    #[must_use]
    pub fn with_query<'a>(mut self, params: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        let mut params = params.into_iter().peekable();
        if params.peek().is_some() {
            self.url.query_pairs_mut().extend_pairs(params);
        }
        self
    }

    /// Returns whether a header is present, compared case-insensitively.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }

    /// Checks that the method and body fit the shape.
    pub fn validate(&self) -> Result<()> {
        if !self.shape.accepts(self.method) {
            return Err(Error::UnsupportedShape(format!(
                "{} requests cannot use {}",
                self.shape, self.method
            )));
        }

        match (self.shape.has_upload(), self.body.is_some()) {
            (true, false) => Err(Error::UnsupportedShape(format!(
                "{} requests need an upload body",
                self.shape
            ))),
            (false, true) => Err(Error::UnsupportedShape(format!(
                "{} requests cannot carry an upload body",
                self.shape
            ))),
            _ => Ok(()),
        }
    }
}
