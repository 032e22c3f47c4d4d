//! Error taxonomy shared by every cloudfiles crate.

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for all cloudfiles operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type for object storage operations.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum Error {
    /// Caller supplied an invalid argument.
    ///
    /// Raised before any request is sent: bad container or object names,
    /// oversized metadata, objects above the size limit, or incomplete
    /// cached credentials.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// The service rejected the credentials or the session token (401), or
    /// the session was used before it was authenticated.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The service answered with a status outside the operation's expected set.
    #[error("Invalid response ({status}): {reason}")]
    InvalidResponse {
        /// HTTP status code.
        status: u16,
        /// Reason phrase or a short description of what was expected.
        reason: String,
    },

    /// No HTTP response was obtained at all.
    ///
    /// Covers connection failures, timeouts and interrupted bodies.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Container, object or account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Container still holds objects and cannot be deleted.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The service computed a different content hash than the one sent.
    #[error("Checksum mismatch: {0}")]
    ChecksumMismatch(String),

    /// Content type is missing and could not be determined.
    #[error("Content type error: {0}")]
    ContentType(String),

    /// CDN operation requested without a CDN management endpoint.
    #[error("CDN not enabled: {0}")]
    CdnNotEnabled(String),

    /// Local stream or file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request method is not valid for the request shape.
    #[error("Unsupported connection shape: {0}")]
    UnsupportedShape(String),

    /// JSON listing could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates an invalid response error from a status and reason phrase.
    pub fn invalid_response(status: u16, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            status,
            reason: reason.into(),
        }
    }

    /// Creates a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping an underlying source.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns whether this error was raised by local argument validation.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax(_))
    }

    /// Returns whether re-authenticating could resolve this error.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication(_))
    }

    /// Returns whether the service response was unusable.
    ///
    /// Transport failures count as invalid responses: no valid response was
    /// obtained.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Error::InvalidResponse { .. } | Error::Transport { .. })
    }

    /// Returns whether no HTTP response was obtained.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Returns whether this error indicates a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns whether this error indicates a non-empty container.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Returns whether the upload checksum was rejected.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Error::ChecksumMismatch(_))
    }

    /// Returns whether the content type was missing or undeterminable.
    pub fn is_content_type(&self) -> bool {
        matches!(self, Error::ContentType(_))
    }

    /// Returns whether this error came from local I/O.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidResponse { status, .. } => Some(*status),
            _ => None,
        }
    }
}
