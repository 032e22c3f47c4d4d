//! Conversion of reqwest failures into the cloudfiles error taxonomy.

use thiserror::Error;

/// Internal error type for reqwest operations.
#[derive(Debug, Error)]
pub(crate) enum Error {
    /// HTTP request failed before a response was obtained.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// CA bundle could not be read or parsed.
    #[error("CA bundle '{path}': {source}")]
    CaBundle {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<Error> for cloudfiles_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_builder() {
                    cloudfiles_core::Error::Syntax(format!("Malformed request: {e}"))
                } else if e.is_timeout() {
                    cloudfiles_core::Error::transport_with_source("Request timed out", e)
                } else if e.is_connect() {
                    cloudfiles_core::Error::transport_with_source("Connection failed", e)
                } else {
                    cloudfiles_core::Error::transport_with_source(e.to_string(), e)
                }
            }
            Error::CaBundle { path, source } => cloudfiles_core::Error::Io(std::io::Error::new(
                source.kind(),
                format!("CA bundle '{path}': {source}"),
            )),
        }
    }
}
