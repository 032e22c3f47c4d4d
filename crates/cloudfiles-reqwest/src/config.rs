//! Transport session configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use reqwest::Certificate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default connect timeout: 10 seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 4;

/// Configuration for the reqwest transport session.
///
/// Requests that stream a body (downloads and uploads) ignore
/// `request_timeout`, since object transfers can legitimately run for a long
/// time; every other request shape is bounded by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Connect timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "connect-timeout", env = "CLOUDFILES_CONNECT_TIMEOUT", default_value = "10")
    )]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout: u64,

    /// Timeout in seconds for requests without a streamed body
    #[cfg_attr(
        feature = "config",
        arg(long = "request-timeout", env = "CLOUDFILES_REQUEST_TIMEOUT")
    )]
    #[serde(default)]
    pub request_timeout: Option<u64>,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "user-agent", env = "CLOUDFILES_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,

    /// PEM bundle of additional trusted CA certificates
    #[cfg_attr(feature = "config", arg(long = "ca-bundle", env = "CLOUDFILES_CA_BUNDLE"))]
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,

    /// Log connection-level traffic
    #[cfg_attr(feature = "config", arg(long = "verbose-transport", env = "CLOUDFILES_VERBOSE"))]
    #[serde(default)]
    pub verbose: bool,

    /// Maximum number of redirects to follow
    #[cfg_attr(
        feature = "config",
        arg(long = "max-redirects", env = "CLOUDFILES_MAX_REDIRECTS", default_value = "4")
    )]
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_max_redirects() -> usize {
    DEFAULT_MAX_REDIRECTS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout_secs(),
            request_timeout: None,
            user_agent: None,
            ca_bundle: None,
            verbose: false,
            max_redirects: default_max_redirects(),
        }
    }
}

impl ReqwestConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the effective connect timeout, using the default if zero.
    pub fn effective_connect_timeout(&self) -> Duration {
        match self.connect_timeout {
            0 => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Returns the timeout for requests without a streamed body.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Returns the effective user agent, using the default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("cloudfiles-rs/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the connect timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// Sets the timeout for requests without a streamed body.
    #[must_use]
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Some(secs);
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the CA bundle path.
    #[must_use]
    pub fn with_ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Enables or disables verbose connection logging.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks the configuration.
    ///
    /// Fails with an I/O error when the CA bundle path does not exist.
    pub fn validate(&self) -> cloudfiles_core::Result<()> {
        if let Some(path) = &self.ca_bundle
            && !path.exists()
        {
            return Err(Error::CaBundle {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            }
            .into());
        }
        Ok(())
    }

    /// Reads the configured CA bundle, if any.
    pub(crate) fn load_ca_bundle(&self) -> cloudfiles_core::Result<Option<Certificate>> {
        self.ca_bundle
            .as_deref()
            .map(load_certificate)
            .transpose()
    }
}

/// Reads and parses a PEM certificate.
pub(crate) fn load_certificate(path: &Path) -> cloudfiles_core::Result<Certificate> {
    let pem = std::fs::read(path).map_err(|source| Error::CaBundle {
        path: path.display().to_string(),
        source,
    })?;

    Certificate::from_pem(&pem).map_err(|e| {
        Error::CaBundle {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        }
        .into()
    })
}
