//! Client configuration.

#[cfg(feature = "config")]
use clap::Args;
use cloudfiles_core::{Credentials, DEFAULT_API_VERSION, Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{Authentication, ReauthPolicy};

/// Environment variable that routes storage traffic over the internal network.
pub const SERVICENET_ENV: &str = "RACKSPACE_SERVICENET";

/// Account and authentication settings.
///
/// The API key is never serialized and is masked in debug output.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ClientConfig {
    /// Account user name
    #[cfg_attr(feature = "config", arg(long = "username", env = "CLOUDFILES_USERNAME"))]
    pub username: String,

    /// Account API key
    #[cfg_attr(
        feature = "config",
        arg(long = "api-key", env = "CLOUDFILES_API_KEY", hide_env_values = true)
    )]
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// Legacy account name, switching to the legacy authentication exchange
    #[cfg_attr(feature = "config", arg(long = "account", env = "CLOUDFILES_ACCOUNT"))]
    #[serde(default)]
    pub legacy_account: Option<String>,

    /// Alternate authentication host
    #[cfg_attr(feature = "config", arg(long = "auth-host", env = "CLOUDFILES_AUTH_HOST"))]
    #[serde(default)]
    pub auth_host: Option<Url>,

    /// API version used by the legacy authentication exchange
    #[cfg_attr(
        feature = "config",
        arg(long = "api-version", env = "CLOUDFILES_API_VERSION", default_value = "1")
    )]
    #[serde(default = "default_api_version")]
    pub api_version: u32,

    /// Route storage traffic over the provider's internal network
    #[cfg_attr(feature = "config", arg(long = "servicenet"))]
    #[serde(default)]
    pub servicenet: bool,

    /// Refresh an expired session token once and retry the failed operation
    #[cfg_attr(feature = "config", arg(long = "reauthenticate"))]
    #[serde(default)]
    pub reauthenticate: bool,
}

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("api_key", &"***")
            .field("legacy_account", &self.legacy_account)
            .field("auth_host", &self.auth_host.as_ref().map(Url::as_str))
            .field("api_version", &self.api_version)
            .field("servicenet", &self.servicenet)
            .field("reauthenticate", &self.reauthenticate)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a configuration for the default authentication service.
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            legacy_account: None,
            auth_host: None,
            api_version: DEFAULT_API_VERSION,
            servicenet: false,
            reauthenticate: false,
        }
    }

    /// Sets the legacy account name.
    #[must_use]
    pub fn with_legacy_account(mut self, account: impl Into<String>) -> Self {
        self.legacy_account = Some(account.into());
        self
    }

    /// Sets an alternate authentication host.
    #[must_use]
    pub fn with_auth_host(mut self, host: Url) -> Self {
        self.auth_host = Some(host);
        self
    }

    /// Routes storage traffic over the internal network.
    #[must_use]
    pub fn with_servicenet(mut self, servicenet: bool) -> Self {
        self.servicenet = servicenet;
        self
    }

    /// Enables the once-only re-authentication policy.
    #[must_use]
    pub fn with_reauthentication(mut self, reauthenticate: bool) -> Self {
        self.reauthenticate = reauthenticate;
        self
    }

    /// Returns whether storage traffic uses the internal network.
    ///
    /// True when the flag is set or when [`SERVICENET_ENV`] holds a value
    /// other than empty, `0` or `false`.
    pub fn use_internal_network(&self) -> bool {
        self.servicenet
            || std::env::var(SERVICENET_ENV).is_ok_and(|value| {
                let value = value.trim();
                !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
            })
    }

    /// Builds the credentials described by this configuration.
    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::new(&self.username, &self.api_key);
        if let Some(account) = &self.legacy_account {
            credentials = credentials.with_legacy_account(account);
        }
        if let Some(host) = &self.auth_host {
            credentials = credentials.with_auth_host(host.clone());
        }
        credentials
    }

    /// Builds the authentication exchange described by this configuration.
    pub fn authentication(&self) -> Authentication {
        Authentication::new(self.credentials())
            .with_api_version(self.api_version)
            .with_internal_network(self.use_internal_network())
    }

    /// Returns the re-authentication policy described by this configuration.
    pub fn reauth_policy(&self) -> ReauthPolicy {
        if self.reauthenticate {
            ReauthPolicy::once(self.authentication())
        } else {
            ReauthPolicy::Disabled
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::Syntax("Username cannot be empty".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::Syntax("API key cannot be empty".into()));
        }
        if self.legacy_account.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(Error::Syntax("Legacy account name cannot be empty".into()));
        }
        if self.api_version == 0 {
            return Err(Error::Syntax("API version must be greater than zero".into()));
        }
        Ok(())
    }
}
