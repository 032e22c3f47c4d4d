//! Account credentials and the session they are exchanged for.
//!
//! [`Credentials`] hold what the user supplies; [`AuthSession`] holds what the
//! authentication service hands back (token plus storage and CDN endpoints).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::headers::{self, ResponseFields};
use crate::{Error, Result, TRACING_TARGET_CREDENTIALS};

/// Default authentication service.
pub const DEFAULT_AUTH_HOST: &str = "https://auth.api.rackspacecloud.com";

/// API version used in legacy authentication paths.
pub const DEFAULT_API_VERSION: u32 = 1;

/// Identity and secret used for the authentication exchange.
///
/// Setting a legacy account switches to the older `X-Storage-User` /
/// `X-Storage-Pass` exchange under `<host>/v<version>/<account>/v1.0`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account user name.
    pub identity: String,

    /// API key. Never serialized and masked in debug output.
    #[serde(skip_serializing, default)]
    pub secret: String,

    /// Legacy account name.
    #[serde(default)]
    pub legacy_account: Option<String>,

    /// Alternate authentication host.
    #[serde(default)]
    pub auth_host: Option<Url>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .field("legacy_account", &self.legacy_account)
            .field("auth_host", &self.auth_host.as_ref().map(Url::as_str))
            .finish()
    }
}

impl Credentials {
    /// Creates credentials for the default authentication service.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cloudfiles_core::Credentials;
    ///
    /// let credentials = Credentials::new("username", "api-key");
    /// assert!(!credentials.is_legacy());
    /// ```
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
            legacy_account: None,
            auth_host: None,
        }
    }

    /// Switches to legacy authentication for the given account.
    #[must_use]
    pub fn with_legacy_account(mut self, account: impl Into<String>) -> Self {
        self.legacy_account = Some(account.into());
        self
    }

    /// Uses an alternate authentication host.
    #[must_use]
    pub fn with_auth_host(mut self, host: Url) -> Self {
        self.auth_host = Some(host);
        self
    }

    /// Returns whether the legacy exchange is used.
    #[inline]
    pub fn is_legacy(&self) -> bool {
        self.legacy_account.is_some()
    }

    /// Returns the identity with everything past the first 4 characters masked.
    pub fn identity_masked(&self) -> String {
        let visible: String = self.identity.chars().take(4).collect();
        if visible.len() == self.identity.len() {
            "*".repeat(self.identity.chars().count())
        } else {
            format!("{visible}***")
        }
    }

    /// Returns the authentication host, falling back to [`DEFAULT_AUTH_HOST`].
    pub fn effective_auth_host(&self) -> Result<Url> {
        match &self.auth_host {
            Some(host) => Ok(host.clone()),
            None => Url::parse(DEFAULT_AUTH_HOST)
                .map_err(|e| Error::Syntax(format!("Invalid authentication host: {e}"))),
        }
    }

    /// Builds the authentication request for these credentials.
    pub fn auth_request(&self, api_version: u32) -> Result<AuthRequest> {
        if self.identity.is_empty() || self.secret.is_empty() {
            return Err(Error::Syntax(
                "Username and API key are both required for authentication".into(),
            ));
        }

        let mut url = self.effective_auth_host()?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Syntax("Authentication host cannot be a base URL".into()))?;
            segments.pop_if_empty();
            if let Some(account) = &self.legacy_account {
                segments.push(&format!("v{api_version}"));
                segments.push(account);
            }
            segments.push("v1.0");
        }

        let headers = if self.is_legacy() {
            vec![
                (headers::STORAGE_USER.to_owned(), self.identity.clone()),
                (headers::STORAGE_PASS.to_owned(), self.secret.clone()),
            ]
        } else {
            vec![
                (headers::AUTH_USER.to_owned(), self.identity.clone()),
                (headers::AUTH_KEY.to_owned(), self.secret.clone()),
            ]
        };

        Ok(AuthRequest { url, headers })
    }
}

/// A prepared authentication request.
#[derive(Clone)]
pub struct AuthRequest {
    /// Authentication endpoint.
    pub url: Url,
    /// Identity and secret headers.
    pub headers: Vec<(String, String)>,
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("AuthRequest")
            .field("url", &self.url.as_str())
            .field("headers", &names)
            .finish()
    }
}

/// Token and endpoints returned by the authentication service.
///
/// Immutable once created; re-authentication produces a new value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    token: String,
    storage_url: Option<Url>,
    cdn_management_url: Option<Url>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &self.token_masked())
            .field("storage_url", &self.storage_url.as_ref().map(Url::as_str))
            .field(
                "cdn_management_url",
                &self.cdn_management_url.as_ref().map(Url::as_str),
            )
            .finish()
    }
}

impl AuthSession {
    /// Creates a session from already parsed parts.
    pub fn new(
        token: impl Into<String>,
        storage_url: Option<Url>,
        cdn_management_url: Option<Url>,
    ) -> Self {
        Self {
            token: token.into(),
            storage_url,
            cdn_management_url,
        }
    }

    /// Loads a previously exported session without contacting the service.
    ///
    /// All three values are required.
    pub fn load_cached(token: &str, storage_url: &str, cdn_management_url: &str) -> Result<Self> {
        if token.is_empty() || storage_url.is_empty() || cdn_management_url.is_empty() {
            return Err(Error::Syntax(
                "Missing auth token, storage URL or CDN management URL".into(),
            ));
        }

        let storage_url = Url::parse(storage_url)
            .map_err(|e| Error::Syntax(format!("Invalid storage URL: {e}")))?;
        let cdn_management_url = Url::parse(cdn_management_url)
            .map_err(|e| Error::Syntax(format!("Invalid CDN management URL: {e}")))?;

        tracing::debug!(
            target: TRACING_TARGET_CREDENTIALS,
            storage_url = %storage_url,
            "Loaded cached credentials"
        );

        Ok(Self::new(token, Some(storage_url), Some(cdn_management_url)))
    }

    /// Interprets the response of an authentication request.
    ///
    /// 401 maps to an authentication error, any other non-204 status to an
    /// invalid response. A 204 must carry a token and at least one endpoint.
    pub fn from_auth_response(fields: &ResponseFields) -> Result<Self> {
        match fields.status {
            204 => {}
            401 => {
                return Err(Error::Authentication(
                    "Invalid username or access key".into(),
                ));
            }
            status => {
                return Err(Error::invalid_response(status, fields.reason.clone()));
            }
        }

        let token = fields.auth_token.as_deref().unwrap_or_default();
        let storage_url = parse_endpoint(fields.storage_url.as_deref())?;
        let cdn_management_url = parse_endpoint(fields.cdn_management_url.as_deref())?;

        let session = Self::new(token, storage_url, cdn_management_url);
        if !session.is_usable() {
            return Err(Error::invalid_response(
                fields.status,
                "Expected headers missing from auth service",
            ));
        }

        Ok(session)
    }

    /// Returns whether a token and at least one endpoint are present.
    pub fn is_usable(&self) -> bool {
        !self.token.is_empty() && (self.storage_url.is_some() || self.cdn_management_url.is_some())
    }

    /// Returns the session token.
    #[inline]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the storage endpoint.
    #[inline]
    pub fn storage_url(&self) -> Option<&Url> {
        self.storage_url.as_ref()
    }

    /// Returns the CDN management endpoint.
    #[inline]
    pub fn cdn_management_url(&self) -> Option<&Url> {
        self.cdn_management_url.as_ref()
    }

    /// Returns the token with everything past the first 4 characters masked.
    pub fn token_masked(&self) -> String {
        match self.token.get(..4) {
            Some(head) if self.token.len() > 4 => format!("{head}***"),
            _ => "*".repeat(self.token.len()),
        }
    }

    /// Exports the session as JSON for caching between processes.
    pub fn export(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restores a session exported with [`AuthSession::export`].
    pub fn import(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn parse_endpoint(value: Option<&str>) -> Result<Option<Url>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(value) => Url::parse(value).map(Some).map_err(|e| {
            Error::invalid_response(204, format!("Malformed endpoint '{value}': {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headers::decode_block;

    #[test]
    fn test_modern_auth_request() {
        let request = Credentials::new("u", "k").auth_request(DEFAULT_API_VERSION).unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://auth.api.rackspacecloud.com/v1.0"
        );
        assert_eq!(
            request.headers,
            vec![
                ("X-Auth-User".to_owned(), "u".to_owned()),
                ("X-Auth-Key".to_owned(), "k".to_owned()),
            ]
        );
    }

    #[test]
    fn test_legacy_auth_request() {
        let host = Url::parse("https://auth.example.com/").unwrap();
        let request = Credentials::new("u", "k")
            .with_legacy_account("acct")
            .with_auth_host(host)
            .auth_request(1)
            .unwrap();
        assert_eq!(request.url.as_str(), "https://auth.example.com/v1/acct/v1.0");
        assert_eq!(request.headers[0].0, "X-Storage-User");
        assert_eq!(request.headers[1].0, "X-Storage-Pass");
    }

    #[test]
    fn test_auth_request_requires_identity_and_secret() {
        let err = Credentials::new("", "k").auth_request(1).unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_secret_is_not_serialized_or_printed() {
        let credentials = Credentials::new("username", "super-secret");
        let json = serde_json::to_string(&credentials).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!format!("{credentials:?}").contains("super-secret"));
        assert_eq!(credentials.identity_masked(), "user***");
    }

    #[test]
    fn test_from_auth_response_success() {
        let fields = decode_block(
            "HTTP/1.1 204 No Content\r\n\
             X-Storage-Url: https://storage.example/v1/acct\r\n\
             X-CDN-Management-Url: https://cdn.example/v1/acct\r\n\
             X-Auth-Token: tok\r\n",
        );
        let session = AuthSession::from_auth_response(&fields).unwrap();
        assert_eq!(session.token(), "tok");
        assert!(session.is_usable());
        assert_eq!(
            session.storage_url().map(Url::as_str),
            Some("https://storage.example/v1/acct")
        );
    }

    #[test]
    fn test_from_auth_response_unauthorized() {
        let fields = ResponseFields::with_status(401, "Unauthorized");
        let err = AuthSession::from_auth_response(&fields).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_from_auth_response_unexpected_status() {
        let fields = ResponseFields::with_status(500, "Internal Server Error");
        let err = AuthSession::from_auth_response(&fields).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Invalid response (500): Internal Server Error");
    }

    #[test]
    fn test_from_auth_response_missing_headers() {
        let fields = decode_block("HTTP/1.1 204 No Content\r\nX-Auth-Token: tok\r\n");
        let err = AuthSession::from_auth_response(&fields).unwrap_err();
        assert!(err.is_invalid_response());
    }

    #[test]
    fn test_load_cached_requires_all_values() {
        let err = AuthSession::load_cached("tok", "", "https://cdn.example").unwrap_err();
        assert!(err.is_syntax());

        let session =
            AuthSession::load_cached("tok", "https://storage.example", "https://cdn.example")
                .unwrap();
        assert!(session.is_usable());
    }

    #[test]
    fn test_is_usable_with_single_endpoint() {
        let storage = Url::parse("https://storage.example").unwrap();
        assert!(AuthSession::new("tok", Some(storage.clone()), None).is_usable());
        assert!(!AuthSession::new("", Some(storage), None).is_usable());
        assert!(!AuthSession::new("tok", None, None).is_usable());
    }

    #[test]
    fn test_export_import() {
        let session =
            AuthSession::load_cached("token-1234", "https://s.example/v1", "https://c.example/v1")
                .unwrap();
        let restored = AuthSession::import(&session.export().unwrap()).unwrap();
        assert_eq!(restored, session);
        assert_eq!(session.token_masked(), "toke***");
    }
}
