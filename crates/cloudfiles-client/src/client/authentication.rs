//! Authentication exchange.

use std::time::Instant;

use cloudfiles_core::{AuthSession, Credentials, DEFAULT_API_VERSION, Result, Transport};
use tracing::{debug, error, info, instrument};

use crate::TRACING_TARGET_CLIENT;

/// Runs the token exchange for a set of credentials.
///
/// A successful exchange installs the token and endpoints on the transport,
/// so every later request on that transport is authenticated.
#[derive(Debug, Clone)]
pub struct Authentication {
    credentials: Credentials,
    api_version: u32,
    use_internal_network: bool,
}

impl Authentication {
    /// Creates an authentication for the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_version: DEFAULT_API_VERSION,
            use_internal_network: false,
        }
    }

    /// Sets the API version used by the legacy exchange.
    #[must_use]
    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = api_version;
        self
    }

    /// Routes storage traffic over the internal network.
    #[must_use]
    pub fn with_internal_network(mut self, use_internal_network: bool) -> Self {
        self.use_internal_network = use_internal_network;
        self
    }

    /// Returns the credentials.
    #[inline]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns whether storage traffic uses the internal network.
    #[inline]
    pub fn use_internal_network(&self) -> bool {
        self.use_internal_network
    }

    /// Authenticates and installs the resulting session on `transport`.
    ///
    /// # Errors
    ///
    /// - `Syntax` when the identity or the secret is empty.
    /// - `Authentication` when the service rejects the credentials (401).
    /// - `InvalidResponse` for any other non-204 status, or when the response
    ///   lacks the token or both endpoints.
    #[instrument(
        skip(self, transport),
        target = TRACING_TARGET_CLIENT,
        fields(identity = %self.credentials.identity_masked())
    )]
    pub async fn authenticate(&self, transport: &dyn Transport) -> Result<AuthSession> {
        let request = self.credentials.auth_request(self.api_version)?;

        debug!(
            target: TRACING_TARGET_CLIENT,
            legacy = self.credentials.is_legacy(),
            "Authenticating"
        );

        let start = Instant::now();
        let session = match transport.authenticate(request).await {
            Ok(fields) => AuthSession::from_auth_response(&fields),
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed();

        match session {
            Ok(session) => {
                transport
                    .set_credentials(&session, self.use_internal_network)
                    .await;

                info!(
                    target: TRACING_TARGET_CLIENT,
                    token = %session.token_masked(),
                    cdn = session.cdn_management_url().is_some(),
                    elapsed = ?elapsed,
                    "Authenticated"
                );
                Ok(session)
            }
            Err(e) => {
                error!(
                    target: TRACING_TARGET_CLIENT,
                    error = %e,
                    elapsed = ?elapsed,
                    "Authentication failed"
                );
                Err(e)
            }
        }
    }

    /// Installs a previously obtained session without contacting the service.
    ///
    /// All three values are required; an empty or unparsable one fails with
    /// `Syntax`.
    pub async fn load_cached(
        &self,
        transport: &dyn Transport,
        token: &str,
        storage_url: &str,
        cdn_management_url: &str,
    ) -> Result<AuthSession> {
        let session = AuthSession::load_cached(token, storage_url, cdn_management_url)?;
        transport
            .set_credentials(&session, self.use_internal_network)
            .await;

        debug!(
            target: TRACING_TARGET_CLIENT,
            token = %session.token_masked(),
            "Installed cached session"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use cloudfiles_core::ResponseFields;

    use super::*;
    use crate::mock::MockTransport;

    fn auth_ok() -> ResponseFields {
        let mut fields = ResponseFields::with_status(204, "No Content");
        fields.auth_token = Some("tok".into());
        fields.storage_url = Some("https://storage.example/v1/acct".into());
        fields.cdn_management_url = Some("https://cdn.example/v1/acct".into());
        fields
    }

    #[tokio::test]
    async fn test_authenticate_installs_session() {
        let transport = MockTransport::new();
        transport.push_auth(auth_ok());

        let auth = Authentication::new(Credentials::new("u", "k"));
        let session = auth.authenticate(&transport).await.unwrap();

        assert_eq!(session.token(), "tok");
        assert!(transport.is_authenticated().await);
        assert_eq!(transport.auth_calls(), 1);
        assert_eq!(
            transport.endpoints().await.storage().unwrap().as_str(),
            "https://storage.example/v1/acct"
        );
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let transport = MockTransport::new();
        transport.push_auth(ResponseFields::with_status(401, "Unauthorized"));

        let auth = Authentication::new(Credentials::new("u", "bad"));
        let err = auth.authenticate(&transport).await.unwrap_err();

        assert!(err.is_authentication());
        assert!(!transport.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_unexpected_status_and_missing_headers() {
        let transport = MockTransport::new();
        transport.push_auth(ResponseFields::with_status(500, "Internal Server Error"));
        transport.push_auth(ResponseFields::with_status(204, "No Content"));

        let auth = Authentication::new(Credentials::new("u", "k"));
        let err = auth.authenticate(&transport).await.unwrap_err();
        assert_eq!(err.status(), Some(500));

        let err = auth.authenticate(&transport).await.unwrap_err();
        assert!(err.is_invalid_response());
    }

    #[tokio::test]
    async fn test_empty_secret_fails_before_exchange() {
        let transport = MockTransport::new();
        let auth = Authentication::new(Credentials::new("u", ""));

        assert!(auth.authenticate(&transport).await.unwrap_err().is_syntax());
        assert_eq!(transport.auth_calls(), 0);
    }

    #[tokio::test]
    async fn test_load_cached_requires_all_values() {
        let transport = MockTransport::new();
        let auth = Authentication::new(Credentials::new("u", "k"));

        let err = auth
            .load_cached(&transport, "tok", "https://storage.example/v1/acct", "")
            .await
            .unwrap_err();
        assert!(err.is_syntax());
        assert!(!transport.is_authenticated().await);

        auth.load_cached(
            &transport,
            "tok",
            "https://storage.example/v1/acct",
            "https://cdn.example/v1/acct",
        )
        .await
        .unwrap();
        assert!(transport.is_authenticated().await);
        assert_eq!(transport.auth_calls(), 0);
    }
}
