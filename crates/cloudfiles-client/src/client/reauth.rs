//! Opt-in re-authentication.

use super::Authentication;

/// What a [`Connection`](super::Connection) does when the service rejects the
/// session token.
///
/// With [`ReauthPolicy::Once`] an operation that fails with an authentication
/// error re-runs the exchange and is retried exactly once; a second rejection
/// is returned to the caller. Uploads from a reader are not replayed, since
/// the body was already consumed: the session is refreshed and the first
/// error returned.
#[derive(Debug, Clone, Default)]
pub enum ReauthPolicy {
    /// Authentication errors are returned as is.
    #[default]
    Disabled,
    /// Authenticate again and retry once.
    Once(Authentication),
}

impl ReauthPolicy {
    /// Creates a policy that re-authenticates with `authentication`.
    pub fn once(authentication: Authentication) -> Self {
        Self::Once(authentication)
    }

    /// Returns whether re-authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Once(_))
    }

    pub(crate) fn authentication(&self) -> Option<&Authentication> {
        match self {
            Self::Disabled => None,
            Self::Once(authentication) => Some(authentication),
        }
    }
}
