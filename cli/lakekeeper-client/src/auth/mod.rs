//! Pluggable authentication for outgoing requests.
//!
//! An [`AuthSource`] is initialized once per client and then asked for a
//! header on every attempt of every request.

mod kubernetes;
mod oauth;
mod token;

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue, InvalidHeaderValue};
use thiserror::Error;

pub use kubernetes::{DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH, ServiceAccountToken};
pub use oauth::ClientCredentials;
pub use token::StaticToken;

/// A header name and value to attach to a request.
pub type AuthHeader = (HeaderName, HeaderValue);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication token is empty")]
    EmptyToken,
    #[error("could not read service account token from '{}'", path.display())]
    ReadTokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("service account token file '{}' is empty", path.display())]
    EmptyTokenFile { path: PathBuf },
    #[error("authentication source was used before it was initialized")]
    NotInitialized,
    #[error("invalid OAuth2 token url")]
    InvalidTokenUrl(#[source] oauth2::url::ParseError),
    #[error("failed to obtain OAuth2 token: {0}")]
    TokenRequest(String),
    #[error("token is not a valid header value")]
    InvalidHeader(#[source] InvalidHeaderValue),
}

/// Supplies the authentication header for outgoing requests.
///
/// Implementations may cache and refresh credentials internally, but callers
/// never need to know which implementation is active.
#[async_trait]
pub trait AuthSource: Debug + Send + Sync {
    /// Prepare the source. The client calls this at most once.
    async fn init(&self, http: &reqwest::Client) -> Result<(), AuthError>;

    /// The header for the next request, refreshing credentials if needed.
    async fn header(&self) -> Result<AuthHeader, AuthError>;
}

/// `Authorization: Bearer <token>`, marked sensitive so it is not logged.
pub(crate) fn bearer(token: &str) -> Result<AuthHeader, AuthError> {
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(AuthError::InvalidHeader)?;
    value.set_sensitive(true);
    Ok((AUTHORIZATION, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_sensitive() {
        let (name, value) = bearer("abc").unwrap();
        assert_eq!(name, AUTHORIZATION);
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_rejects_empty_and_invalid_tokens() {
        assert!(matches!(bearer(""), Err(AuthError::EmptyToken)));
        assert!(matches!(
            bearer("line\nbreak"),
            Err(AuthError::InvalidHeader(_))
        ));
    }
}
