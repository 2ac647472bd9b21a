use std::fmt;

use async_trait::async_trait;

use super::{AuthError, AuthHeader, AuthSource, bearer};

/// A fixed bearer token.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = token.into();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(Self { token })
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthSource for StaticToken {
    async fn init(&self, _http: &reqwest::Client) -> Result<(), AuthError> {
        Ok(())
    }

    async fn header(&self) -> Result<AuthHeader, AuthError> {
        bearer(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected() {
        assert!(matches!(StaticToken::new(""), Err(AuthError::EmptyToken)));
    }

    #[tokio::test]
    async fn header_is_bearer_token() {
        let source = StaticToken::new("s3cr3t").unwrap();
        let (_, value) = source.header().await.unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer s3cr3t");
        assert!(!format!("{source:?}").contains("s3cr3t"));
    }
}
