use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use tracing::debug;

use super::{AuthError, AuthHeader, AuthSource, bearer};

pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// A Kubernetes service account token read from a projected volume.
///
/// The file is read once during [`AuthSource::init`]; later rotations of the
/// file are not picked up.
#[derive(Debug)]
pub struct ServiceAccountToken {
    path: PathBuf,
    token: OnceLock<String>,
}

impl ServiceAccountToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            token: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ServiceAccountToken {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_ACCOUNT_TOKEN_PATH)
    }
}

#[async_trait]
impl AuthSource for ServiceAccountToken {
    async fn init(&self, _http: &reqwest::Client) -> Result<(), AuthError> {
        if self.token.get().is_some() {
            return Ok(());
        }

        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| AuthError::ReadTokenFile {
                    path: self.path.clone(),
                    source,
                })?;
        let token = contents.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyTokenFile {
                path: self.path.clone(),
            });
        }

        debug!(path = %self.path.display(), "loaded service account token");
        let _ = self.token.set(token.to_string());
        Ok(())
    }

    async fn header(&self) -> Result<AuthHeader, AuthError> {
        let token = self.token.get().ok_or(AuthError::NotInitialized)?;
        bearer(token)
    }
}
