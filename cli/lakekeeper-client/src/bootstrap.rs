//! One-time server bootstrap.

use tracing::{debug, info};

use crate::client::Client;
use crate::error::ClientError;
use crate::types::{BootstrapRequest, UserType};

/// Error type returned when another client bootstrapped the server first.
///
/// Treated as success. This is the only error swallowed during bootstrap; if
/// the server starts reporting the race differently this needs revisiting.
pub const ALREADY_BOOTSTRAPPED_ERROR_TYPE: &str = "CatalogAlreadyBootstrapped";

/// Bootstrap settings used by [`Client::connect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Bootstrap the server on connect if it is not bootstrapped yet.
    pub enabled: bool,
    /// Make the bootstrapping principal the server operator.
    pub is_operator: bool,
    pub user_type: UserType,
}

/// Whether `err` reports that the server was already bootstrapped.
pub fn is_already_bootstrapped(err: &ClientError) -> bool {
    err.error_type() == Some(ALREADY_BOOTSTRAPPED_ERROR_TYPE)
}

impl Client {
    /// Bootstrap the server unless it already is.
    ///
    /// Runs at most once per client, even when called concurrently. The outcome,
    /// including failure, is shared by every caller.
    pub async fn ensure_bootstrapped(&self) -> Result<(), ClientError> {
        self.bootstrap_guard
            .ensure(|| self.bootstrap_once())
            .await
            .map_err(ClientError::Bootstrap)
    }

    async fn bootstrap_once(&self) -> Result<(), ClientError> {
        let server_info = self.server_info(&[]).await?;
        if server_info.bootstrapped {
            debug!("server is already bootstrapped");
            return Ok(());
        }

        let settings = &self.config().bootstrap;
        let request = BootstrapRequest {
            accept_terms_of_use: true,
            is_operator: settings.is_operator,
            user_name: None,
            user_email: None,
            user_type: Some(settings.user_type),
        };

        match self.bootstrap(&request, &[]).await {
            Ok(()) => {
                info!(is_operator = settings.is_operator, "bootstrapped server");
                Ok(())
            },
            Err(err) if is_already_bootstrapped(&err) => {
                debug!("server was bootstrapped concurrently");
                Ok(())
            },
            Err(err) => Err(err),
        }
    }
}
