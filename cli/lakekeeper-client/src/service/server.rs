use reqwest::Method;
use tracing::instrument;

use crate::client::Client;
use crate::error::ClientError;
use crate::request::RequestOption;
use crate::types::{BootstrapRequest, ServerInfo, User};

impl Client {
    /// `GET /info`
    #[instrument(skip_all)]
    pub async fn server_info(&self, options: &[RequestOption]) -> Result<ServerInfo, ClientError> {
        let request = self.new_request::<()>(Method::GET, "/info", None, options)?;
        self.execute(&request).await
    }

    /// `POST /bootstrap`
    ///
    /// Prefer [`Client::ensure_bootstrapped`], which checks the server state
    /// first and tolerates concurrent bootstraps.
    #[instrument(skip_all)]
    pub async fn bootstrap(
        &self,
        body: &BootstrapRequest,
        options: &[RequestOption],
    ) -> Result<(), ClientError> {
        let request = self.new_request(Method::POST, "/bootstrap", Some(body), options)?;
        self.execute_unit(&request).await
    }

    /// `GET /whoami`
    #[instrument(skip_all)]
    pub async fn whoami(&self, options: &[RequestOption]) -> Result<User, ClientError> {
        let request = self.new_request::<()>(Method::GET, "/whoami", None, options)?;
        self.execute(&request).await
    }
}
