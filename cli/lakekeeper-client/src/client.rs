//! Management API client and its retrying transport.

use std::fmt::Debug;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::auth::AuthError;
use crate::config::{ClientConfig, DEFAULT_USER_AGENT, normalize_base_url};
use crate::error::{ApiError, ClientError, TransportError};
use crate::once::OnceResult;
use crate::request::{Request, RequestOption};
use crate::retry::{is_retryable_status, is_retryable_transport_error};

/// Statuses treated as success. Everything else is classified as an [`ApiError`].
pub const SUCCESS_STATUSES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
    StatusCode::NOT_MODIFIED,
];

/// A client for the Lakekeeper management API.
///
/// This handles:
/// - HTTP client configuration with timeouts and user agent
/// - one-time initialization of the configured [`AuthSource`](crate::auth::AuthSource)
/// - retries with linear backoff for transient failures
/// - optional one-time server bootstrap, see [`Client::connect`]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    config: ClientConfig,

    auth_init: OnceResult<AuthError>,
    pub(crate) bootstrap_guard: OnceResult<ClientError>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client from configuration.
    ///
    /// No requests are made. Authentication is initialized on first use and
    /// the server is not bootstrapped; use [`Client::connect`] for both.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = build_http_client(&config, &base_url)?;

        Ok(Self {
            http,
            base_url,
            config,
            auth_init: OnceResult::new(),
            bootstrap_guard: OnceResult::new(),
        })
    }

    /// Create a client, initialize authentication and, if enabled,
    /// bootstrap the server.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        client.ensure_auth().await?;
        if client.config.bootstrap.enabled {
            client.ensure_bootstrapped().await?;
        }
        Ok(client)
    }

    /// The management API URL all request paths are relative to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Update the client configuration and recreate the client.
    ///
    /// Authentication and bootstrap state are reset.
    pub fn update_config(
        &mut self,
        update: impl FnOnce(&mut ClientConfig),
    ) -> Result<(), ClientError> {
        let mut modified_config = self.config.clone();
        update(&mut modified_config);
        *self = Self::new(modified_config)?;
        Ok(())
    }

    async fn ensure_auth(&self) -> Result<(), ClientError> {
        let Some(auth) = &self.config.auth else {
            return Ok(());
        };
        self.auth_init
            .ensure(|| auth.init(&self.http))
            .await
            .map_err(ClientError::Auth)
    }

    /// Build a request, applying the client's default options before `options`.
    pub fn new_request<T>(
        &self,
        method: Method,
        path: &str,
        params: Option<&T>,
        options: &[RequestOption],
    ) -> Result<Request, ClientError>
    where
        T: Serialize + ?Sized,
    {
        let options: Vec<RequestOption> = self
            .config
            .default_options
            .iter()
            .chain(options)
            .cloned()
            .collect();
        Request::build(method, path, params, &options)
    }

    /// Send `request`, retrying transient failures, and return a successful response.
    ///
    /// Unsuccessful responses are read and returned as [`ClientError::Api`].
    pub async fn send(&self, request: &Request) -> Result<reqwest::Response, ClientError> {
        let url = request.url(&self.base_url)?;
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts();
        let cancel = request.cancellation();

        let mut attempt = 1;
        loop {
            debug!(
                method = %request.method(),
                path = request.path(),
                attempt,
                "sending request"
            );
            let outcome = cancellable(cancel, self.attempt(request, &url)).await?;

            let retry_reason = match &outcome {
                Ok(response) if is_retryable_status(response.status()) => {
                    Some(response.status().to_string())
                },
                Err(ClientError::Transport(TransportError::Http(err)))
                    if is_retryable_transport_error(err) =>
                {
                    Some(err.to_string())
                },
                _ => None,
            };

            let Some(reason) = retry_reason.filter(|_| attempt < max_attempts) else {
                let response = outcome?;
                return cancellable(cancel, classify(response)).await?;
            };

            let wait = retry.backoff(attempt);
            warn!(
                method = %request.method(),
                path = request.path(),
                attempt,
                max_attempts,
                wait_ms = wait.as_millis() as u64,
                %reason,
                "request failed, retrying"
            );
            drop(outcome);
            cancellable(cancel, tokio::time::sleep(wait)).await?;
            attempt += 1;
        }
    }

    async fn attempt(&self, request: &Request, url: &Url) -> Result<reqwest::Response, ClientError> {
        self.ensure_auth().await?;

        let mut headers = request.headers().clone();
        if let Some(auth) = &self.config.auth {
            if !headers.contains_key(AUTHORIZATION) {
                let (name, value) = auth
                    .header()
                    .await
                    .map_err(|err| ClientError::Auth(Arc::new(err)))?;
                headers.insert(name, value);
            }
        }

        let mut builder = self
            .http
            .request(request.method().clone(), url.clone())
            .headers(headers);
        if let Some(body) = request.body() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await.map_err(TransportError::Http)?;
        debug!(
            method = %request.method(),
            path = request.path(),
            status = %response.status(),
            "received response"
        );
        Ok(response)
    }

    /// Send `request` and decode the JSON body of the successful response.
    ///
    /// An empty body decodes like JSON `null`, so a struct target fails with
    /// [`ClientError::Decode`]. For endpoints that may answer without a body,
    /// decode into `Option<T>` or use [`Client::execute_unit`].
    pub async fn execute<T>(&self, request: &Request) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(request).await?;
        let bytes = cancellable(request.cancellation(), response.bytes())
            .await?
            .map_err(TransportError::Http)?;
        decode_body(&bytes)
    }

    /// Send `request` and discard the body of the successful response.
    pub async fn execute_unit(&self, request: &Request) -> Result<(), ClientError> {
        self.send(request).await.map(drop)
    }

    /// Send `request` and stream the raw body of the successful response into `sink`.
    ///
    /// Returns the number of bytes written.
    pub async fn download<W>(&self, request: &Request, sink: &mut W) -> Result<u64, ClientError>
    where
        W: Write + ?Sized,
    {
        let mut response = self.send(request).await?;
        let mut written = 0;
        while let Some(chunk) = cancellable(request.cancellation(), response.chunk())
            .await?
            .map_err(TransportError::Http)?
        {
            sink.write_all(&chunk).map_err(ClientError::WriteBody)?;
            written += chunk.len() as u64;
        }
        sink.flush().map_err(ClientError::WriteBody)?;
        Ok(written)
    }
}

/// Race `future` against cancellation of `token`.
async fn cancellable<F>(token: Option<&CancellationToken>, future: F) -> Result<F::Output, ClientError>
where
    F: Future,
{
    let Some(token) = token else {
        return Ok(future.await);
    };
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(TransportError::Cancelled.into()),
        output = future => Ok(output),
    }
}

/// Pass successful responses through; read the body of anything else into an [`ApiError`].
async fn classify(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if SUCCESS_STATUSES.contains(&status) {
        return Ok(response);
    }

    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(TransportError::Http)?;
    let err = ApiError::from_parts(status, headers, &body);
    debug!(%status, error_type = err.error_type(), "request failed");
    Err(err.into())
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ClientError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null).map_err(ClientError::Decode);
    }
    serde_json::from_slice(bytes).map_err(ClientError::Decode)
}

fn build_http_client(config: &ClientConfig, base_url: &Url) -> Result<reqwest::Client, ClientError> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    debug!(
        base_url = base_url.as_str(),
        has_auth = config.auth.is_some(),
        default_options = config.default_options.len(),
        user_agent,
        "building management API HTTP client"
    );

    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .user_agent(user_agent)
        .build()
        .map_err(ClientError::HttpClient)
}
