use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicRequestTokenError};
use oauth2::{
    ClientId,
    ClientSecret,
    EndpointNotSet,
    EndpointSet,
    HttpClientError,
    RequestTokenError,
    Scope,
    TokenResponse,
    TokenUrl,
};
use tokio::sync::Mutex;
use tracing::debug;

use super::{AuthError, AuthHeader, AuthSource, bearer};

type TokenClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Tokens this close to expiry are renewed before use.
const EXPIRY_LEEWAY: Duration = Duration::from_secs(30);

struct CachedToken {
    access_token: String,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at
            .is_none_or(|expires_at| now + EXPIRY_LEEWAY < expires_at)
    }
}

/// OAuth2 client credentials grant.
///
/// The access token is cached and renewed transparently once it is about to
/// expire. Concurrent callers wait for a single renewal.
pub struct ClientCredentials {
    client: TokenClient,
    scopes: Vec<Scope>,
    http: OnceLock<reqwest::Client>,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentials {
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let token_url = TokenUrl::new(token_url.into()).map_err(AuthError::InvalidTokenUrl)?;
        let client = BasicClient::new(ClientId::new(client_id.into()))
            .set_client_secret(ClientSecret::new(client_secret.into()))
            .set_token_uri(token_url);

        Ok(Self {
            client,
            scopes: Vec::new(),
            http: OnceLock::new(),
            cached: Mutex::new(None),
        })
    }

    pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scopes = scopes
            .into_iter()
            .map(|scope| Scope::new(scope.into()))
            .collect();
        self
    }

    async fn fetch(&self, http: &reqwest::Client) -> Result<CachedToken, AuthError> {
        debug!(
            token_url = self.client.token_uri().as_str(),
            "requesting OAuth2 access token"
        );
        let response = self
            .client
            .exchange_client_credentials()
            .add_scopes(self.scopes.iter().cloned())
            .request_async(http)
            .await
            .map_err(|err| AuthError::TokenRequest(describe_token_error(&err)))?;

        Ok(CachedToken {
            access_token: response.access_token().secret().to_string(),
            expires_at: response.expires_in().map(|ttl| Instant::now() + ttl),
        })
    }

    /// Return the cached token, fetching a new one if it is missing or stale.
    async fn token_header(&self, http: &reqwest::Client) -> Result<AuthHeader, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(Instant::now())) {
            return bearer(&token.access_token);
        }

        let token = self.fetch(http).await?;
        let header = bearer(&token.access_token);
        *cached = Some(token);
        header
    }
}

fn describe_token_error(err: &BasicRequestTokenError<HttpClientError<reqwest::Error>>) -> String {
    match err {
        RequestTokenError::ServerResponse(response) => response.to_string(),
        RequestTokenError::Request(inner) => format!("{err}: {inner}"),
        other => other.to_string(),
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.client.token_uri().as_str())
            .field("client_id", &self.client.client_id().as_str())
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthSource for ClientCredentials {
    /// Fetches the first token so bad credentials fail client construction.
    async fn init(&self, http: &reqwest::Client) -> Result<(), AuthError> {
        let http = self.http.get_or_init(|| http.clone());
        self.token_header(http).await.map(|_| ())
    }

    async fn header(&self) -> Result<AuthHeader, AuthError> {
        let http = self.http.get().ok_or(AuthError::NotInitialized)?;
        self.token_header(http).await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn token_response(token: &str, expires_in: u64) -> serde_json::Value {
        json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": expires_in,
        })
    }

    #[tokio::test]
    async fn token_is_cached_until_expiry() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .body_contains("grant_type=client_credentials")
                .body_contains("scope=lakekeeper");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(token_response("t1", 3600));
        });

        let source = ClientCredentials::new(server.url("/token"), "id", "secret")
            .unwrap()
            .with_scopes(["lakekeeper"]);
        source.init(&reqwest::Client::new()).await.unwrap();

        for _ in 0..3 {
            let (_, value) = source.header().await.unwrap();
            assert_eq!(value.to_str().unwrap(), "Bearer t1");
        }
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn token_close_to_expiry_is_renewed() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(token_response("short-lived", 5));
        });

        let source = ClientCredentials::new(server.url("/token"), "id", "secret").unwrap();
        source.init(&reqwest::Client::new()).await.unwrap();
        source.header().await.unwrap();
        source.header().await.unwrap();

        mock.assert_hits(3);
    }

    #[tokio::test]
    async fn rejected_credentials_fail_init() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(401)
                .header("content-type", "application/json")
                .json_body(json!({"error": "invalid_client"}));
        });

        let source = ClientCredentials::new(server.url("/token"), "id", "wrong").unwrap();
        let err = source.init(&reqwest::Client::new()).await.unwrap_err();
        assert!(
            matches!(&err, AuthError::TokenRequest(msg) if msg.contains("invalid_client")),
            "{err}"
        );
    }

    #[test]
    fn invalid_token_url_is_rejected() {
        let err = ClientCredentials::new("not a url", "id", "secret").unwrap_err();
        assert!(matches!(err, AuthError::InvalidTokenUrl(_)));
    }

    #[test]
    fn debug_output_omits_secret() {
        let source = ClientCredentials::new("https://idp/token", "id", "hunter2").unwrap();
        assert!(!format!("{source:?}").contains("hunter2"));
    }
}
