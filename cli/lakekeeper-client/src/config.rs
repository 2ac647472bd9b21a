//! Configuration types for client construction.

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::AuthSource;
use crate::bootstrap::BootstrapConfig;
use crate::error::ClientError;
use crate::request::RequestOption;
use crate::retry::RetryConfig;

/// Versioned path of the management API below the server root.
pub const API_PATH: &str = "/management/v1";

pub const DEFAULT_USER_AGENT: &str = concat!("lakekeeper-client/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_BASE_URL: &str = "http://localhost:8181";

/// Configuration for client construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root or management API URL; see [`normalize_base_url`].
    pub base_url: String,
    /// Source of the `Authorization` header. Requests are unauthenticated if unset.
    pub auth: Option<Arc<dyn AuthSource>>,
    /// Defaults to [`DEFAULT_USER_AGENT`].
    pub user_agent: Option<String>,
    /// Applied to every request before its per-call options.
    pub default_options: Vec<RequestOption>,
    pub retry: RetryConfig,
    pub bootstrap: BootstrapConfig,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth: None,
            user_agent: None,
            default_options: Vec::new(),
            retry: RetryConfig::default(),
            bootstrap: BootstrapConfig::default(),
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Strip trailing slashes and append [`API_PATH`] unless it is already the suffix.
pub fn normalize_base_url(base_url: &str) -> Result<Url, ClientError> {
    let trimmed = base_url.trim_end_matches('/');
    let full = if trimmed.ends_with(API_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{API_PATH}")
    };
    Url::parse(&full).map_err(|source| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_path_is_appended_once() {
        for input in [
            "http://localhost:8181",
            "http://localhost:8181/",
            "http://localhost:8181/management/v1",
            "http://localhost:8181/management/v1/",
        ] {
            assert_eq!(
                normalize_base_url(input).unwrap().as_str(),
                "http://localhost:8181/management/v1",
                "input: {input}"
            );
        }
    }

    #[test]
    fn path_prefix_is_kept() {
        assert_eq!(
            normalize_base_url("https://gateway.example.com/lakekeeper/")
                .unwrap()
                .as_str(),
            "https://gateway.example.com/lakekeeper/management/v1"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = normalize_base_url("not a url").unwrap_err();
        assert!(matches!(err, ClientError::InvalidBaseUrl { .. }), "{err}");
    }

    #[test]
    fn default_user_agent_names_the_crate() {
        assert!(DEFAULT_USER_AGENT.starts_with("lakekeeper-client/"));
    }
}
