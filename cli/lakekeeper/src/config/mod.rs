use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use lakekeeper_client::auth::{AuthSource, ClientCredentials, ServiceAccountToken, StaticToken};
use lakekeeper_client::types::UserType;
use lakekeeper_client::{BootstrapConfig, ClientConfig, DEFAULT_BASE_URL, RetryConfig};
use serde::Deserialize;
use tracing::debug;
use xdg::BaseDirectories;

/// Name of the lakekeeper config directory below `$XDG_CONFIG_HOME`
pub const LAKEKEEPER_DIR_NAME: &str = "lakekeeper";
pub const LAKEKEEPER_CONFIG_FILE: &str = "lakekeeper.toml";
const LAKEKEEPER_CONFIG_DIR_VAR: &str = "LAKEKEEPER_CONFIG_DIR";
const ENV_PREFIX: &str = "LAKEKEEPER";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server root or management API URL
    pub server_url: String,

    /// Static bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// OAuth2 client credentials, used when no static token is set
    #[serde(default)]
    pub oauth: Option<OAuthConfig>,

    /// Authenticate with the pod's Kubernetes service account token
    #[serde(default)]
    pub use_kubernetes_auth: bool,

    /// Overrides the default service account token location
    #[serde(default)]
    pub kubernetes_token_path: Option<PathBuf>,

    #[serde(default)]
    pub user_agent: Option<String>,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OAuthConfig {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrySettings {
    pub enabled: bool,
    pub max_retries: u32,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            enabled: defaults.enabled,
            max_retries: defaults.max_retries,
            min_wait_ms: defaults.min_wait.as_millis() as u64,
            max_wait_ms: defaults.max_wait.as_millis() as u64,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            enabled: settings.enabled,
            max_retries: settings.max_retries,
            min_wait: Duration::from_millis(settings.min_wait_ms),
            max_wait: Duration::from_millis(settings.max_wait_ms),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BootstrapSettings {
    pub enabled: bool,
    pub is_operator: bool,
    pub user_type: UserType,
}

impl Config {
    /// Read the config from defaults, the config file and `LAKEKEEPER_*` variables.
    ///
    /// The config file is looked up in `$LAKEKEEPER_CONFIG_DIR`, falling back to
    /// `$XDG_CONFIG_HOME/lakekeeper`.
    pub fn parse() -> Result<Config> {
        let config_dir = match env::var(LAKEKEEPER_CONFIG_DIR_VAR) {
            Ok(dir) => {
                debug!("`${LAKEKEEPER_CONFIG_DIR_VAR}` set: {dir}");
                Some(PathBuf::from(dir))
            },
            Err(_) => BaseDirectories::with_prefix(LAKEKEEPER_DIR_NAME).get_config_home(),
        };
        Self::parse_from(config_dir.as_deref())
    }

    fn parse_from(config_dir: Option<&Path>) -> Result<Config> {
        let mut builder =
            HierarchicalConfig::builder().set_default("server_url", DEFAULT_BASE_URL)?;

        if let Some(config_dir) = config_dir {
            let config_file = config_dir.join(LAKEKEEPER_CONFIG_FILE);
            debug!(path = %config_file.display(), "reading config file");
            builder = builder.add_source(
                config::File::from(config_file)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // nested keys use a double underscore: LAKEKEEPER_RETRY__MAX_RETRIES
        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(" ")
                .with_list_parse_key("oauth.scopes")
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")
    }

    /// The authentication source selected by this config.
    ///
    /// A static token wins over OAuth2 client credentials, which win over the
    /// Kubernetes service account token.
    pub fn auth_source(&self) -> Result<Option<Arc<dyn AuthSource>>> {
        if let Some(token) = &self.token {
            let source = StaticToken::new(token.clone()).context("Invalid token")?;
            return Ok(Some(Arc::new(source)));
        }

        if let Some(oauth) = &self.oauth {
            let source = ClientCredentials::new(
                oauth.token_url.clone(),
                oauth.client_id.clone(),
                oauth.client_secret.clone(),
            )
            .context("Invalid OAuth2 configuration")?
            .with_scopes(oauth.scopes.clone());
            return Ok(Some(Arc::new(source)));
        }

        if self.use_kubernetes_auth || self.kubernetes_token_path.is_some() {
            let source = match &self.kubernetes_token_path {
                Some(path) => ServiceAccountToken::new(path),
                None => ServiceAccountToken::default(),
            };
            return Ok(Some(Arc::new(source)));
        }

        Ok(None)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            auth: self.auth_source()?,
            user_agent: self.user_agent.clone(),
            retry: RetryConfig::from(&self.retry),
            bootstrap: BootstrapConfig {
                enabled: self.bootstrap.enabled,
                is_operator: self.bootstrap.is_operator,
                user_type: self.bootstrap.user_type,
            },
            ..ClientConfig::new(self.server_url.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    const ALL_VARS: [&str; 6] = [
        "LAKEKEEPER_SERVER_URL",
        "LAKEKEEPER_TOKEN",
        "LAKEKEEPER_RETRY__MAX_RETRIES",
        "LAKEKEEPER_BOOTSTRAP__ENABLED",
        "LAKEKEEPER_OAUTH__SCOPES",
        "LAKEKEEPER_USE_KUBERNETES_AUTH",
    ];

    fn without_env<R>(f: impl FnOnce() -> R) -> R {
        temp_env::with_vars_unset(ALL_VARS, f)
    }

    #[test]
    fn defaults_without_sources() {
        let config = without_env(|| Config::parse_from(None)).unwrap();

        assert_eq!(config.server_url, DEFAULT_BASE_URL);
        assert_eq!(config.retry, RetrySettings::default());
        assert_eq!(config.bootstrap, BootstrapSettings::default());
        assert!(config.auth_source().unwrap().is_none());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LAKEKEEPER_CONFIG_FILE), indoc! {r#"
            server_url = "https://lakekeeper.example.com"
            user_agent = "custom"

            [retry]
            max_retries = 2
            min_wait_ms = 10

            [bootstrap]
            enabled = true
            is_operator = true
            user_type = "application"

            [oauth]
            token_url = "https://idp.example.com/token"
            client_id = "id"
            client_secret = "secret"
            scopes = ["lakekeeper"]
        "#})
        .unwrap();

        let config = without_env(|| Config::parse_from(Some(dir.path()))).unwrap();
        let client_config = config.client_config().unwrap();

        assert_eq!(client_config.base_url, "https://lakekeeper.example.com");
        assert_eq!(client_config.user_agent.as_deref(), Some("custom"));
        assert_eq!(client_config.retry, RetryConfig {
            enabled: true,
            max_retries: 2,
            min_wait: Duration::from_millis(10),
            max_wait: Duration::from_secs(30),
        });
        assert_eq!(client_config.bootstrap, BootstrapConfig {
            enabled: true,
            is_operator: true,
            user_type: UserType::Application,
        });
        assert!(format!("{:?}", client_config.auth).contains("ClientCredentials"));
    }

    #[test]
    fn environment_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LAKEKEEPER_CONFIG_FILE), indoc! {r#"
            server_url = "https://from-file.example.com"

            [retry]
            max_retries = 2
        "#})
        .unwrap();

        let config = temp_env::with_vars(
            [
                ("LAKEKEEPER_SERVER_URL", Some("https://from-env.example.com")),
                ("LAKEKEEPER_RETRY__MAX_RETRIES", Some("7")),
                ("LAKEKEEPER_TOKEN", Some("t0ken")),
            ],
            || Config::parse_from(Some(dir.path())),
        )
        .unwrap();

        assert_eq!(config.server_url, "https://from-env.example.com");
        assert_eq!(config.retry.max_retries, 7);
        assert_eq!(config.token.as_deref(), Some("t0ken"));
        assert!(format!("{:?}", config.auth_source().unwrap()).contains("StaticToken"));
    }

    #[test]
    fn kubernetes_auth_uses_default_path() {
        let config = temp_env::with_vars(
            [("LAKEKEEPER_USE_KUBERNETES_AUTH", Some("true"))],
            || Config::parse_from(None),
        )
        .unwrap();

        let auth = format!("{:?}", config.auth_source().unwrap());
        assert!(auth.contains("/var/run/secrets/kubernetes.io/serviceaccount/token"), "{auth}");
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = temp_env::with_vars([("LAKEKEEPER_TOKEN", Some(""))], || {
            Config::parse_from(None)
        })
        .unwrap();
        assert!(config.auth_source().is_err());
    }
}
