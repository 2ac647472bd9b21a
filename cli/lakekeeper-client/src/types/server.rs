//! Server status, bootstrap and identity types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response of `GET /info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerInfo {
    #[serde(default)]
    pub version: String,
    pub bootstrapped: bool,
    #[serde(default)]
    pub server_id: Option<Uuid>,
    #[serde(default)]
    pub default_project_id: Option<String>,
    #[serde(default)]
    pub authz_backend: Option<String>,
    #[serde(default)]
    pub aws_system_identities_enabled: bool,
    #[serde(default)]
    pub azure_system_identities_enabled: bool,
    #[serde(default)]
    pub gcp_system_identities_enabled: bool,
    #[serde(default)]
    pub queues: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Human,
    Application,
}

/// Body of `POST /bootstrap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BootstrapRequest {
    pub accept_terms_of_use: bool,
    #[serde(default)]
    pub is_operator: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

/// The authenticated principal, as returned by `GET /whoami`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub user_type: UserType,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
