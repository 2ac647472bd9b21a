//! Typed client for the Lakekeeper management API.
//!
//! This crate provides:
//! - a retrying HTTP transport with pluggable authentication
//! - one-time, race-tolerant server bootstrap
//! - structured classification of API errors
//! - typed storage profiles, storage credentials and delete profiles with a
//!   shared discriminator codec
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use lakekeeper_client::auth::StaticToken;
//! use lakekeeper_client::{Client, ClientConfig, RequestOption};
//!
//! let config = ClientConfig {
//!     auth: Some(Arc::new(StaticToken::new(token)?)),
//!     ..ClientConfig::new("http://localhost:8181")
//! };
//!
//! let client = Client::connect(config).await?;
//! let warehouses = client
//!     .list_warehouses(&Default::default(), &[RequestOption::project_id(project)])
//!     .await?;
//! ```

pub mod auth;
mod bootstrap;
mod client;
pub mod codec;
mod config;
mod error;
mod once;
mod request;
mod retry;
mod service;
pub mod types;

pub use bootstrap::{ALREADY_BOOTSTRAPPED_ERROR_TYPE, BootstrapConfig, is_already_bootstrapped};
pub use client::{Client, SUCCESS_STATUSES};
pub use config::{API_PATH, ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, normalize_base_url};
pub use error::{ApiError, ApiErrorBody, ClientError, ErrorModel, TransportError};
pub use request::{PROJECT_ID_HEADER, Request, RequestOption, path_escape};
pub use retry::{RetryConfig, is_retryable_status};
pub use tokio_util::sync::CancellationToken;
