//! Error handling for management API operations.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::codec::CodecError;

/// The structured error body returned by the management API.
///
/// Responses carry it wrapped in an envelope: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorModel {
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub stack: Vec<String>,
    /// Stable identifier of the error, suitable for programmatic branching.
    #[serde(rename = "type")]
    pub error_type: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorModel,
}

/// The body of an unsuccessful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorBody {
    /// The body matched the service's error shape.
    Structured(ErrorModel),
    /// Anything else, kept verbatim.
    Unstructured(String),
}

/// An unsuccessful response from the management API.
///
/// Status and headers are retained so callers can inspect them even though
/// the call failed.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    headers: HeaderMap,
    body: ApiErrorBody,
}

impl ApiError {
    /// Classify a response body that was read after an unsuccessful status.
    pub(crate) fn from_parts(status: StatusCode, headers: HeaderMap, body: &[u8]) -> Self {
        let body = match serde_json::from_slice::<ErrorEnvelope>(body) {
            Ok(envelope) => ApiErrorBody::Structured(envelope.error),
            Err(_) => ApiErrorBody::Unstructured(String::from_utf8_lossy(body).into_owned()),
        };
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &ApiErrorBody {
        &self.body
    }

    /// The structured error, if the body could be parsed as one.
    pub fn model(&self) -> Option<&ErrorModel> {
        match &self.body {
            ApiErrorBody::Structured(model) => Some(model),
            ApiErrorBody::Unstructured(_) => None,
        }
    }

    /// The `type` of a structured error.
    pub fn error_type(&self) -> Option<&str> {
        self.model().map(|model| model.error_type.as_str())
    }

    /// The structured message, or the raw body for unstructured errors.
    pub fn message(&self) -> &str {
        match &self.body {
            ApiErrorBody::Structured(model) => &model.message,
            ApiErrorBody::Unstructured(raw) => raw,
        }
    }

    /// 401 and 403 responses.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            ApiErrorBody::Structured(model) => write!(
                f,
                "{}: {} ({})",
                self.status, model.message, model.error_type
            ),
            ApiErrorBody::Unstructured(raw) => write!(f, "{}: {raw}", self.status),
        }
    }
}

impl std::error::Error for ApiError {}

/// Failure to obtain any response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request was cancelled")]
    Cancelled,
    #[error("request failed")]
    Http(#[source] reqwest::Error),
}

/// Common error type for management API operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be built; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid base url '{url}'")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to encode request options")]
    EncodeOptions(#[source] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    /// A successful response whose body did not match the expected type.
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),
    #[error("failed to write response body")]
    WriteBody(#[source] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("authentication failed")]
    Auth(#[source] Arc<AuthError>),
    #[error("failed to bootstrap server")]
    Bootstrap(#[source] Arc<ClientError>),
}

impl ClientError {
    /// The API error behind this error, looking through bootstrap failures.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            ClientError::Bootstrap(err) => err.api_error(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.api_error().map(ApiError::status)
    }

    /// The `type` of a structured API error.
    pub fn error_type(&self) -> Option<&str> {
        self.api_error().and_then(ApiError::error_type)
    }

    /// Whether the server rejected the caller's credentials (401/403), or
    /// credentials could not be obtained locally.
    pub fn is_auth_error(&self) -> bool {
        match self {
            ClientError::Auth(_) => true,
            other => other.api_error().is_some_and(ApiError::is_auth_error),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Transport(TransportError::Cancelled))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn structured_error_body_is_parsed() {
        let body = json!({
            "error": {
                "code": 409,
                "message": "Warehouse already exists",
                "stack": ["at create_warehouse"],
                "type": "WarehouseAlreadyExists"
            }
        });
        let err = ApiError::from_parts(
            StatusCode::CONFLICT,
            HeaderMap::new(),
            body.to_string().as_bytes(),
        );

        assert_eq!(
            err.body(),
            &ApiErrorBody::Structured(ErrorModel {
                code: 409,
                message: "Warehouse already exists".to_string(),
                stack: vec!["at create_warehouse".to_string()],
                error_type: "WarehouseAlreadyExists".to_string(),
            })
        );
        assert_eq!(err.error_type(), Some("WarehouseAlreadyExists"));
        assert_eq!(
            err.to_string(),
            "409 Conflict: Warehouse already exists (WarehouseAlreadyExists)"
        );
    }

    #[test]
    fn missing_stack_is_accepted() {
        let body = br#"{"error":{"code":400,"message":"bad","type":"BadRequest"}}"#;
        let err = ApiError::from_parts(StatusCode::BAD_REQUEST, HeaderMap::new(), body);
        assert_eq!(err.error_type(), Some("BadRequest"));
    }

    #[test]
    fn unstructured_body_becomes_message_verbatim() {
        let body = b"<html>502 Bad Gateway</html>\n";
        let err = ApiError::from_parts(StatusCode::BAD_GATEWAY, HeaderMap::new(), body);

        assert_eq!(err.message(), "<html>502 Bad Gateway</html>\n");
        assert_eq!(err.error_type(), None);
        assert!(matches!(err.body(), ApiErrorBody::Unstructured(_)));
    }

    #[test]
    fn json_without_envelope_is_unstructured() {
        let body = br#"{"detail":"not found"}"#;
        let err = ApiError::from_parts(StatusCode::NOT_FOUND, HeaderMap::new(), body);
        assert_eq!(err.message(), r#"{"detail":"not found"}"#);
    }

    #[test]
    fn auth_predicate_covers_401_and_403_only() {
        for (status, expected) in [
            (StatusCode::UNAUTHORIZED, true),
            (StatusCode::FORBIDDEN, true),
            (StatusCode::NOT_FOUND, false),
            (StatusCode::INTERNAL_SERVER_ERROR, false),
        ] {
            let err = ClientError::Api(ApiError::from_parts(status, HeaderMap::new(), b""));
            assert_eq!(err.is_auth_error(), expected, "status {status}");
        }
    }

    #[test]
    fn bootstrap_error_exposes_inner_api_error() {
        let inner = ClientError::Api(ApiError::from_parts(
            StatusCode::FORBIDDEN,
            HeaderMap::new(),
            b"denied",
        ));
        let err = ClientError::Bootstrap(Arc::new(inner));
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(err.is_auth_error());
    }
}
