//! Construction of transport-ready requests.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ClientError;

/// Header scoping a request to a project.
pub const PROJECT_ID_HEADER: &str = "x-project-id";

fn application_json() -> HeaderValue {
    HeaderValue::from_static("application/json")
}

/// A request ready to be handed to the transport.
///
/// Built once per call and reused unchanged for every retry attempt.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    wire_path: String,
    query: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    headers: HeaderMap,
    cancel: Option<CancellationToken>,
}

impl Request {
    /// Build a request for `path`, relative to the client's base URL.
    ///
    /// For read verbs (`GET`, `HEAD`, `DELETE`) `params` is encoded as query
    /// parameters, for every other verb as the JSON body. `options` are applied
    /// in order after the headers are seeded, so later options win.
    pub fn build<T>(
        method: Method,
        path: &str,
        params: Option<&T>,
        options: &[RequestOption],
    ) -> Result<Self, ClientError>
    where
        T: Serialize + ?Sized,
    {
        if !path.starts_with('/') {
            return Err(ClientError::InvalidRequest(format!(
                "path must start with '/': {path}"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, application_json());

        let is_read = is_read_method(&method);
        let mut query = Vec::new();
        let mut body = None;

        if is_read {
            if let Some(params) = params {
                let value = serde_json::to_value(params).map_err(ClientError::EncodeOptions)?;
                query = encode_query(&value)?;
            }
        } else {
            headers.insert(CONTENT_TYPE, application_json());
            if let Some(params) = params {
                body = Some(serde_json::to_vec(params).map_err(ClientError::EncodeOptions)?);
            }
        }

        let mut request = Self {
            method,
            path: url_escape::decode(path).into_owned(),
            wire_path: wire_path(path),
            query,
            body,
            headers,
            cancel: None,
        };

        for option in options {
            option.apply(&mut request)?;
        }
        Ok(request)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The percent-decoded path, for display and logging.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The percent-encoded path sent on the wire.
    pub fn wire_path(&self) -> &str {
        &self.wire_path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Set a query parameter, replacing all previous values for `key`.
    pub fn set_query(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.query.retain(|(existing, _)| *existing != key);
        self.query.push((key, value.into()));
    }

    /// The full URL of this request below `base`.
    pub(crate) fn url(&self, base: &Url) -> Result<Url, ClientError> {
        let joined = format!("{}{}", base.as_str().trim_end_matches('/'), self.wire_path);
        let mut url = Url::parse(&joined)
            .map_err(|err| ClientError::InvalidRequest(format!("invalid url '{joined}': {err}")))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

fn is_read_method(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::DELETE].contains(method)
}

/// Re-encode every path segment after decoding it once.
fn wire_path(path: &str) -> String {
    path.split('/')
        .map(|segment| url_escape::encode_component(&url_escape::decode(segment)).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-encode a value for use as a single path segment.
pub fn path_escape(segment: &str) -> String {
    url_escape::encode_component(segment).into_owned()
}

/// Flatten an options value into query parameters.
///
/// `null`, empty strings and empty arrays are omitted. Arrays become repeated
/// parameters. Nested objects cannot be expressed and are rejected.
fn encode_query(value: &Value) -> Result<Vec<(String, String)>, ClientError> {
    let fields = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(fields) => fields,
        other => {
            return Err(ClientError::InvalidRequest(format!(
                "query options must be a map of fields, got {other}"
            )));
        },
    };

    let mut pairs = Vec::new();
    for (key, value) in fields {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(item) = query_scalar(key, item)? {
                        pairs.push((key.clone(), item));
                    }
                }
            },
            other => {
                if let Some(value) = query_scalar(key, other)? {
                    pairs.push((key.clone(), value));
                }
            },
        }
    }
    Ok(pairs)
}

fn query_scalar(key: &str, value: &Value) -> Result<Option<String>, ClientError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(ClientError::InvalidRequest(format!(
            "query parameter '{key}' must be a scalar or a list of scalars"
        ))),
    }
}

type ApplyFn = dyn Fn(&mut Request) -> Result<(), ClientError> + Send + Sync;

/// A mutation applied to a request after it is built.
///
/// Client-wide defaults are applied first, per-call options after them.
#[derive(Clone)]
pub struct RequestOption(Arc<ApplyFn>);

impl RequestOption {
    pub fn custom(
        apply: impl Fn(&mut Request) -> Result<(), ClientError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(apply))
    }

    /// Set a header, replacing any previous value.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::custom(move |request| {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ClientError::InvalidRequest(format!("invalid header name '{name}': {err}"))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|err| {
                ClientError::InvalidRequest(format!("invalid value for header '{name}': {err}"))
            })?;
            request.headers.insert(header_name, header_value);
            Ok(())
        })
    }

    /// Set a query parameter, replacing any previous values.
    pub fn query(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        Self::custom(move |request| {
            request.set_query(key.clone(), value.clone());
            Ok(())
        })
    }

    /// Abort the request, including pending retries, once `token` is cancelled.
    pub fn cancel_on(token: CancellationToken) -> Self {
        Self::custom(move |request| {
            request.cancel = Some(token.clone());
            Ok(())
        })
    }

    pub fn project_id(project_id: impl Into<String>) -> Self {
        Self::header(PROJECT_ID_HEADER, project_id)
    }

    pub(crate) fn apply(&self, request: &mut Request) -> Result<(), ClientError> {
        (self.0)(request)
    }
}

impl fmt::Debug for RequestOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestOption").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn pairs(query: &[(String, String)]) -> Vec<(&str, &str)> {
        let mut pairs: Vec<_> = query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn read_verbs_encode_options_as_query() {
        let params = json!({
            "project-id": "p1",
            "warehouse-status": ["active", "inactive"],
            "page-token": "",
            "page-size": null,
            "force": false,
        });
        let request = Request::build(Method::GET, "/warehouse", Some(&params), &[]).unwrap();

        assert_eq!(pairs(request.query()), vec![
            ("force", "false"),
            ("project-id", "p1"),
            ("warehouse-status", "active"),
            ("warehouse-status", "inactive"),
        ]);
        assert_eq!(request.body(), None);
        assert_eq!(request.headers().get(ACCEPT).unwrap(), "application/json");
        assert!(request.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn write_verbs_encode_options_as_body() {
        let params = json!({"warehouse-name": "wh"});
        let request = Request::build(Method::POST, "/warehouse", Some(&params), &[]).unwrap();

        assert!(request.query().is_empty());
        assert_eq!(
            serde_json::from_slice::<Value>(request.body().unwrap()).unwrap(),
            params
        );
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn nested_query_values_fail_before_io() {
        let params = json!({"filter": {"name": "x"}});
        let err = Request::build(Method::GET, "/warehouse", Some(&params), &[]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)), "{err}");

        let err = Request::build(Method::GET, "/warehouse", Some(&json!(["a"])), &[]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)), "{err}");
    }

    #[test]
    fn relative_path_is_required() {
        let err = Request::build::<()>(Method::GET, "info", None, &[]).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn path_is_decoded_for_display_and_reencoded_for_wire() {
        let path = format!("/warehouse/{}/storage", path_escape("a b/c"));
        let request = Request::build::<()>(Method::POST, &path, None, &[]).unwrap();

        assert_eq!(request.wire_path(), "/warehouse/a%20b%2Fc/storage");
        assert_eq!(request.path(), "/warehouse/a b/c/storage");
    }

    #[test]
    fn later_options_override_earlier_ones() {
        let defaults = [
            RequestOption::header("x-project-id", "default"),
            RequestOption::query("page-size", "10"),
        ];
        let per_call = [
            RequestOption::project_id("override"),
            RequestOption::query("page-size", "50"),
        ];
        let options: Vec<_> = defaults.iter().chain(&per_call).cloned().collect();
        let request = Request::build::<()>(Method::GET, "/warehouse", None, &options).unwrap();

        assert_eq!(request.headers().get(PROJECT_ID_HEADER).unwrap(), "override");
        assert_eq!(pairs(request.query()), vec![("page-size", "50")]);
    }

    #[test]
    fn invalid_header_option_fails_build() {
        let err = Request::build::<()>(Method::GET, "/info", None, &[RequestOption::header(
            "bad header",
            "v",
        )])
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)), "{err}");
    }

    #[test]
    fn url_joins_base_path_and_query() {
        let base = Url::parse("http://localhost:8181/management/v1").unwrap();
        let params = json!({"warehouse-status": ["active", "inactive"]});
        let request = Request::build(Method::GET, "/warehouse", Some(&params), &[]).unwrap();

        assert_eq!(
            request.url(&base).unwrap().as_str(),
            "http://localhost:8181/management/v1/warehouse?warehouse-status=active&warehouse-status=inactive"
        );
    }

    #[test]
    fn cancellation_option_is_attached() {
        let token = CancellationToken::new();
        let request = Request::build::<()>(Method::GET, "/info", None, &[
            RequestOption::cancel_on(token.clone()),
        ])
        .unwrap();
        token.cancel();
        assert!(request.cancellation().unwrap().is_cancelled());
    }
}
