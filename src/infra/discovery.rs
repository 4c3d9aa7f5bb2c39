use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::services::{ApiRequest, ApiResponse, HttpTransport};

/// Mount points a self-hosted tracker may serve its API under, in probe order.
pub const DEFAULT_PATH_PREFIXES: &[&str] = &["/api/v1", "/api", "/api/public", ""];

const API_KEY_HEADER: &str = "x-api-key";

/// Result of sending a request to a single candidate prefix.
#[derive(Debug)]
enum Attempt {
    Success(Value),
    NotFound,
    Rejected { status: u16, body: String },
    NotJson { content_type: String },
}

impl Attempt {
    fn from_response(response: ApiResponse) -> AppResult<Self> {
        if response.status == 404 {
            return Ok(Attempt::NotFound);
        }
        if !response.is_success() {
            return Ok(Attempt::Rejected {
                status: response.status,
                body: response.body,
            });
        }
        let empty = response.body.trim().is_empty();
        if empty && (response.status == 204 || response.content_type.is_none()) {
            return Ok(Attempt::Success(Value::Null));
        }
        if !response.is_json() {
            return Ok(Attempt::NotJson {
                content_type: response
                    .content_type
                    .unwrap_or_else(|| "<missing>".to_string()),
            });
        }
        if empty {
            return Ok(Attempt::Success(Value::Null));
        }
        let value = serde_json::from_str(&response.body)
            .map_err(|err| AppError::InvalidResponse(format!("malformed JSON body: {err}")))?;
        Ok(Attempt::Success(value))
    }
}

/// Probes a fixed, ordered list of path prefixes on one host until a route
/// answers. Every call starts again from the first prefix.
pub struct EndpointDiscoveryClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: String,
    candidates: Vec<String>,
}

impl EndpointDiscoveryClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, api_key: &str) -> Self {
        let candidates = DEFAULT_PATH_PREFIXES
            .iter()
            .map(|prefix| prefix.to_string())
            .collect();
        Self::with_candidates(transport, base_url, api_key, candidates)
    }

    pub fn with_candidates(
        transport: Arc<dyn HttpTransport>,
        base_url: &str,
        api_key: &str,
        candidates: Vec<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            candidates,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, prefix: &str, suffix: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        if suffix.starts_with('/') || suffix.is_empty() {
            format!("{}{}{}", self.base_url, prefix, suffix)
        } else {
            format!("{}{}/{}", self.base_url, prefix, suffix)
        }
    }

    fn headers(&self) -> AppResult<HeaderMap> {
        let invalid_key = |err: InvalidHeaderValue| {
            AppError::Configuration(format!("API key is not a valid header value: {err}"))
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key)).map_err(invalid_key)?,
        );
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(&self.api_key).map_err(invalid_key)?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn call(
        &self,
        endpoint_suffix: &str,
        method: Method,
        body: Option<&Value>,
    ) -> AppResult<Value> {
        let headers = self.headers()?;

        for prefix in &self.candidates {
            let url = self.url_for(prefix, endpoint_suffix);
            let request = ApiRequest {
                method: method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.cloned(),
            };

            let response = self.transport.send(request).await?;
            let status = response.status;

            match Attempt::from_response(response)? {
                Attempt::Success(value) => {
                    debug!(%method, %url, status, "endpoint candidate answered");
                    return Ok(value);
                }
                Attempt::NotFound => {
                    debug!(%method, %url, "endpoint candidate not found, trying next");
                }
                Attempt::Rejected { status, body } => {
                    warn!(%method, %url, status, "remote API rejected request");
                    return Err(AppError::RemoteApi { status, body });
                }
                Attempt::NotJson { content_type } => {
                    warn!(%method, %url, %content_type, "endpoint answered with non-JSON body");
                    return Err(AppError::UnexpectedContentType { content_type });
                }
            }
        }

        debug!(
            %method,
            suffix = endpoint_suffix,
            candidates = self.candidates.len(),
            "no endpoint candidate matched"
        );
        Err(AppError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{ScriptedTransport, json_response, text_response};

    fn client(transport: Arc<ScriptedTransport>, candidates: &[&str]) -> EndpointDiscoveryClient {
        EndpointDiscoveryClient::with_candidates(
            transport,
            "https://tracker.example/",
            "secret",
            candidates.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn skips_not_found_candidates_until_one_answers() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.starts_with("https://tracker.example/c/") {
                json_response(200, json!({ "id": "x" }))
            } else {
                json_response(404, json!({ "detail": "not found" }))
            }
        }));
        let client = client(transport.clone(), &["/a", "/b", "/c", "/d"]);

        let value = client.call("/items/", Method::GET, None).await.unwrap();

        assert_eq!(value, json!({ "id": "x" }));
        assert_eq!(
            transport.urls(),
            vec![
                "https://tracker.example/a/items/",
                "https://tracker.example/b/items/",
                "https://tracker.example/c/items/",
            ]
        );
    }

    #[tokio::test]
    async fn stops_at_first_rejection() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            json_response(403, json!({ "detail": "forbidden" }))
        }));
        let client = client(transport.clone(), &["/a", "/b"]);

        let err = client.call("/items/", Method::POST, None).await.unwrap_err();

        assert!(matches!(err, AppError::RemoteApi { status: 403, .. }));
        assert_eq!(transport.urls(), vec!["https://tracker.example/a/items/"]);
    }

    #[tokio::test]
    async fn signals_unavailable_when_every_candidate_is_missing() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            text_response(404, "text/html", "<h1>Not Found</h1>")
        }));
        let client = client(transport.clone(), &["/api/v1", "/api", ""]);

        let err = client.call("/items/", Method::GET, None).await.unwrap_err();

        assert!(matches!(err, AppError::Unavailable));
        assert_eq!(transport.urls().len(), 3);
        assert_eq!(transport.urls()[2], "https://tracker.example/items/");
    }

    #[tokio::test]
    async fn non_json_success_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            text_response(200, "text/html; charset=utf-8", "<html></html>")
        }));
        let client = client(transport.clone(), &["/a", "/b"]);

        let err = client.call("/items/", Method::GET, None).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::UnexpectedContentType { ref content_type } if content_type.starts_with("text/html")
        ));
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn empty_html_success_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new(|_| text_response(200, "text/html", "")));
        let client = client(transport.clone(), &["/a", "/b"]);

        let err = client.call("/items/", Method::POST, None).await.unwrap_err();

        assert!(matches!(err, AppError::UnexpectedContentType { .. }));
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn empty_no_content_reply_is_null() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Ok(ApiResponse {
                status: 204,
                content_type: None,
                body: String::new(),
            })
        }));
        let client = client(transport.clone(), &["/a", "/b"]);

        let value = client.call("/items/1/", Method::DELETE, None).await.unwrap();

        assert!(value.is_null());
        assert_eq!(transport.urls().len(), 1);
    }

    #[tokio::test]
    async fn restarts_probe_on_every_call() {
        let transport = Arc::new(ScriptedTransport::new(|request| {
            if request.url.contains("/b/") {
                json_response(200, json!([]))
            } else {
                json_response(404, json!({}))
            }
        }));
        let client = client(transport.clone(), &["/a", "/b"]);

        client.call("/one/", Method::GET, None).await.unwrap();
        client.call("/two/", Method::GET, None).await.unwrap();

        assert_eq!(
            transport.urls(),
            vec![
                "https://tracker.example/a/one/",
                "https://tracker.example/b/one/",
                "https://tracker.example/a/two/",
                "https://tracker.example/b/two/",
            ]
        );
    }

    #[tokio::test]
    async fn sends_auth_headers_and_body() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            text_response(204, "text/plain", "")
        }));
        let client = client(transport.clone(), &[""]);
        let body = json!({ "name": "hello" });

        let value = client.call("items/", Method::POST, Some(&body)).await.unwrap();

        assert!(value.is_null());
        let requests = transport.requests();
        let request = &requests[0];
        assert_eq!(request.url, "https://tracker.example/items/");
        assert_eq!(request.headers[AUTHORIZATION], "Bearer secret");
        assert_eq!(request.headers["x-api-key"], "secret");
        assert_eq!(request.body.as_ref(), Some(&body));
    }

    #[tokio::test]
    async fn transport_failures_are_terminal() {
        let transport = Arc::new(ScriptedTransport::new(|_| {
            Err(AppError::Transport("connection refused".to_string()))
        }));
        let client = client(transport.clone(), &["/a", "/b"]);

        let err = client.call("/items/", Method::GET, None).await.unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(transport.urls().len(), 1);
    }
}
