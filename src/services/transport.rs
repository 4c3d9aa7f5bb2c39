use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|value| {
            let mime = value.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
    }
}

/// Sends one request and hands back the raw response, whatever its status.
/// Only connection-level failures are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(content_type: Option<&str>) -> ApiResponse {
        ApiResponse {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: String::new(),
        }
    }

    #[test]
    fn detects_json_content_types() {
        assert!(response(Some("application/json")).is_json());
        assert!(response(Some("application/json; charset=utf-8")).is_json());
        assert!(response(Some("application/problem+json")).is_json());
        assert!(!response(Some("text/html")).is_json());
        assert!(!response(None).is_json());
    }
}
