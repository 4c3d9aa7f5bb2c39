use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::{ApiRequest, ApiResponse, HttpTransport};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> AppResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AppError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            AppError::Transport(format!("{} {} failed: {err}", request.method, request.url))
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());

        debug!(method = %request.method, url = %request.url, status, "http exchange");

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}
