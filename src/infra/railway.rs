use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::deployment::DeploymentProject;
use crate::services::{ApiRequest, DeploymentService, HttpTransport};

const PROJECTS_QUERY: &str = "query { projects { edges { node { id name } } } }";
const REDEPLOY_MUTATION: &str = "mutation($serviceId: String!, $environmentId: String!) { \
     serviceInstanceRedeploy(serviceId: $serviceId, environmentId: $environmentId) }";

/// GraphQL client for a Railway-style deployment platform.
pub struct RailwayClient {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
    token: Option<String>,
}

impl RailwayClient {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoint: String, token: Option<String>) -> Self {
        Self {
            transport,
            endpoint,
            token,
        }
    }

    fn headers(&self) -> AppResult<HeaderMap> {
        let token = self.token.as_deref().ok_or_else(|| {
            AppError::Configuration("deployment API token not configured".to_string())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|err| {
                AppError::Configuration(format!("deployment token is not a valid header: {err}"))
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Runs one GraphQL operation. A transport-level success that carries
    /// `errors` is still a failure.
    pub async fn execute(&self, query: &str, variables: Value) -> AppResult<Value> {
        let request = ApiRequest {
            method: Method::POST,
            url: self.endpoint.clone(),
            headers: self.headers()?,
            body: Some(serde_json::to_value(GraphQlRequest { query, variables })?),
        };

        let response = self.transport.send(request).await?;
        debug!(endpoint = %self.endpoint, status = response.status, "graphql exchange");

        if !response.is_success() {
            return Err(AppError::RemoteApi {
                status: response.status,
                body: response.body,
            });
        }
        if !response.is_json() {
            return Err(AppError::UnexpectedContentType {
                content_type: response
                    .content_type
                    .unwrap_or_else(|| "<missing>".to_string()),
            });
        }

        let payload: GraphQlResponse = serde_json::from_str(&response.body)
            .map_err(|err| AppError::InvalidResponse(format!("malformed GraphQL body: {err}")))?;

        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            let message = errors
                .iter()
                .map(|error| error.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(AppError::Deployment(message));
        }

        payload
            .data
            .ok_or_else(|| AppError::InvalidResponse("GraphQL response has no data".to_string()))
    }
}

#[async_trait]
impl DeploymentService for RailwayClient {
    async fn list_projects(&self) -> AppResult<Vec<DeploymentProject>> {
        let data = self.execute(PROJECTS_QUERY, json!({})).await?;
        let edges = data
            .pointer("/projects/edges")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::InvalidResponse("projects query has no edges".to_string()))?;

        Ok(edges
            .iter()
            .filter_map(|edge| {
                let node = edge.get("node")?;
                Some(DeploymentProject {
                    id: node.get("id")?.as_str()?.to_string(),
                    name: node.get("name")?.as_str()?.to_string(),
                })
            })
            .collect())
    }

    async fn redeploy(&self, service_id: &str, environment_id: &str) -> AppResult<()> {
        if service_id.trim().is_empty() || environment_id.trim().is_empty() {
            return Err(AppError::Validation(
                "service and environment ids are required".to_string(),
            ));
        }
        let variables = json!({ "serviceId": service_id, "environmentId": environment_id });
        self.execute(REDEPLOY_MUTATION, variables).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}
