use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::domain::event::value_as_id;
use crate::domain::ticket::{IssuePayload, RemoteIssue, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::infra::discovery::EndpointDiscoveryClient;
use crate::services::{HttpTransport, IssueTrackerService};

/// Plane-style tracker reached through endpoint discovery.
pub struct PlaneClient {
    api: EndpointDiscoveryClient,
}

impl PlaneClient {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: &str, api_key: &str) -> Self {
        Self::from_discovery(EndpointDiscoveryClient::new(transport, base_url, api_key))
    }

    pub fn from_discovery(api: EndpointDiscoveryClient) -> Self {
        Self { api }
    }

    fn browse_url(&self, route: &TrackerRoute, issue_id: &str) -> String {
        format!(
            "{}/{}/projects/{}/issues/{}",
            self.api.base_url(),
            route.workspace_slug,
            route.project_id,
            issue_id
        )
    }
}

#[async_trait]
impl IssueTrackerService for PlaneClient {
    async fn create_issue(
        &self,
        route: &TrackerRoute,
        payload: &IssuePayload,
    ) -> AppResult<RemoteIssue> {
        if payload.name.trim().is_empty() {
            return Err(AppError::Validation("issue name must not be empty".to_string()));
        }

        let body = serde_json::to_value(payload)?;
        let response = self
            .api
            .call(&route.issues_suffix(), Method::POST, Some(&body))
            .await?;

        let id = response.get("id").and_then(value_as_id);
        let url = id.as_deref().map(|id| self.browse_url(route, id));
        Ok(RemoteIssue { id, url })
    }

    async fn add_comment(
        &self,
        route: &TrackerRoute,
        issue_id: &str,
        comment_html: &str,
    ) -> AppResult<()> {
        let body = serde_json::to_value(PlaneCommentRequest { comment_html })?;
        self.api
            .call(&route.comments_suffix(issue_id), Method::POST, Some(&body))
            .await?;
        Ok(())
    }

    async fn list_projects(&self, route: &TrackerRoute) -> AppResult<Vec<Value>> {
        let response = self
            .api
            .call(&route.projects_suffix(), Method::GET, None)
            .await?;

        // Paginated deployments wrap the list in `results`.
        match response {
            Value::Array(projects) => Ok(projects),
            Value::Object(mut page) => match page.remove("results") {
                Some(Value::Array(projects)) => Ok(projects),
                _ => Err(AppError::InvalidResponse(
                    "project listing has no results array".to_string(),
                )),
            },
            other => Err(AppError::InvalidResponse(format!(
                "unexpected project listing: {other}"
            ))),
        }
    }
}

#[derive(Serialize)]
struct PlaneCommentRequest<'a> {
    comment_html: &'a str,
}
