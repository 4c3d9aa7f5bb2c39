use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ticket::{IssuePayload, RemoteIssue, TrackerRoute};
use crate::error::AppResult;

/// Remote project tracker. Implementations signal `AppError::Unavailable`
/// when no endpoint for the route could be found.
#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn create_issue(
        &self,
        route: &TrackerRoute,
        payload: &IssuePayload,
    ) -> AppResult<RemoteIssue>;

    async fn add_comment(
        &self,
        route: &TrackerRoute,
        issue_id: &str,
        comment_html: &str,
    ) -> AppResult<()>;

    async fn list_projects(&self, route: &TrackerRoute) -> AppResult<Vec<Value>>;
}
