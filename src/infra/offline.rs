use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ticket::{IssuePayload, RemoteIssue, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;

/// Stand-in used when no tracker is configured; tickets stay local.
pub struct OfflineTracker;

#[async_trait]
impl IssueTrackerService for OfflineTracker {
    async fn create_issue(
        &self,
        _route: &TrackerRoute,
        _payload: &IssuePayload,
    ) -> AppResult<RemoteIssue> {
        Err(AppError::Unavailable)
    }

    async fn add_comment(
        &self,
        _route: &TrackerRoute,
        _issue_id: &str,
        _comment_html: &str,
    ) -> AppResult<()> {
        Err(AppError::Unavailable)
    }

    async fn list_projects(&self, _route: &TrackerRoute) -> AppResult<Vec<Value>> {
        Err(AppError::Unavailable)
    }
}
