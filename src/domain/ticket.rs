use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::classification::ClassificationResult;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TicketStatus {
    Draft,
    Pending,
    Completed,
    Failed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Draft => "draft",
            TicketStatus::Pending => "pending",
            TicketStatus::Completed => "completed",
            TicketStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Completed | TicketStatus::Failed)
    }
}

/// Outcome of the best-effort analysis comment posted after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommentOutcome {
    NotAttempted,
    Posted,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub classification: ClassificationResult,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub error: Option<String>,
    pub remote_url: Option<String>,
    pub analysis_comment: CommentOutcome,
}

impl Ticket {
    pub fn mark_pending(&mut self) -> AppResult<()> {
        self.transition(TicketStatus::Pending)
    }

    /// Falls back to local-only mode after the tracker could not be reached.
    pub fn revert_to_draft(&mut self) -> AppResult<()> {
        self.transition(TicketStatus::Draft)
    }

    pub fn complete(
        &mut self,
        remote_id: Option<String>,
        remote_url: Option<String>,
    ) -> AppResult<()> {
        self.transition(TicketStatus::Completed)?;
        if let Some(id) = remote_id {
            self.id = id;
        }
        self.remote_url = remote_url;
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> AppResult<()> {
        self.transition(TicketStatus::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, next: TicketStatus) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::Validation(format!(
                "ticket {} is already {} and cannot become {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// Tracker-side location issues are created under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRoute {
    pub workspace_slug: String,
    pub project_id: String,
}

impl TrackerRoute {
    pub fn new(workspace_slug: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            workspace_slug: workspace_slug.into(),
            project_id: project_id.into(),
        }
    }

    pub fn projects_suffix(&self) -> String {
        format!("/workspaces/{}/projects/", self.workspace_slug)
    }

    pub fn issues_suffix(&self) -> String {
        format!(
            "/workspaces/{}/projects/{}/issues/",
            self.workspace_slug, self.project_id
        )
    }

    pub fn comments_suffix(&self, issue_id: &str) -> String {
        format!("{}{}/comments/", self.issues_suffix(), issue_id)
    }
}

/// Body sent to the tracker when creating an issue.
#[derive(Debug, Clone, Serialize)]
pub struct IssuePayload {
    pub name: String,
    pub description_html: String,
    pub priority: &'static str,
}

/// What the tracker reported back for a created issue.
#[derive(Debug, Clone, Default)]
pub struct RemoteIssue {
    pub id: Option<String>,
    pub url: Option<String>,
}
