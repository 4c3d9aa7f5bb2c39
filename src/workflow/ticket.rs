use chrono::Utc;
use tracing::{info, warn};

use crate::domain::classification::{ClassificationResult, classify, derive_title};
use crate::domain::ticket::{CommentOutcome, IssuePayload, Ticket, TicketStatus, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;
use crate::store::TicketStore;

/// Turns free-text prompts into classified tickets and, optionally, tracker issues.
pub struct TicketAssembler;

impl TicketAssembler {
    pub fn assemble(prompt: &str) -> AppResult<Ticket> {
        let description = prompt.trim();
        if description.is_empty() {
            return Err(AppError::Validation("prompt must not be empty".to_string()));
        }

        let created_at = Utc::now();
        Ok(Ticket {
            id: TicketStore::compute_key(description, created_at),
            title: derive_title(description),
            description: description.to_string(),
            classification: classify(description),
            status: TicketStatus::Draft,
            created_at,
            error: None,
            remote_url: None,
            analysis_comment: CommentOutcome::NotAttempted,
        })
    }

    /// Creates the ticket remotely when possible.
    ///
    /// `Unavailable` leaves the ticket as a local `Draft`; any other tracker
    /// error marks it `Failed`. Only an invalid prompt is returned as `Err`.
    pub async fn assemble_and_submit(
        prompt: &str,
        tracker: &dyn IssueTrackerService,
        route: &TrackerRoute,
    ) -> AppResult<Ticket> {
        let ticket = Self::assemble(prompt)?;
        Self::submit(ticket, tracker, route).await
    }

    /// Submits an already assembled ticket. Tickets in a terminal state are
    /// rejected.
    pub async fn submit(
        mut ticket: Ticket,
        tracker: &dyn IssueTrackerService,
        route: &TrackerRoute,
    ) -> AppResult<Ticket> {
        ticket.mark_pending()?;

        match tracker.create_issue(route, &issue_payload(&ticket)).await {
            Ok(remote) => {
                let remote_id = remote.id.clone();
                ticket.complete(remote.id, remote.url)?;
                info!(ticket = %ticket.id, title = %ticket.title, "ticket created remotely");

                if let Some(issue_id) = remote_id {
                    ticket.analysis_comment =
                        post_analysis_comment(tracker, route, &issue_id, &ticket.classification)
                            .await;
                }
            }
            Err(AppError::Unavailable) => {
                info!(ticket = %ticket.id, "tracker unavailable, keeping ticket local");
                ticket.revert_to_draft()?;
            }
            Err(err) => {
                warn!(ticket = %ticket.id, error = %err, "ticket creation failed");
                ticket.fail(err.to_string())?;
            }
        }

        Ok(ticket)
    }
}

/// Posts the classification summary on an issue. Failures are logged and
/// reported through the returned outcome only.
pub async fn post_analysis_comment(
    tracker: &dyn IssueTrackerService,
    route: &TrackerRoute,
    issue_id: &str,
    classification: &ClassificationResult,
) -> CommentOutcome {
    let comment = analysis_comment_html(classification);
    match tracker.add_comment(route, issue_id, &comment).await {
        Ok(()) => CommentOutcome::Posted,
        Err(err) => {
            warn!(issue = issue_id, error = %err, "analysis comment failed");
            CommentOutcome::Failed(err.to_string())
        }
    }
}

pub fn issue_payload(ticket: &Ticket) -> IssuePayload {
    let mut description_html = format!("<p>{}</p>", escape_html(&ticket.description));
    if !ticket.classification.labels.is_empty() {
        let labels = ticket
            .classification
            .labels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        description_html.push_str(&format!("<p><em>Labels: {labels}</em></p>"));
    }

    IssuePayload {
        name: ticket.title.clone(),
        description_html,
        priority: ticket.classification.priority.tracker_value(),
    }
}

pub fn analysis_comment_html(classification: &ClassificationResult) -> String {
    let labels = if classification.labels.is_empty() {
        "none".to_string()
    } else {
        classification
            .labels
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "<p><strong>Automated analysis</strong></p><ul>\
         <li>Category: {}</li>\
         <li>Priority: {}</li>\
         <li>Complexity: {}</li>\
         <li>Labels: {}</li></ul>",
        classification.category, classification.priority, classification.complexity, labels
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
