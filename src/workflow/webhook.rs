use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info};

use crate::domain::event::{CommentEventData, Event, EventKind, IssueEventData, ProjectEventData};
use crate::domain::ticket::{Ticket, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;
use crate::store::TicketStore;
use crate::workflow::ticket::{TicketAssembler, post_analysis_comment};

const COMMENT_PREVIEW_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Handling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookReply {
    Success { processed: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub status_code: u16,
    pub reply: WebhookReply,
}

impl DispatchOutcome {
    fn processed(tag: &str) -> Self {
        Self {
            status_code: 200,
            reply: WebhookReply::Success {
                processed: tag.to_string(),
            },
        }
    }

    pub fn failed(message: String) -> Self {
        Self {
            status_code: 500,
            reply: WebhookReply::Error { message },
        }
    }
}

/// What a handler needs; cloned into the handler's task.
#[derive(Clone)]
struct HandlerContext {
    tracker: Arc<dyn IssueTrackerService>,
    route: TrackerRoute,
}

/// Holds the dispatcher in `Handling` and resets it to `Idle` when dropped,
/// including when the dispatch future is cancelled.
struct HandlingGuard<'a>(&'a mut DispatcherState);

impl<'a> HandlingGuard<'a> {
    fn enter(state: &'a mut DispatcherState) -> Self {
        *state = DispatcherState::Handling;
        Self(state)
    }
}

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = DispatcherState::Idle;
    }
}

/// Routes webhook events to their handler, one event at a time.
pub struct WebhookDispatcher {
    context: HandlerContext,
    state: DispatcherState,
}

impl WebhookDispatcher {
    pub fn new(tracker: Arc<dyn IssueTrackerService>, route: TrackerRoute) -> Self {
        Self {
            context: HandlerContext { tracker, route },
            state: DispatcherState::Idle,
        }
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Runs the handler for `event` in its own task so that errors and panics
    /// both end up as a 500 reply. Returns to `Idle` even if cancelled.
    pub async fn dispatch(&mut self, event: Event, store: &mut TicketStore) -> DispatchOutcome {
        debug_assert_eq!(self.state(), DispatcherState::Idle);
        let _handling = HandlingGuard::enter(&mut self.state);

        let kind = EventKind::parse(&event.event_type);
        let tag = event.event_type.clone();
        info!(event_type = %tag, "webhook received");

        let context = self.context.clone();
        let handled = tokio::spawn(handle(kind, event.data, context)).await;

        let outcome = match handled {
            Ok(Ok(ticket)) => {
                if let Some(ticket) = ticket {
                    if store.get(&ticket.id).is_some() {
                        info!(ticket = %ticket.id, "event redelivered; replacing stored ticket");
                    }
                    store.insert(ticket.id.clone(), ticket);
                }
                DispatchOutcome::processed(&tag)
            }
            Ok(Err(err)) => {
                error!(event_type = %tag, error = %err, "webhook handler failed");
                DispatchOutcome::failed(err.to_string())
            }
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    "webhook handler panicked".to_string()
                } else {
                    format!("webhook handler aborted: {join_err}")
                };
                error!(event_type = %tag, %message, "webhook handler crashed");
                DispatchOutcome::failed(message)
            }
        };

        outcome
    }
}

async fn handle(
    kind: EventKind,
    data: Value,
    context: HandlerContext,
) -> AppResult<Option<Ticket>> {
    match kind {
        EventKind::IssueCreated => on_issue_created(parse_data(data)?, &context).await.map(Some),
        EventKind::IssueUpdated => on_issue_updated(parse_data(data)?).map(|_| None),
        EventKind::IssueCommentCreated => {
            on_comment_created(parse_data(data)?);
            Ok(None)
        }
        EventKind::ProjectCreated => {
            on_project_created(parse_data(data)?);
            Ok(None)
        }
        EventKind::Unknown(tag) => {
            info!(event_type = %tag, "ignoring unrecognized webhook event");
            Ok(None)
        }
    }
}

fn parse_data<T: DeserializeOwned + Default>(data: Value) -> AppResult<T> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data)
        .map_err(|err| AppError::Validation(format!("invalid event data: {err}")))
}

async fn on_issue_created(issue: IssueEventData, context: &HandlerContext) -> AppResult<Ticket> {
    if issue.name().is_none_or(|name| name.trim().is_empty()) {
        return Err(AppError::Validation("issue event has no name".to_string()));
    }

    let mut ticket = TicketAssembler::assemble(&issue.text())?;
    info!(
        issue = issue.id.as_deref().unwrap_or("<none>"),
        category = %ticket.classification.category,
        priority = %ticket.classification.priority,
        complexity = %ticket.classification.complexity,
        "issue classified"
    );

    // The issue already exists remotely, so only the analysis comment is sent.
    if let Some(issue_id) = issue.id {
        ticket.complete(Some(issue_id.clone()), None)?;
        ticket.analysis_comment = post_analysis_comment(
            context.tracker.as_ref(),
            &context.route,
            &issue_id,
            &ticket.classification,
        )
        .await;
    }

    Ok(ticket)
}

fn on_issue_updated(issue: IssueEventData) -> AppResult<()> {
    let text = issue.text();
    if text.is_empty() {
        info!(
            issue = issue.id.as_deref().unwrap_or("<none>"),
            "issue updated without text"
        );
        return Ok(());
    }
    let ticket = TicketAssembler::assemble(&text)?;
    info!(
        issue = issue.id.as_deref().unwrap_or("<none>"),
        category = %ticket.classification.category,
        priority = %ticket.classification.priority,
        "issue updated"
    );
    Ok(())
}

fn on_comment_created(comment: CommentEventData) {
    let preview: String = comment
        .text()
        .unwrap_or_default()
        .chars()
        .take(COMMENT_PREVIEW_CHARS)
        .collect();
    info!(
        issue = comment.issue.as_deref().unwrap_or("<none>"),
        comment = comment.id.as_deref().unwrap_or("<none>"),
        %preview,
        "issue comment created"
    );
}

fn on_project_created(project: ProjectEventData) {
    info!(
        project = project.id.as_deref().unwrap_or("<none>"),
        name = project.name.as_deref().unwrap_or("<unnamed>"),
        identifier = project.identifier.as_deref().unwrap_or(""),
        "project created"
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::ticket::{CommentOutcome, IssuePayload, RemoteIssue, TicketStatus};
    use crate::testing::{FakeTracker, StalledTracker};

    struct PanickingTracker;

    #[async_trait]
    impl IssueTrackerService for PanickingTracker {
        async fn create_issue(
            &self,
            _route: &TrackerRoute,
            _payload: &IssuePayload,
        ) -> AppResult<RemoteIssue> {
            panic!("create_issue should not be called")
        }

        async fn add_comment(
            &self,
            _route: &TrackerRoute,
            _issue_id: &str,
            _comment_html: &str,
        ) -> AppResult<()> {
            panic!("tracker exploded")
        }

        async fn list_projects(&self, _route: &TrackerRoute) -> AppResult<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    fn event(event_type: &str, data: Value) -> Event {
        Event {
            event_type: event_type.to_string(),
            data,
        }
    }

    fn dispatcher(tracker: Arc<dyn IssueTrackerService>) -> WebhookDispatcher {
        WebhookDispatcher::new(tracker, TrackerRoute::new("acme", "p1"))
    }

    #[tokio::test]
    async fn accepts_unknown_events_without_side_effects() {
        let tracker = Arc::new(FakeTracker::new());
        let mut dispatcher = dispatcher(tracker.clone());
        let mut store = TicketStore::new();

        let outcome = dispatcher
            .dispatch(event("unknown.tag", json!({})), &mut store)
            .await;

        assert_eq!(outcome.status_code, 200);
        assert_eq!(
            outcome.reply,
            WebhookReply::Success {
                processed: "unknown.tag".to_string()
            }
        );
        assert!(tracker.calls().is_empty());
        assert!(store.is_empty());
        assert_eq!(dispatcher.state(), DispatcherState::Idle);
    }

    #[tokio::test]
    async fn issue_created_posts_analysis_comment() {
        let tracker = Arc::new(FakeTracker::new());
        let mut dispatcher = dispatcher(tracker.clone());
        let mut store = TicketStore::new();
        let data = json!({ "id": "issue-9", "name": "Login page crash", "description": null });

        let outcome = dispatcher
            .dispatch(event("issue.created", data), &mut store)
            .await;

        assert_eq!(outcome.status_code, 200);
        assert_eq!(tracker.calls(), vec!["comment:issue-9"]);
        let ticket = store.get("issue-9").unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert_eq!(ticket.analysis_comment, CommentOutcome::Posted);
    }

    #[tokio::test]
    async fn comment_failure_still_succeeds() {
        let tracker = Arc::new(FakeTracker::failing_comments());
        let mut dispatcher = dispatcher(tracker.clone());
        let mut store = TicketStore::new();

        let outcome = dispatcher
            .dispatch(
                event("issue.created", json!({ "id": 5, "title": "Add export" })),
                &mut store,
            )
            .await;

        assert_eq!(outcome.status_code, 200);
        assert!(matches!(
            store.get("5").unwrap().analysis_comment,
            CommentOutcome::Failed(_)
        ));
    }

    #[tokio::test]
    async fn handler_errors_become_error_replies() {
        let mut dispatcher = dispatcher(Arc::new(FakeTracker::new()));
        let mut store = TicketStore::new();

        let outcome = dispatcher
            .dispatch(event("issue.created", json!({ "id": "x" })), &mut store)
            .await;

        assert_eq!(outcome.status_code, 500);
        assert!(matches!(
            outcome.reply,
            WebhookReply::Error { ref message } if message.contains("no name")
        ));
        assert_eq!(dispatcher.state(), DispatcherState::Idle);
    }

    #[tokio::test]
    async fn handler_panics_are_contained() {
        let mut dispatcher = dispatcher(Arc::new(PanickingTracker));
        let mut store = TicketStore::new();

        let outcome = dispatcher
            .dispatch(
                event("issue.created", json!({ "id": "x", "name": "Fix it" })),
                &mut store,
            )
            .await;
        assert_eq!(outcome.status_code, 500);

        let next = dispatcher
            .dispatch(event("project.created", json!({ "id": "p", "name": "Web" })), &mut store)
            .await;
        assert_eq!(next.status_code, 200);
        assert_eq!(dispatcher.state(), DispatcherState::Idle);
    }

    #[tokio::test]
    async fn issue_with_name_and_title_is_handled() {
        let tracker = Arc::new(FakeTracker::new());
        let mut dispatcher = dispatcher(tracker.clone());
        let mut store = TicketStore::new();
        let data = json!({ "id": "i1", "name": "Crash on save", "title": "Crash on save" });

        let outcome = dispatcher
            .dispatch(event("issue.created", data), &mut store)
            .await;

        assert_eq!(outcome.status_code, 200);
        assert_eq!(tracker.calls(), vec!["comment:i1"]);
        assert_eq!(store.get("i1").unwrap().title, "Crash on save");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_dispatch_returns_to_idle() {
        let mut dispatcher = dispatcher(Arc::new(StalledTracker::default()));
        let mut store = TicketStore::new();
        let data = json!({ "id": "i2", "name": "Fix login" });

        let dispatch = dispatcher.dispatch(event("issue.created", data), &mut store);
        let cancelled = tokio::time::timeout(Duration::from_secs(5), dispatch).await;

        assert!(cancelled.is_err());
        assert_eq!(dispatcher.state(), DispatcherState::Idle);
    }

    #[tokio::test]
    async fn logs_comment_and_update_events() {
        let tracker = Arc::new(FakeTracker::new());
        let mut dispatcher = dispatcher(tracker.clone());
        let mut store = TicketStore::new();

        let comment = dispatcher
            .dispatch(
                event(
                    "issue_comment.created",
                    json!({ "issue": "i1", "comment_stripped": "looks good" }),
                ),
                &mut store,
            )
            .await;
        let update = dispatcher
            .dispatch(
                event("issue.updated", json!({ "id": "i1", "name": "Refactor auth" })),
                &mut store,
            )
            .await;

        assert_eq!(comment.status_code, 200);
        assert_eq!(update.status_code, 200);
        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn serializes_replies() {
        let success = serde_json::to_value(WebhookReply::Success {
            processed: "issue.created".to_string(),
        })
        .unwrap();
        assert_eq!(success, json!({ "status": "success", "processed": "issue.created" }));

        let failure = serde_json::to_value(WebhookReply::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(failure, json!({ "status": "error", "message": "boom" }));
    }
}
