use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::Router;
use axum::routing::{get, post};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::domain::event::Event;
use crate::error::AppResult;
use crate::store::TicketStore;
use crate::workflow::webhook::{DispatchOutcome, WebhookDispatcher, WebhookReply};

const SERVICE_NAME: &str = "autotriage";

/// Dispatcher plus the tickets it produced during this process's lifetime.
struct WebhookSession {
    dispatcher: WebhookDispatcher,
    store: TicketStore,
}

pub struct ServerState {
    session: Mutex<WebhookSession>,
}

impl ServerState {
    pub fn new(dispatcher: WebhookDispatcher) -> Self {
        Self {
            session: Mutex::new(WebhookSession {
                dispatcher,
                store: TicketStore::new(),
            }),
        }
    }
}

#[derive(Serialize)]
struct HealthReply {
    status: &'static str,
    timestamp: String,
    service: &'static str,
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health_check))
        .with_state(state)
}

pub async fn serve(port: u16, state: Arc<ServerState>) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn health_check() -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
    })
}

async fn receive_webhook(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> (StatusCode, Json<WebhookReply>) {
    let event: Event = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "rejecting undecodable webhook body");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookReply::Error {
                    message: format!("invalid webhook body: {err}"),
                }),
            );
        }
    };

    // Detached so a dropped connection cannot cut a dispatch short.
    let dispatch = tokio::spawn(async move {
        let mut session = state.session.lock().await;
        let WebhookSession { dispatcher, store } = &mut *session;
        dispatcher.dispatch(event, store).await
    });
    let outcome = match dispatch.await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "webhook dispatch task failed");
            DispatchOutcome::failed(format!("webhook dispatch failed: {err}"))
        }
    };

    let status =
        StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.reply))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::ticket::TrackerRoute;
    use crate::testing::{FakeTracker, StalledTracker};
    use crate::workflow::webhook::DispatcherState;

    fn app(tracker: Arc<FakeTracker>) -> Router {
        let dispatcher = WebhookDispatcher::new(tracker, TrackerRoute::new("acme", "p1"));
        router(Arc::new(ServerState::new(dispatcher)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_webhook(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_event_is_processed() {
        let tracker = Arc::new(FakeTracker::new());
        let body = json!({ "event_type": "unknown.tag", "data": {} }).to_string();

        let (status, reply) = send(app(tracker.clone()), post_webhook(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply, json!({ "status": "success", "processed": "unknown.tag" }));
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn handler_failure_returns_500() {
        let body = json!({ "event_type": "issue.created", "data": { "id": "1" } }).to_string();

        let (status, reply) = send(app(Arc::new(FakeTracker::new())), post_webhook(body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(reply["status"], "error");
        assert!(reply["message"].as_str().unwrap().contains("no name"));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let (status, reply) = send(
            app(Arc::new(FakeTracker::new())),
            post_webhook("not json".to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(reply["status"], "error");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_request_still_records_ticket() {
        let tracker = Arc::new(StalledTracker::default());
        let dispatcher = WebhookDispatcher::new(tracker.clone(), TrackerRoute::new("acme", "p1"));
        let state = Arc::new(ServerState::new(dispatcher));
        let body = json!({
            "event_type": "issue.created",
            "data": { "id": "i7", "name": "Fix login" }
        })
        .to_string();

        let request = router(state.clone()).oneshot(post_webhook(body));
        let dropped = tokio::time::timeout(Duration::from_secs(5), request).await;
        assert!(dropped.is_err());

        tracker.release();
        let session = state.session.lock().await;
        assert!(session.store.get("i7").is_some());
        assert_eq!(session.dispatcher.state(), DispatcherState::Idle);
    }

    #[tokio::test]
    async fn reports_health() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, reply) = send(app(Arc::new(FakeTracker::new())), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["status"], "healthy");
        assert_eq!(reply["service"], SERVICE_NAME);
        assert!(reply["timestamp"].as_str().is_some());
    }
}
