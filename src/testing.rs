//! Fakes shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::domain::ticket::{IssuePayload, RemoteIssue, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::services::{ApiRequest, ApiResponse, HttpTransport, IssueTrackerService};

type Responder = Box<dyn Fn(&ApiRequest) -> AppResult<ApiResponse> + Send + Sync>;

pub struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> AppResult<ApiResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        response
    }
}

pub fn json_response(status: u16, body: Value) -> AppResult<ApiResponse> {
    Ok(ApiResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: body.to_string(),
    })
}

pub fn text_response(status: u16, content_type: &str, body: &str) -> AppResult<ApiResponse> {
    Ok(ApiResponse {
        status,
        content_type: Some(content_type.to_string()),
        body: body.to_string(),
    })
}

/// Issue tracker that replays queued creation results and records every call.
#[derive(Default)]
pub struct FakeTracker {
    create_results: Mutex<VecDeque<AppResult<RemoteIssue>>>,
    fail_comments: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_comments() -> Self {
        Self {
            fail_comments: true,
            ..Self::default()
        }
    }

    pub fn push_create(&self, result: AppResult<RemoteIssue>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    async fn create_issue(
        &self,
        _route: &TrackerRoute,
        payload: &IssuePayload,
    ) -> AppResult<RemoteIssue> {
        let position = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(format!("create:{}", payload.name));
            calls.len()
        };
        self.create_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RemoteIssue {
                    id: Some(format!("remote-{position}")),
                    url: None,
                })
            })
    }

    async fn add_comment(
        &self,
        _route: &TrackerRoute,
        issue_id: &str,
        _comment_html: &str,
    ) -> AppResult<()> {
        self.calls.lock().unwrap().push(format!("comment:{issue_id}"));
        if self.fail_comments {
            return Err(AppError::RemoteApi {
                status: 500,
                body: "comment service down".to_string(),
            });
        }
        Ok(())
    }

    async fn list_projects(&self, _route: &TrackerRoute) -> AppResult<Vec<Value>> {
        self.calls.lock().unwrap().push("projects".to_string());
        Ok(Vec::new())
    }
}

/// Tracker whose comment calls block until `release` is called.
#[derive(Default)]
pub struct StalledTracker {
    gate: Notify,
}

impl StalledTracker {
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl IssueTrackerService for StalledTracker {
    async fn create_issue(
        &self,
        _route: &TrackerRoute,
        _payload: &IssuePayload,
    ) -> AppResult<RemoteIssue> {
        Ok(RemoteIssue { id: None, url: None })
    }

    async fn add_comment(
        &self,
        _route: &TrackerRoute,
        _issue_id: &str,
        _comment_html: &str,
    ) -> AppResult<()> {
        self.gate.notified().await;
        Ok(())
    }

    async fn list_projects(&self, _route: &TrackerRoute) -> AppResult<Vec<Value>> {
        Ok(Vec::new())
    }
}
