use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::domain::ticket::TrackerRoute;
use crate::error::AppResult;
use crate::infra::http::ReqwestTransport;
use crate::infra::offline::OfflineTracker;
use crate::infra::plane::PlaneClient;
use crate::infra::railway::RailwayClient;
use crate::services::{DeploymentService, HttpTransport, IssueTrackerService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub route: TrackerRoute,
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    pub deployment: Arc<dyn DeploymentService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        route: TrackerRoute,
        issue_tracker: Arc<dyn IssueTrackerService>,
        deployment: Arc<dyn DeploymentService>,
    ) -> Self {
        Self {
            config,
            route,
            issue_tracker,
            deployment,
        }
    }

    /// Wires the real clients. A partially configured tracker falls back to
    /// local-only mode instead of failing.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
        let tracker = &config.tracker;

        let route = TrackerRoute::new(
            tracker.workspace.clone().unwrap_or_default(),
            tracker.project_id.clone().unwrap_or_default(),
        );

        let issue_tracker: Arc<dyn IssueTrackerService> =
            match (tracker.is_complete(), &tracker.api_url, &tracker.api_key) {
                (true, Some(api_url), Some(api_key)) => {
                    Arc::new(PlaneClient::new(transport.clone(), api_url, api_key))
                }
                _ => {
                    warn!("tracker not fully configured; tickets will stay local");
                    Arc::new(OfflineTracker)
                }
            };

        let deployment = Arc::new(RailwayClient::new(
            transport,
            config.deployment.api_url.clone(),
            config.deployment.api_token.clone(),
        ));

        Ok(Self::new(config, route, issue_tracker, deployment))
    }
}
