use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentProject {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait DeploymentService: Send + Sync {
    async fn list_projects(&self) -> AppResult<Vec<DeploymentProject>>;
    async fn redeploy(&self, service_id: &str, environment_id: &str) -> AppResult<()>;
}
