pub mod deployment;
pub mod issue_tracker;
pub mod transport;

pub use deployment::DeploymentService;
pub use issue_tracker::IssueTrackerService;
pub use transport::{ApiRequest, ApiResponse, HttpTransport};
