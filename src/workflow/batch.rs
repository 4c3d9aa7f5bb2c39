use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::batch::{BatchEntry, BatchResult};
use crate::domain::ticket::{Ticket, TicketStatus, TrackerRoute};
use crate::error::{AppError, AppResult};
use crate::services::IssueTrackerService;
use crate::store::TicketStore;
use crate::workflow::ticket::TicketAssembler;

/// Submits prompts one at a time with a fixed pause between submissions.
pub struct BatchOrchestrator {
    tracker: Arc<dyn IssueTrackerService>,
    route: TrackerRoute,
    delay: Duration,
}

impl BatchOrchestrator {
    pub fn new(
        tracker: Arc<dyn IssueTrackerService>,
        route: TrackerRoute,
        delay: Duration,
    ) -> Self {
        Self {
            tracker,
            route,
            delay,
        }
    }

    /// Every prompt produces exactly one entry, in input order. Tickets are
    /// recorded in `store` as soon as they exist so an abandoned run can
    /// still be reported.
    pub async fn run_batch(
        &self,
        prompts: &[String],
        store: &mut TicketStore,
    ) -> AppResult<BatchResult> {
        if prompts.is_empty() {
            return Err(AppError::Validation("batch contains no prompts".to_string()));
        }

        let mut result = BatchResult::default();
        for (index, prompt) in prompts.iter().enumerate() {
            if index > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let entry = self.process(prompt, store).await;
            match entry.error() {
                Some(error) => warn!(item = index + 1, %error, "batch item failed"),
                None => info!(item = index + 1, "batch item processed"),
            }
            result.entries.push(entry);
        }

        let summary = result.summary();
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            local_only = summary.local_only,
            "batch finished"
        );
        Ok(result)
    }

    async fn process(&self, prompt: &str, store: &mut TicketStore) -> BatchEntry {
        match self.submit_one(prompt, store).await {
            Ok(ticket) if ticket.status == TicketStatus::Failed => {
                let error = ticket
                    .error
                    .unwrap_or_else(|| "ticket creation failed".to_string());
                BatchEntry::failed(prompt.to_string(), error)
            }
            Ok(ticket) => BatchEntry::succeeded(prompt.to_string(), ticket),
            Err(err) => BatchEntry::failed(prompt.to_string(), err.to_string()),
        }
    }

    async fn submit_one(&self, prompt: &str, store: &mut TicketStore) -> AppResult<Ticket> {
        let mut ticket = TicketAssembler::assemble(prompt)?;
        let key = ticket.id.clone();
        ticket.mark_pending()?;
        store.insert(key.clone(), ticket.clone());

        let ticket = TicketAssembler::submit(ticket, self.tracker.as_ref(), &self.route).await?;
        store.insert(key, ticket.clone());
        Ok(ticket)
    }
}
