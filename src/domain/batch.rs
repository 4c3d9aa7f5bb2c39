use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::classification::{Category, Priority};
use crate::domain::ticket::{Ticket, TicketStatus};

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub original_prompt: String,
    pub outcome: Result<Ticket, String>,
}

impl BatchEntry {
    pub fn succeeded(original_prompt: String, ticket: Ticket) -> Self {
        Self {
            original_prompt,
            outcome: Ok(ticket),
        }
    }

    pub fn failed(original_prompt: String, error: impl Into<String>) -> Self {
        Self {
            original_prompt,
            outcome: Err(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn ticket(&self) -> Option<&Ticket> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// One entry per input prompt, in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub local_only: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub by_priority: BTreeMap<Priority, usize>,
}

impl From<&BatchResult> for BatchSummary {
    fn from(result: &BatchResult) -> Self {
        let mut summary = BatchSummary {
            total: result.len(),
            ..BatchSummary::default()
        };

        for entry in &result.entries {
            match entry.ticket() {
                Some(ticket) => {
                    summary.successful += 1;
                    if ticket.status == TicketStatus::Draft {
                        summary.local_only += 1;
                    }
                    *summary
                        .by_category
                        .entry(ticket.classification.category)
                        .or_default() += 1;
                    *summary
                        .by_priority
                        .entry(ticket.classification.priority)
                        .or_default() += 1;
                }
                None => summary.failed += 1,
            }
        }

        summary
    }
}
