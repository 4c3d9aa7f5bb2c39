use blake3::Hasher;
use chrono::{DateTime, Utc};

use crate::domain::ticket::{Ticket, TicketStatus};

const LOCAL_ID_PREFIX: &str = "LOCAL-";
const LOCAL_ID_HEX_LEN: usize = 12;

struct StoreEntry {
    key: String,
    ticket: Ticket,
}

/// In-memory ticket store owned by one batch run or one server process.
/// Entries are keyed by the ticket's local id and kept in insertion order.
#[derive(Default)]
pub struct TicketStore {
    entries: Vec<StoreEntry>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, ticket: Ticket) {
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.ticket = ticket,
            None => self.entries.push(StoreEntry { key, ticket }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Ticket> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.ticket)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.entries.iter().map(|entry| &entry.ticket)
    }

    /// Tickets whose submission started but never reached an outcome.
    pub fn unfinished(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets()
            .filter(|ticket| ticket.status == TicketStatus::Pending)
    }

    pub fn compute_key(prompt: &str, created_at: DateTime<Utc>) -> String {
        let mut hasher = Hasher::new();
        hasher.update(prompt.as_bytes());
        hasher.update(
            created_at
                .timestamp_nanos_opt()
                .unwrap_or_default()
                .to_string()
                .as_bytes(),
        );
        let digest = hasher.finalize().to_hex();
        format!("{LOCAL_ID_PREFIX}{}", &digest[..LOCAL_ID_HEX_LEN])
    }
}
