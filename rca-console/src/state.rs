use crate::cards::CardStates;
use crate::cards::CardError;
use crate::client;
use crate::detail_cache::{DetailCache, FetchTicket};
use api_structs::{ErrorDetail, ErrorGroup, StatsSnapshot};
use std::collections::HashSet;
use tracing::debug;

pub type Shared<T> = std::sync::Arc<parking_lot::RwLock<T>>;

/// Monotonic id of a list+stats poll, assigned when the poll is issued.
pub type PollSequence = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollApplied {
    Applied,
    /// A newer poll was already applied.
    Stale,
}

/// Everything the dashboard renders from. List and stats are only written by
/// [`DashboardState::apply_poll`], detail entries only through the card operations.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    errors: Vec<ErrorGroup>,
    stats: Option<StatsSnapshot>,
    applied_poll: Option<PollSequence>,
    pub cards: CardStates,
    pub details: DetailCache,
}

impl DashboardState {
    pub fn errors(&self) -> &[ErrorGroup] {
        &self.errors
    }

    pub fn stats(&self) -> Option<&StatsSnapshot> {
        self.stats.as_ref()
    }

    pub fn applied_poll(&self) -> Option<PollSequence> {
        self.applied_poll
    }

    /// False until the first successful poll.
    pub fn has_loaded(&self) -> bool {
        self.applied_poll.is_some()
    }

    pub fn error(&self, id: &str) -> Option<&ErrorGroup> {
        self.errors.iter().find(|e| e.id == id)
    }

    pub fn ensure_card(&self, id: &str) -> Result<(), CardError> {
        match self.error(id) {
            Some(_) => Ok(()),
            None => Err(CardError::UnknownCard(id.to_string())),
        }
    }

    /// Replaces list and stats together. Card and detail state is kept for ids
    /// present in the new list and dropped for the rest.
    pub fn apply_poll(
        &mut self,
        sequence: PollSequence,
        errors: Vec<ErrorGroup>,
        stats: StatsSnapshot,
    ) -> PollApplied {
        if let Some(applied) = self.applied_poll {
            if applied >= sequence {
                debug!("Poll {sequence} is older than applied poll {applied}");
                return PollApplied::Stale;
            }
        }
        let present: HashSet<&str> = errors.iter().map(|e| e.id.as_str()).collect();
        self.cards.retain_present(&present);
        self.details.retain_present(&present);
        self.errors = errors;
        self.stats = Some(stats);
        self.applied_poll = Some(sequence);
        PollApplied::Applied
    }

    /// Applies a detail response only while its card is still expanded and
    /// still waiting for this exact fetch.
    pub fn complete_detail(
        &mut self,
        ticket: &FetchTicket,
        result: Result<ErrorDetail, client::Error>,
    ) -> bool {
        if !self.cards.is_expanded(&ticket.id) {
            self.details.discard(&ticket.id);
            return false;
        }
        self.details.complete(ticket, result)
    }
}
