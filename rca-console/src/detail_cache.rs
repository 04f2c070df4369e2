use crate::client;
use api_structs::{ErrorDetail, ErrorGroupId};
use backtraced_error::error_chain_to_pretty_formatted;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Proof that a detail fetch was started for an expansion. A result is only
/// accepted while the entry it was issued for is still waiting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: ErrorGroupId,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailEntry {
    Loading { generation: u64 },
    Loaded(ErrorDetail),
    /// Transport, decoding or not found. Renders as "no data".
    Failed { reason: String },
}

/// Correlated telemetry of every expanded card, at most one entry per error id.
#[derive(Debug, Clone, Default)]
pub struct DetailCache {
    entries: HashMap<ErrorGroupId, DetailEntry>,
    next_generation: u64,
}

impl DetailCache {
    pub fn begin_fetch(&mut self, id: &str) -> FetchTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.entries
            .insert(id.to_string(), DetailEntry::Loading { generation });
        FetchTicket {
            id: id.to_string(),
            generation,
        }
    }

    /// Stores the outcome of `ticket`'s fetch. Returns false, leaving the cache
    /// untouched, when the entry was discarded or re-issued in the meantime.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<ErrorDetail, client::Error>,
    ) -> bool {
        match self.entries.get(&ticket.id) {
            Some(DetailEntry::Loading { generation }) if *generation == ticket.generation => {}
            _ => {
                debug!("Discarding detail response for {}, no longer awaited", ticket.id);
                return false;
            }
        }
        let entry = match result {
            Ok(detail) => DetailEntry::Loaded(detail),
            Err(e) => {
                let reason = if e.is_not_found() {
                    "error no longer exists".to_string()
                } else {
                    "details could not be fetched".to_string()
                };
                warn!(
                    "Detail fetch for {} failed: {}",
                    ticket.id,
                    error_chain_to_pretty_formatted(&e)
                );
                DetailEntry::Failed { reason }
            }
        };
        self.entries.insert(ticket.id.clone(), entry);
        true
    }

    pub fn discard(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&DetailEntry> {
        self.entries.get(id)
    }

    pub fn detail(&self, id: &str) -> Option<&ErrorDetail> {
        match self.entries.get(id) {
            Some(DetailEntry::Loaded(detail)) => Some(detail),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retain_present(&mut self, present: &HashSet<&str>) {
        self.entries
            .retain(|id, _entry| present.contains(id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{empty_detail, group, network_error};

    #[test]
    fn completed_fetch_is_cached() {
        let mut cache = DetailCache::default();
        let ticket = cache.begin_fetch("E1");
        assert!(matches!(cache.get("E1"), Some(DetailEntry::Loading { .. })));
        assert!(cache.detail("E1").is_none());
        assert!(cache.complete(&ticket, Ok(empty_detail(group("E1", "checkout")))));
        assert_eq!(cache.detail("E1").unwrap().error.id, "E1");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn late_response_after_discard_is_dropped() {
        let mut cache = DetailCache::default();
        let ticket = cache.begin_fetch("E1");
        assert!(cache.discard("E1"));
        assert!(!cache.complete(&ticket, Ok(empty_detail(group("E1", "checkout")))));
        assert!(cache.get("E1").is_none());
    }

    #[test]
    fn superseded_ticket_is_dropped() {
        let mut cache = DetailCache::default();
        let first = cache.begin_fetch("E1");
        cache.discard("E1");
        let second = cache.begin_fetch("E1");
        assert!(!cache.complete(&first, Ok(empty_detail(group("E1", "stale")))));
        assert!(cache.complete(&second, Ok(empty_detail(group("E1", "fresh")))));
        assert_eq!(
            cache.detail("E1").unwrap().error.service.as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn failures_are_stored_as_no_data() {
        let mut cache = DetailCache::default();
        let ticket = cache.begin_fetch("E1");
        assert!(cache.complete(&ticket, Err(network_error())));
        assert!(matches!(cache.get("E1"), Some(DetailEntry::Failed { .. })));
        assert!(cache.detail("E1").is_none());
    }

    #[test]
    fn keyed_entries_do_not_clobber_each_other() {
        let mut cache = DetailCache::default();
        let first = cache.begin_fetch("E1");
        let second = cache.begin_fetch("E2");
        cache.complete(&second, Ok(empty_detail(group("E2", "search"))));
        cache.complete(&first, Ok(empty_detail(group("E1", "checkout"))));
        assert_eq!(cache.len(), 2);
        cache.retain_present(&HashSet::from(["E2"]));
        assert!(cache.get("E1").is_none());
        assert!(cache.detail("E2").is_some());
    }
}
