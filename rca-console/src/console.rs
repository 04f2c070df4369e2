use crate::cards::{CardError, SubView, Toggle};
use crate::client::TelemetryClient;
use crate::detail_cache::FetchTicket;
use crate::highlight::{HighlightOutcome, Highlighter};
use crate::scheduler::{start_refresh_schedule, ScheduleHandle, WallClock};
use crate::state::{DashboardState, PollApplied, PollSequence, Shared};
use api_structs::ErrorListQuery;
use backtraced_error::error_chain_to_pretty_formatted;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied(PollSequence),
    /// Completed after a newer poll had already been applied.
    Stale(PollSequence),
    Failed,
    TornDown,
}

/// Owns the dashboard state and every operation that mutates it: timed and
/// manual polls, card toggles and detail fetches.
///
/// `list_revision` moves whenever a poll replaces the error list,
/// `view_revision` whenever anything the renderer shows changed.
pub struct Console<C> {
    client: Arc<C>,
    state: Shared<DashboardState>,
    next_poll: AtomicU64,
    torn_down: AtomicBool,
    schedule: parking_lot::Mutex<Option<ScheduleHandle>>,
    list_revision: watch::Sender<u64>,
    view_revision: watch::Sender<u64>,
}

// Invalid transitions come from operator input, so they are returned and
// logged instead of asserted (see "Invalid transitions" in DESIGN.md).
fn rejected(e: CardError) -> CardError {
    error!("Rejected card operation: {e}");
    e
}

impl<C: TelemetryClient + 'static> Console<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Arc::new(parking_lot::RwLock::new(DashboardState::default())),
            next_poll: AtomicU64::new(1),
            torn_down: AtomicBool::new(false),
            schedule: parking_lot::Mutex::new(None),
            list_revision: watch::channel(0).0,
            view_revision: watch::channel(0).0,
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn state(&self) -> Shared<DashboardState> {
        Arc::clone(&self.state)
    }

    pub fn subscribe_list(&self) -> watch::Receiver<u64> {
        self.list_revision.subscribe()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<u64> {
        self.view_revision.subscribe()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Starts the aligned refresh schedule. The schedule only holds a weak
    /// reference, dropping the last `Arc` stops it too.
    pub fn start<W: WallClock>(self: &Arc<Self>, clock: W) {
        if self.is_torn_down() {
            warn!("Console was torn down, not starting the refresh schedule");
            return;
        }
        let console = Arc::downgrade(self);
        let handle = start_refresh_schedule(clock, move || {
            let console = console.upgrade();
            async move {
                if let Some(console) = console {
                    console.poll().await;
                }
            }
        });
        if let Some(previous) = self.schedule.lock().replace(handle) {
            debug!("Replacing previous refresh schedule");
            previous.shutdown();
        }
    }

    /// Fetches list and stats together and applies them if no newer poll got
    /// there first. Failures keep whatever was shown before.
    #[instrument(skip_all)]
    pub async fn poll(&self) -> PollOutcome {
        if self.is_torn_down() {
            debug!("Console torn down, skipping poll");
            return PollOutcome::TornDown;
        }
        let sequence = self.next_poll.fetch_add(1, Ordering::SeqCst);
        let query = ErrorListQuery::default();
        let fetched = tokio::try_join!(self.client.list_errors(&query), self.client.stats());
        let (list, stats) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(
                    "Poll {sequence} failed, keeping previous data: {}",
                    error_chain_to_pretty_formatted(e)
                );
                return PollOutcome::Failed;
            }
        };
        if self.is_torn_down() {
            return PollOutcome::TornDown;
        }
        let error_count = list.errors.len();
        let applied = self.state.write().apply_poll(sequence, list.errors, stats);
        match applied {
            PollApplied::Applied => {
                info!("Applied poll {sequence} with {error_count} errors");
                self.list_revision.send_modify(|revision| *revision += 1);
                self.bump_view();
                PollOutcome::Applied(sequence)
            }
            PollApplied::Stale => {
                debug!("Discarded stale poll {sequence}");
                PollOutcome::Stale(sequence)
            }
        }
    }

    /// Out of band poll, leaves the schedule untouched.
    pub async fn refresh(&self) -> PollOutcome {
        info!("Manual refresh");
        self.poll().await
    }

    /// Stops the schedule. Polls still in flight are never applied and no new
    /// ones are issued.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        if let Some(schedule) = self.schedule.lock().take() {
            schedule.shutdown();
        }
        info!("Console torn down");
    }

    pub async fn toggle(&self, id: &str) -> Result<Toggle, CardError> {
        let ticket = {
            let mut state = self.state.write();
            state.ensure_card(id).map_err(rejected)?;
            match state.cards.toggle(id) {
                Toggle::Expanded => Some(state.details.begin_fetch(id)),
                Toggle::Collapsed => {
                    state.details.discard(id);
                    None
                }
            }
        };
        self.bump_view();
        match ticket {
            Some(ticket) => {
                self.fetch_detail(ticket).await;
                Ok(Toggle::Expanded)
            }
            None => Ok(Toggle::Collapsed),
        }
    }

    /// Expands the card and fetches its details. Returns `Ok(false)` without
    /// fetching if it already was expanded.
    #[instrument(skip(self))]
    pub async fn expand(&self, id: &str) -> Result<bool, CardError> {
        let ticket = {
            let mut state = self.state.write();
            state.ensure_card(id).map_err(rejected)?;
            if !state.cards.expand(id) {
                return Ok(false);
            }
            state.details.begin_fetch(id)
        };
        self.bump_view();
        self.fetch_detail(ticket).await;
        Ok(true)
    }

    async fn fetch_detail(&self, ticket: FetchTicket) {
        let result = self.client.error_detail(&ticket.id).await;
        if self.state.write().complete_detail(&ticket, result) {
            self.bump_view();
        }
    }

    /// Collapses the card and forgets its details.
    pub fn collapse(&self, id: &str) -> Result<bool, CardError> {
        let collapsed = {
            let mut state = self.state.write();
            state.ensure_card(id).map_err(rejected)?;
            let collapsed = state.cards.collapse(id);
            state.details.discard(id);
            collapsed
        };
        if collapsed {
            self.bump_view();
        }
        Ok(collapsed)
    }

    /// Switches tabs using cached data only.
    pub fn select_sub_view(&self, id: &str, tag: &str) -> Result<SubView, CardError> {
        let view: SubView = tag.parse().map_err(rejected)?;
        {
            let mut state = self.state.write();
            state.ensure_card(id).map_err(rejected)?;
            state.cards.select_sub_view(id, view).map_err(rejected)?;
        }
        self.bump_view();
        Ok(view)
    }

    /// Emphasizes the deep linked card once the first list is in.
    pub async fn run_highlighter(&self, highlighter: Highlighter) -> HighlightOutcome {
        let outcome = highlighter
            .run(Arc::clone(&self.state), self.list_revision.subscribe())
            .await;
        if let HighlightOutcome::Emphasized { .. } = outcome {
            self.bump_view();
        }
        outcome
    }

    fn bump_view(&self) {
        self.view_revision.send_modify(|revision| *revision += 1);
    }
}
