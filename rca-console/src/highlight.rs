use crate::state::{DashboardState, Shared};
use api_structs::ErrorGroupId;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

pub const HIGHLIGHT_QUERY_PARAMETER: &str = "highlight";
pub const DASHBOARD_PATH: &str = "dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightOutcome {
    NoTarget,
    Emphasized { id: ErrorGroupId, position: usize },
    /// Unknown or expired id, not an error.
    NotFound { id: ErrorGroupId },
    /// The list was never populated before the console went away.
    ListNeverRendered { id: ErrorGroupId },
}

/// Reads the error id the page was deep linked to, if any.
pub fn highlight_target(page_url: &Url) -> Option<ErrorGroupId> {
    page_url
        .query_pairs()
        .find(|(key, value)| key == HIGHLIGHT_QUERY_PARAMETER && !value.is_empty())
        .map(|(_key, value)| value.into_owned())
}

/// `<dashboard base>/dashboard`
pub fn dashboard_link(dashboard_url: &Url) -> Url {
    let mut link = dashboard_url.clone();
    let base_path = link.path().trim_end_matches('/').to_string();
    link.set_path(&format!("{base_path}/{DASHBOARD_PATH}"));
    link.set_fragment(None);
    link.set_query(None);
    link
}

/// `<dashboard base>/dashboard?highlight=<id>`, the link another operator can
/// open to land on the same card.
pub fn share_link(dashboard_url: &Url, id: &str) -> Url {
    let mut link = dashboard_link(dashboard_url);
    link.query_pairs_mut()
        .append_pair(HIGHLIGHT_QUERY_PARAMETER, id);
    link
}

/// One shot emphasis of a deep linked card.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    target: Option<ErrorGroupId>,
}

impl Highlighter {
    pub fn from_page_url(page_url: Option<&Url>) -> Self {
        let target = page_url.and_then(highlight_target);
        if let Some(target) = &target {
            info!("Page deep links to error {target}");
        }
        Self { target }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Marks the matching card as highlighted in the current list.
    pub fn apply(self, state: &mut DashboardState) -> HighlightOutcome {
        let Some(id) = self.target else {
            return HighlightOutcome::NoTarget;
        };
        match state.errors().iter().position(|e| e.id == id) {
            Some(position) => {
                state.cards.highlight(&id);
                info!("Highlighted error {id} at position {position}");
                HighlightOutcome::Emphasized { id, position }
            }
            None => {
                debug!("Deep linked error {id} is not in the list");
                HighlightOutcome::NotFound { id }
            }
        }
    }

    /// Waits until the first list has been applied, then tries once.
    pub async fn run(
        self,
        state: Shared<DashboardState>,
        mut list_revision: watch::Receiver<u64>,
    ) -> HighlightOutcome {
        let Some(id) = self.target.clone() else {
            return HighlightOutcome::NoTarget;
        };
        if list_revision.wait_for(|revision| *revision > 0).await.is_err() {
            return HighlightOutcome::ListNeverRendered { id };
        }
        let mut state = state.write();
        self.apply(&mut state)
    }
}
