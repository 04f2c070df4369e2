use api_structs::ErrorGroupId;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Tabs of an expanded error card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubView {
    #[default]
    Overview,
    Traces,
    Spans,
    Logs,
    Correlation,
    Rca,
}

impl SubView {
    pub const ALL: [SubView; 6] = [
        SubView::Overview,
        SubView::Traces,
        SubView::Spans,
        SubView::Logs,
        SubView::Correlation,
        SubView::Rca,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            SubView::Overview => "overview",
            SubView::Traces => "traces",
            SubView::Spans => "spans",
            SubView::Logs => "logs",
            SubView::Correlation => "correlation",
            SubView::Rca => "rca",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubView::Overview => "Overview",
            SubView::Traces => "Traces",
            SubView::Spans => "Spans",
            SubView::Logs => "Logs",
            SubView::Correlation => "Correlation",
            SubView::Rca => "RCA Analysis",
        }
    }
}

impl Display for SubView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for SubView {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubView::ALL
            .into_iter()
            .find(|view| view.tag() == s)
            .ok_or_else(|| CardError::UnknownSubView(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("unknown sub view {0:?}, expected one of: overview, traces, spans, logs, correlation, rca")]
    UnknownSubView(String),
    #[error("card {0} is collapsed, expand it before selecting a sub view")]
    NotExpanded(ErrorGroupId),
    #[error("no error card with id {0} in the current list")]
    UnknownCard(ErrorGroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardUiState {
    pub expanded: bool,
    /// Only meaningful while expanded.
    pub active_sub_view: SubView,
    pub highlighted: bool,
}

/// View state of every card in the current list, keyed by error id so it
/// survives list replacement.
#[derive(Debug, Clone, Default)]
pub struct CardStates {
    states: HashMap<ErrorGroupId, CardUiState>,
}

impl CardStates {
    pub fn get(&self, id: &str) -> CardUiState {
        self.states.get(id).cloned().unwrap_or_default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.states.get(id).map(|s| s.expanded).unwrap_or(false)
    }

    pub fn expanded_ids(&self) -> impl Iterator<Item = &ErrorGroupId> {
        self.states
            .iter()
            .filter(|(_id, state)| state.expanded)
            .map(|(id, _state)| id)
    }

    /// Returns false if the card was already expanded.
    pub fn expand(&mut self, id: &str) -> bool {
        let state = self.states.entry(id.to_string()).or_default();
        if state.expanded {
            return false;
        }
        state.expanded = true;
        state.active_sub_view = SubView::Overview;
        true
    }

    /// Returns false if the card was already collapsed.
    pub fn collapse(&mut self, id: &str) -> bool {
        match self.states.get_mut(id) {
            Some(state) if state.expanded => {
                state.expanded = false;
                state.active_sub_view = SubView::Overview;
                true
            }
            _ => false,
        }
    }

    pub fn toggle(&mut self, id: &str) -> Toggle {
        if self.collapse(id) {
            Toggle::Collapsed
        } else {
            self.expand(id);
            Toggle::Expanded
        }
    }

    pub fn select_sub_view(&mut self, id: &str, view: SubView) -> Result<(), CardError> {
        match self.states.get_mut(id) {
            Some(state) if state.expanded => {
                state.active_sub_view = view;
                Ok(())
            }
            _ => Err(CardError::NotExpanded(id.to_string())),
        }
    }

    pub fn highlight(&mut self, id: &str) {
        self.states.entry(id.to_string()).or_default().highlighted = true;
    }

    pub fn highlighted_id(&self) -> Option<&ErrorGroupId> {
        self.states
            .iter()
            .find(|(_id, state)| state.highlighted)
            .map(|(id, _state)| id)
    }

    /// Drops the state of every card not in `present`.
    pub fn retain_present(&mut self, present: &HashSet<&str>) {
        self.states.retain(|id, _state| present.contains(id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_defined_tag_and_rejects_others() {
        for view in SubView::ALL {
            assert_eq!(SubView::from_str(view.tag()), Ok(view));
        }
        assert_eq!(
            SubView::from_str("flamegraph"),
            Err(CardError::UnknownSubView("flamegraph".to_string()))
        );
        assert!(SubView::from_str("Overview").is_err());
        assert!(SubView::from_str("").is_err());
    }

    #[test]
    fn cards_start_collapsed_on_overview() {
        let cards = CardStates::default();
        assert_eq!(cards.get("E1"), CardUiState::default());
        assert!(!cards.is_expanded("E1"));
        assert_eq!(cards.get("E1").active_sub_view, SubView::Overview);
    }

    #[test]
    fn toggle_cycles_and_resets_sub_view() {
        let mut cards = CardStates::default();
        assert_eq!(cards.toggle("E1"), Toggle::Expanded);
        cards.select_sub_view("E1", SubView::Logs).unwrap();
        assert_eq!(cards.get("E1").active_sub_view, SubView::Logs);
        assert_eq!(cards.toggle("E1"), Toggle::Collapsed);
        assert_eq!(cards.get("E1").active_sub_view, SubView::Overview);
        assert_eq!(cards.toggle("E1"), Toggle::Expanded);
        assert_eq!(cards.get("E1").active_sub_view, SubView::Overview);
    }

    #[test]
    fn expand_is_idempotent() {
        let mut cards = CardStates::default();
        assert!(cards.expand("E1"));
        cards.select_sub_view("E1", SubView::Spans).unwrap();
        assert!(!cards.expand("E1"));
        assert_eq!(cards.get("E1").active_sub_view, SubView::Spans);
    }

    #[test]
    fn sub_view_requires_expanded_card() {
        let mut cards = CardStates::default();
        assert_eq!(
            cards.select_sub_view("E1", SubView::Rca),
            Err(CardError::NotExpanded("E1".to_string()))
        );
        cards.expand("E1");
        cards.collapse("E1");
        assert!(cards.select_sub_view("E1", SubView::Rca).is_err());
    }

    #[test]
    fn several_cards_can_be_expanded() {
        let mut cards = CardStates::default();
        cards.expand("E1");
        cards.expand("E2");
        let mut expanded: Vec<_> = cards.expanded_ids().cloned().collect();
        expanded.sort();
        assert_eq!(expanded, vec!["E1".to_string(), "E2".to_string()]);
    }

    #[test]
    fn retain_keeps_present_ids_only() {
        let mut cards = CardStates::default();
        cards.expand("E1");
        cards.select_sub_view("E1", SubView::Traces).unwrap();
        cards.expand("E2");
        cards.highlight("E2");
        cards.retain_present(&HashSet::from(["E1", "E3"]));
        assert_eq!(
            cards.get("E1"),
            CardUiState {
                expanded: true,
                active_sub_view: SubView::Traces,
                highlighted: false,
            }
        );
        assert_eq!(cards.get("E2"), CardUiState::default());
        assert_eq!(cards.highlighted_id(), None);
    }
}
