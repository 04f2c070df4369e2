use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Answer of `POST trigger-cycle`, which runs one ingestion cycle on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCycleResponse {
    pub message: String,
    #[serde(default)]
    pub error_cards_found: u64,
    #[serde(default)]
    pub next_boundary: Option<String>,
}
