use serde::{Deserialize, Serialize};

/// Rolling 24 hour counters shown on top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub last_24_hours: Last24Hours,
    #[serde(default)]
    pub total_data: TotalData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Last24Hours {
    #[serde(default)]
    pub total_errors: u64,
    #[serde(default)]
    pub environments: Vec<EnvironmentCount>,
    #[serde(default)]
    pub top_services: Vec<ServiceCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentCount {
    #[serde(default)]
    pub env: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCount {
    #[serde(default)]
    pub service: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalData {
    #[serde(default)]
    pub traces: u64,
    #[serde(default)]
    pub logs: u64,
    #[serde(default)]
    pub rca_reports: u64,
}
