use crate::client::{Error, TelemetryClient};
use api_structs::{
    EnvironmentCount, ErrorDetail, ErrorGroup, ErrorListQuery, ErrorListResponse, HealthResponse,
    Last24Hours, ServiceCount, StatsSnapshot, TotalData, TriggerCycleResponse,
};
use chrono::NaiveDateTime;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub(crate) fn time(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

pub(crate) fn group(id: &str, service: &str) -> ErrorGroup {
    ErrorGroup {
        id: id.to_string(),
        env: Some("prod".to_string()),
        service: Some(service.to_string()),
        span_kind: Some("SERVER".to_string()),
        http_code: Some("500".to_string()),
        exception: Some("TimeoutError".to_string()),
        root_name: Some("POST /pay".to_string()),
        count: 3,
        window_start: time("2025-01-01 10:00:00"),
        window_end: time("2025-01-01 10:05:00"),
        created_at: None,
    }
}

pub(crate) fn stats(total_errors: u64) -> StatsSnapshot {
    StatsSnapshot {
        last_24_hours: Last24Hours {
            total_errors,
            environments: vec![EnvironmentCount {
                env: Some("prod".to_string()),
                count: total_errors,
            }],
            top_services: vec![ServiceCount {
                service: Some("checkout".to_string()),
                count: total_errors,
            }],
        },
        total_data: TotalData {
            traces: 10,
            logs: 20,
            rca_reports: 1,
        },
    }
}

pub(crate) fn empty_detail(group: ErrorGroup) -> ErrorDetail {
    ErrorDetail {
        error: group,
        traces: vec![],
        spans: vec![],
        logs: vec![],
        rca_report: None,
    }
}

pub(crate) fn network_error() -> Error {
    Error::Non200Status {
        url: "http://fake/api".to_string(),
        status: reqwest::StatusCode::BAD_GATEWAY,
        body: "upstream down".to_string(),
    }
}

/// In memory backend. Counts every call. Detail requests wait on `detail_gate`,
/// list requests each take the next queued gate, so tests decide the order in
/// which overlapping polls complete.
#[derive(Default)]
pub(crate) struct FakeTelemetry {
    pub errors: parking_lot::Mutex<Vec<ErrorGroup>>,
    pub stats: parking_lot::Mutex<StatsSnapshot>,
    pub details: parking_lot::Mutex<HashMap<String, ErrorDetail>>,
    pub fail_errors: AtomicBool,
    pub fail_stats: AtomicBool,
    pub fail_details: AtomicBool,
    pub list_calls: AtomicUsize,
    pub stats_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub detail_gate: Option<Arc<Semaphore>>,
    pub list_gates: parking_lot::Mutex<VecDeque<Arc<Semaphore>>>,
}

impl FakeTelemetry {
    pub fn with_errors(errors: Vec<ErrorGroup>) -> Self {
        let fake = Self::default();
        *fake.stats.lock() = stats(errors.len() as u64);
        *fake.errors.lock() = errors;
        fake
    }

    pub fn set_errors(&self, errors: Vec<ErrorGroup>) {
        *self.errors.lock() = errors;
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Gate for the next list request that has not started yet.
    pub fn queue_list_gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.list_gates.lock().push_back(Arc::clone(&gate));
        gate
    }
}

pub(crate) async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

async fn pass_gate(gate: &Option<Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

#[async_trait::async_trait]
impl TelemetryClient for FakeTelemetry {
    async fn list_errors(&self, query: &ErrorListQuery) -> Result<ErrorListResponse, Error> {
        assert_eq!(query, &ErrorListQuery::default());
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let errors = self.errors.lock().clone();
        let gate = self.list_gates.lock().pop_front();
        pass_gate(&gate).await;
        if self.fail_errors.load(Ordering::SeqCst) {
            return Err(network_error());
        }
        Ok(ErrorListResponse {
            total: Some(errors.len() as u64),
            errors,
        })
    }

    async fn stats(&self) -> Result<StatsSnapshot, Error> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(network_error());
        }
        Ok(self.stats.lock().clone())
    }

    async fn error_detail(&self, id: &str) -> Result<ErrorDetail, Error> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(&self.detail_gate).await;
        if self.fail_details.load(Ordering::SeqCst) {
            return Err(network_error());
        }
        let stored = self.details.lock().get(id).cloned();
        if let Some(detail) = stored {
            return Ok(detail);
        }
        let group = self.errors.lock().iter().find(|e| e.id == id).cloned();
        match group {
            Some(group) => Ok(empty_detail(group)),
            None => Err(Error::NotFound {
                url: format!("http://fake/api/errors/{id}"),
            }),
        }
    }

    async fn error_export(&self, id: &str) -> Result<serde_json::Value, Error> {
        let detail = self.error_detail(id).await?;
        Ok(serde_json::json!({
            "error_card": {"service": detail.error.service},
            "trace_ids_hex": [],
        }))
    }

    async fn health(&self) -> Result<HealthResponse, Error> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            timestamp: None,
        })
    }

    async fn trigger_cycle(&self) -> Result<TriggerCycleResponse, Error> {
        Ok(TriggerCycleResponse {
            message: "Manual cycle triggered successfully".to_string(),
            error_cards_found: self.errors.lock().len() as u64,
            next_boundary: None,
        })
    }
}
