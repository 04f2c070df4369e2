use crate::ui::errors::ErrorGroup;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Everything correlated with a single error group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub error: ErrorGroup,
    #[serde(default)]
    pub traces: Vec<Trace>,
    #[serde(default)]
    pub spans: Vec<Span>,
    #[serde(default)]
    pub logs: Vec<Log>,
    #[serde(default)]
    pub rca_report: Option<RcaReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub trace_id_hex: Option<String>,
    #[serde(default)]
    pub trace_id_b64: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "trace_id")]
    pub trace_id_hex: Option<String>,
    #[serde(default)]
    pub span_id: Option<String>,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    /// Seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Span {
    pub fn duration_ms(&self) -> Option<f64> {
        self.duration
            .map(crate::time_conversion::secs_f64_to_millis_f64)
    }
}

/// A log line attached to one of the error's traces. `log_data` is whatever the
/// log provider returned, usually an object with `level`, `message` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "trace_id")]
    pub trace_id_hex: Option<String>,
    #[serde(default)]
    pub log_data: Option<Value>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Log {
    pub fn level(&self) -> Option<String> {
        self.log_data_field("level")
    }
    pub fn message(&self) -> Option<String> {
        self.log_data_field("message")
    }
    pub fn timestamp(&self) -> Option<String> {
        self.log_data_field("timestamp")
    }

    fn log_data_field(&self, key: &str) -> Option<String> {
        match self.log_data.as_ref()?.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcaReport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub analysis_summary: Option<String>,
    #[serde(default)]
    pub correlation_data: Option<Value>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}
