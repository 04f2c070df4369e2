use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::serde_as;
use serde_with::NoneAsEmptyString;

pub type ErrorGroupId = String;

/// One aggregated error signature over a 5 minute window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorGroup {
    pub id: ErrorGroupId,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub span_kind: Option<String>,
    #[serde(default)]
    pub http_code: Option<String>,
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub root_name: Option<String>,
    /// The backend stores this as a float column, so `3.0` and `3` are both valid.
    #[serde(deserialize_with = "occurrence_count")]
    pub count: u64,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

fn occurrence_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0. {
        return Err(serde::de::Error::custom(format!(
            "occurrence count must be a non negative number, got {raw}"
        )));
    }
    Ok(raw.round() as u64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorListResponse {
    #[serde(default)]
    pub errors: Vec<ErrorGroup>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Query string of `GET errors`. Missing filters are sent as empty strings,
/// which the backend treats as "no filter".
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorListQuery {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub env: Option<String>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub service: Option<String>,
    pub hours: u32,
}

impl Default for ErrorListQuery {
    fn default() -> Self {
        Self {
            env: None,
            service: None,
            hours: crate::DEFAULT_LOOKBACK_HOURS,
        }
    }
}
