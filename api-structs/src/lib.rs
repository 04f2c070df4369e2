//! Shapes exchanged with the RCA platform API.
//!
//! Everything here mirrors what the backend serializes, which is why most
//! descriptive fields are optional: the backend stores them nullable.
pub mod time_conversion;
pub mod ui;

pub use ui::detail::{ErrorDetail, Log, RcaReport, Span, Trace};
pub use ui::platform::{HealthResponse, TriggerCycleResponse};
pub use ui::errors::{ErrorGroup, ErrorGroupId, ErrorListQuery, ErrorListResponse};
pub use ui::stats::{EnvironmentCount, Last24Hours, ServiceCount, StatsSnapshot, TotalData};

/// Lookback used by the dashboard poll.
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;
