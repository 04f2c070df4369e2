//! This serves as an unified logging config for the console binaries.
//! Logs go to stderr, so stdout is left alone for whatever the binary renders.
//!
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::subscriber::{self, SetGlobalDefaultError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format {other}, expected one of: pretty, json"
            )),
        }
    }
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Uses RUST_LOG, see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
/// on how to configure that. If not present or invalid, defaults to plain "info".
pub fn env_filter_or_default() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|e| {
        eprintln!("Missing or invalid RUST_LOG, defaulting to {DEFAULT_FILTER}. {e}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Installs the global subscriber. Can only succeed once per process.
pub fn setup_logging(format: LogFormat) -> Result<(), SetGlobalDefaultError> {
    let filter = env_filter_or_default();
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .boxed(),
    };
    let subscriber = Registry::default().with(fmt_layer.with_filter(filter));
    subscriber::set_global_default(subscriber)
}

/// Test output captured per test, safe to call from every test.
pub fn setup_logging_for_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter_or_default())
        .with_test_writer()
        .compact()
        .try_init();
}
