use crate::client::DEFAULT_API_URL;
use std::path::PathBuf;
use std::time::Duration;
use tracing_config_helper::LogFormat;
use url::Url;

pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000";

#[derive(Debug, clap::Parser)]
#[clap(about = "Terminal console of the RCA platform")]
pub struct LaunchConfig {
    /// Base url of the RCA platform API
    #[clap(long, env, default_value = DEFAULT_API_URL)]
    pub api_url: Url,
    /// Base used when building share links
    #[clap(long, env, default_value = DEFAULT_DASHBOARD_URL)]
    pub dashboard_url: Url,
    #[clap(long, env, default_value_t = 10)]
    pub request_timeout_secs: u64,
    #[clap(long, env, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
    #[clap(subcommand)]
    pub command: Command,
}

impl LaunchConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, clap::Subcommand)]
pub enum Command {
    /// Live dashboard, refreshed every 5 minutes on the wall clock
    Watch {
        /// Url the dashboard was opened with, `?highlight=<id>` focuses that error
        #[clap(long, env)]
        page_url: Option<Url>,
        /// Cards shown at once, 0 shows all of them
        #[clap(long, env, default_value_t = 20)]
        max_cards: usize,
    },
    /// Detail page of a single error
    Show { id: String },
    /// Writes the error's export payload to error-<id>.json
    Export {
        id: String,
        #[clap(long, default_value = ".")]
        out_dir: PathBuf,
    },
    Health,
    /// Asks the platform to run its error detection cycle now
    TriggerCycle,
}
