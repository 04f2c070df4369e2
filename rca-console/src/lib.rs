//! Client side of the RCA platform console.
//!
//! The dashboard keeps a list of error groups fresh on a wall clock aligned
//! schedule, lets the operator expand any error into its correlated traces,
//! spans, logs and RCA report, and focuses a deep linked error on load.
pub mod cards;
pub mod client;
pub mod commands;
pub mod config;
pub mod console;
pub mod detail_cache;
pub mod export;
pub mod highlight;
pub mod render;
pub mod scheduler;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use console::Console;
pub use state::{DashboardState, Shared};
