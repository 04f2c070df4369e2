pub mod detail;
pub mod errors;
pub mod platform;
pub mod stats;
