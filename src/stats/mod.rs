//! Worker statistics

pub mod metrics;

pub use metrics::{WorkerStats, WorkerStatsSnapshot};
