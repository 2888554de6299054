//! Metric collection and data structures.
//!
//! This module provides the collectors behind one dashboard refresh: battery
//! charge, DNS-filter status, uptime and temperature of the local and remote
//! hosts, free disk space and connectivity, plus the step that gathers them
//! sequentially or concurrently.

pub mod battery;
pub mod collector;
pub mod data;
pub mod local;
pub mod pihole;
pub mod remote;
pub mod traits;

// Re-export commonly used items
pub use collector::{gather, snapshot_stream, StatusCollector};
pub use data::{Reading, StatusSnapshot};
pub use traits::MetricSources;
