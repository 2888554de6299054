//! # pi_status - e-paper status dashboard for a Raspberry Pi DNS filter
//!
//! Collects a handful of metrics from a Raspberry Pi appliance running a
//! DNS filter (and optionally from a second, remote one) and paints them on a
//! 2.13" monochrome e-paper panel.
//!
//! ## Features
//!
//! - **Battery**: charge from the battery hat's TCP interface, optional RTC sync
//! - **DNS filter**: blocking state and blocked-query share via the session API
//! - **Host vitals**: uptime and CPU temperature, locally and over SSH
//! - **Disk and network**: free space on `/`, local IP, connectivity probe
//! - **Fan-out collection**: gather everything concurrently or in sequence
//! - **Rendering**: `embedded-graphics` layout on a 1-bit frame, written to a
//!   PBM file or previewed in the terminal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pi_status::{gather, render_dashboard, RenderOptions, Secrets, StatusCollector, StatusConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StatusConfig::default();
//!     let secrets = Secrets::from_config(&config);
//!     let collector = StatusCollector::new(config.clone(), secrets)?;
//!
//!     let snapshot = gather(&collector, config.collection_mode).await;
//!     let frame = render_dashboard(&snapshot, &RenderOptions::new(chrono::Local::now().naive_local()));
//!     println!("{} pixels inked", frame.ink_count());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod metrics;
pub mod render;

// Re-export public API
pub use config::{CollectionMode, Secrets, StatusConfig};
pub use display::{present, OutputTarget, Panel, PbmPanel, TerminalPanel};
pub use error::{Result, StatusError};
pub use metrics::{
    collector::{gather, snapshot_stream, StatusCollector},
    data::{Alert, BlockingState, DeviceStatus, FilterStats, HostVitals, Reading, StatusSnapshot},
    traits::MetricSources,
};
pub use render::{battery_fill_width, render_dashboard, Frame, RenderOptions};

/// Width of the 2.13" panel in landscape orientation
pub const PANEL_WIDTH: u32 = 250;

/// Height of the 2.13" panel in landscape orientation
pub const PANEL_HEIGHT: u32 = 122;

/// Battery percentage below which the alert bar warns
pub const DEFAULT_LOW_BATTERY_THRESHOLD: f32 = 20.0;

/// Default address of the battery manager's TCP interface
pub const DEFAULT_BATTERY_ADDR: &str = "127.0.0.1:8423";

/// Default refresh interval for `watch`, in seconds
pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 300;
