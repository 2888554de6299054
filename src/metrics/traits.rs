//! Trait for the set of metric sources a dashboard refresh draws from.

use crate::metrics::data::{FilterStats, HostVitals, Reading};
use async_trait::async_trait;

/// The fixed set of collectors behind one dashboard refresh.
///
/// Every method is infallible: implementations log failures and return the
/// placeholder for the affected field.
#[async_trait]
pub trait MetricSources: Send + Sync {
    /// Name shown for the local device.
    fn local_name(&self) -> String;

    /// Name and address of the remote device, if one is configured.
    fn remote_identity(&self) -> Option<(String, String)>;

    /// Battery charge in percent.
    async fn battery(&self) -> Reading<f32>;

    /// IP address of the local device.
    async fn local_address(&self) -> Reading<String>;

    /// DNS-filter status of the local device.
    async fn local_filter(&self) -> FilterStats;

    /// Uptime and temperature of the local device.
    async fn local_vitals(&self) -> HostVitals;

    /// DNS-filter status of the remote device.
    async fn remote_filter(&self) -> Option<FilterStats>;

    /// Uptime and temperature of the remote device.
    async fn remote_vitals(&self) -> Option<HostVitals>;

    /// Free bytes on the monitored mount point.
    async fn disk_free(&self) -> Reading<u64>;

    /// Whether the connectivity probe succeeds.
    async fn connectivity(&self) -> bool;
}
