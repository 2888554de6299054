//! Data structures for collected status metrics.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

/// Text shown in place of a metric that could not be collected.
pub const PLACEHOLDER: &str = "N/A";

/// A single collected value, or the placeholder when collection failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    /// The collector produced a value
    Value(T),
    /// The collector failed; render the placeholder
    Unavailable,
}

impl<T> Default for Reading<T> {
    fn default() -> Self {
        Reading::Unavailable
    }
}

impl<T> Reading<T> {
    /// Convert a collection result into a reading, logging the failure.
    pub fn capture<E: fmt::Display>(metric: &str, result: std::result::Result<T, E>) -> Self {
        match result {
            Ok(value) => Reading::Value(value),
            Err(err) => {
                warn!(metric, error = %err, "metric unavailable, using placeholder");
                Reading::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(value) => Some(value),
            Reading::Unavailable => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Reading::Value(value) => Some(value),
            Reading::Unavailable => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Value(value) => Reading::Value(f(value)),
            Reading::Unavailable => Reading::Unavailable,
        }
    }

    /// Prefer this reading, falling back to `other` when unavailable.
    pub fn or(self, other: Reading<T>) -> Reading<T> {
        match self {
            Reading::Value(_) => self,
            Reading::Unavailable => other,
        }
    }

    /// Format the value with `f`, or return the placeholder.
    pub fn format_with(&self, f: impl FnOnce(&T) -> String) -> String {
        match self {
            Reading::Value(value) => f(value),
            Reading::Unavailable => PLACEHOLDER.to_string(),
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Reading::Value(value),
            None => Reading::Unavailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(value) => value.fmt(f),
            Reading::Unavailable => f.write_str(PLACEHOLDER),
        }
    }
}

// Readings travel as the bare value or `null`.
impl<T: Serialize> Serialize for Reading<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Reading<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Reading::from)
    }
}

/// Blocking state reported by the DNS filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockingState {
    Enabled,
    Disabled,
    Failed,
    Unknown,
}

impl BlockingState {
    /// Parse the API's blocking string. Unrecognised values map to `Unknown`.
    pub fn from_api(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "enabled" => BlockingState::Enabled,
            "disabled" => BlockingState::Disabled,
            "failed" => BlockingState::Failed,
            _ => BlockingState::Unknown,
        }
    }

    pub fn is_active(self) -> bool {
        self == BlockingState::Enabled
    }

    /// Short label used on the panel.
    pub fn label(self) -> &'static str {
        match self {
            BlockingState::Enabled => "ON",
            BlockingState::Disabled => "OFF",
            BlockingState::Failed => "FAIL",
            BlockingState::Unknown => "?",
        }
    }
}

impl fmt::Display for BlockingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// DNS-filter status and query statistics for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterStats {
    /// Whether the filter is currently blocking
    pub blocking: Reading<BlockingState>,
    /// Share of queries blocked (0.0 to 100.0)
    pub blocked_percent: Reading<f64>,
    /// Total queries seen by the filter
    pub total_queries: Reading<u64>,
    /// Queries the filter blocked
    pub blocked_queries: Reading<u64>,
}

/// Uptime and CPU temperature of one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostVitals {
    /// Seconds since boot
    pub uptime_seconds: Reading<u64>,
    /// CPU temperature in Celsius
    pub cpu_celsius: Reading<f32>,
}

/// Everything shown for one device on the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Display name of the device
    pub name: String,
    /// IP address (or host name for remote devices)
    pub address: Reading<String>,
    /// DNS-filter status
    pub filter: FilterStats,
    /// Uptime and temperature
    pub vitals: HostVitals,
}

impl DeviceStatus {
    /// A record where every metric is the placeholder.
    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Reading::Unavailable,
            filter: FilterStats::default(),
            vitals: HostVitals::default(),
        }
    }

    pub fn filter_active(&self) -> bool {
        self.filter
            .blocking
            .value()
            .map(|state| state.is_active())
            .unwrap_or(false)
    }
}

/// Condition worth shouting about in the alert bar.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Battery below the configured threshold
    LowBattery(f32),
    /// The named device's DNS filter is not blocking
    FilterInactive(String),
    /// Connectivity probe failed
    Offline,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::LowBattery(percent) => write!(f, "LOW BATTERY {percent:.0}%"),
            Alert::FilterInactive(device) => write!(f, "DNS OFF: {device}"),
            Alert::Offline => f.write_str("OFFLINE"),
        }
    }
}

/// A complete set of metrics for one dashboard refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Timestamp when collection finished (Unix timestamp in milliseconds)
    pub timestamp: u64,
    /// Wall-clock time spent collecting, in milliseconds
    pub elapsed_ms: u64,
    /// Battery charge (0.0 to 100.0)
    pub battery_percent: Reading<f32>,
    /// The device running the panel
    pub local: DeviceStatus,
    /// Optional second device
    pub remote: Option<DeviceStatus>,
    /// Free space on the monitored mount point
    pub disk_free_bytes: Reading<u64>,
    /// Whether the connectivity probe succeeded
    pub online: bool,
}

impl StatusSnapshot {
    /// An all-placeholder snapshot stamped with the current time.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            timestamp: now_millis(),
            elapsed_ms: 0,
            battery_percent: Reading::Unavailable,
            local: DeviceStatus::unavailable(local_name),
            remote: None,
            disk_free_bytes: Reading::Unavailable,
            online: false,
        }
    }

    /// Devices in display order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceStatus> {
        std::iter::once(&self.local).chain(self.remote.iter())
    }

    /// Active alerts in display order.
    pub fn alerts(&self, low_battery_threshold: f32) -> Vec<Alert> {
        let mut alerts = Vec::new();

        if let Reading::Value(percent) = self.battery_percent {
            if percent < low_battery_threshold {
                alerts.push(Alert::LowBattery(percent));
            }
        }

        for device in self.devices() {
            if !device.filter_active() {
                alerts.push(Alert::FilterInactive(device.name.clone()));
            }
        }

        if !self.online {
            alerts.push(Alert::Offline);
        }

        alerts
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
