//! Dashboard configuration and credential loading.

use crate::error::{Result, StatusError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// How collectors are scheduled during one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CollectionMode {
    /// Await each collector in turn
    Sequential,
    /// Run every collector at once and wait for all of them
    #[default]
    Concurrent,
}

/// Configuration for one dashboard run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Name shown for the local device
    pub device_name: String,
    /// Base URL of the local DNS-filter API
    pub pihole_url: String,
    /// Remote device to query over SSH, if any
    pub remote_host: Option<String>,
    /// Name shown for the remote device (defaults to the host)
    pub remote_name: Option<String>,
    /// Base URL of the remote DNS-filter API (defaults to `http://<remote_host>`)
    pub remote_pihole_url: Option<String>,
    /// File holding the SSH user name
    pub username_file: PathBuf,
    /// File holding the password for SSH and the DNS-filter API
    pub password_file: PathBuf,
    /// Address of the battery manager's TCP interface
    pub battery_addr: String,
    /// Ask the battery manager to set the system clock from its RTC
    pub sync_rtc: bool,
    /// Address used for the connectivity probe and local IP detection
    pub probe_addr: String,
    /// Per-request timeout for HTTP calls in milliseconds
    pub http_timeout_ms: u64,
    /// Timeout for the remote SSH command in milliseconds
    pub ssh_timeout_ms: u64,
    /// Timeout for TCP probes and the battery query in milliseconds
    pub probe_timeout_ms: u64,
    /// Source of local uptime
    pub uptime_path: PathBuf,
    /// Source of local CPU temperature
    pub thermal_path: PathBuf,
    /// Mount point whose free space is reported
    pub disk_mount: PathBuf,
    /// Battery percentage below which an alert is shown
    pub low_battery_threshold: f32,
    /// Collector scheduling
    pub collection_mode: CollectionMode,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            device_name: sysinfo::System::host_name().unwrap_or_else(|| "pi".to_string()),
            pihole_url: "http://127.0.0.1".to_string(),
            remote_host: None,
            remote_name: None,
            remote_pihole_url: None,
            username_file: PathBuf::from("/etc/pi_status/username"),
            password_file: PathBuf::from("/etc/pi_status/password"),
            battery_addr: crate::DEFAULT_BATTERY_ADDR.to_string(),
            sync_rtc: false,
            probe_addr: "1.1.1.1:53".to_string(),
            http_timeout_ms: 5_000,
            ssh_timeout_ms: 10_000,
            probe_timeout_ms: 3_000,
            uptime_path: PathBuf::from("/proc/uptime"),
            thermal_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
            disk_mount: PathBuf::from("/"),
            low_battery_threshold: crate::DEFAULT_LOW_BATTERY_THRESHOLD,
            collection_mode: CollectionMode::default(),
        }
    }
}

impl StatusConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            StatusError::config_error(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config = serde_json::from_str(&raw).map_err(|err| {
            StatusError::config_error(format!("invalid config {}: {}", path.display(), err))
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Set the local DNS-filter URL.
    pub fn with_pihole_url(mut self, url: impl Into<String>) -> Self {
        self.pihole_url = url.into();
        self
    }

    /// Set the remote device host.
    pub fn with_remote_host(mut self, host: Option<String>) -> Self {
        self.remote_host = host;
        self
    }

    /// Set the battery manager address.
    pub fn with_battery_addr(mut self, addr: impl Into<String>) -> Self {
        self.battery_addr = addr.into();
        self
    }

    /// Set the connectivity probe address.
    pub fn with_probe_addr(mut self, addr: impl Into<String>) -> Self {
        self.probe_addr = addr.into();
        self
    }

    /// Set the local uptime and temperature sources.
    pub fn with_host_paths(mut self, uptime: impl Into<PathBuf>, thermal: impl Into<PathBuf>) -> Self {
        self.uptime_path = uptime.into();
        self.thermal_path = thermal.into();
        self
    }

    /// Set the collector scheduling.
    pub fn with_collection_mode(mut self, mode: CollectionMode) -> Self {
        self.collection_mode = mode;
        self
    }

    /// Set the low battery alert threshold.
    pub fn with_low_battery_threshold(mut self, percent: f32) -> Self {
        self.low_battery_threshold = percent;
        self
    }

    /// Set all network timeouts at once.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_millis() as u64;
        self.http_timeout_ms = ms;
        self.ssh_timeout_ms = ms;
        self.probe_timeout_ms = ms;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn ssh_timeout(&self) -> Duration {
        Duration::from_millis(self.ssh_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Display name of the remote device, if one is configured.
    pub fn remote_display_name(&self) -> Option<String> {
        let host = self.remote_host.as_ref()?;
        Some(self.remote_name.clone().unwrap_or_else(|| host.clone()))
    }

    /// DNS-filter URL of the remote device, if one is configured.
    pub fn remote_api_url(&self) -> Option<String> {
        let host = self.remote_host.as_ref()?;
        Some(
            self.remote_pihole_url
                .clone()
                .unwrap_or_else(|| format!("http://{host}")),
        )
    }
}

/// Credentials read from the two secrets files.
#[derive(Clone, Default)]
pub struct Secrets {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    /// Read both secrets files. A missing or empty file leaves that field unset.
    pub fn load(username_file: impl AsRef<Path>, password_file: impl AsRef<Path>) -> Self {
        Self {
            username: read_secret(username_file.as_ref()),
            password: read_secret(password_file.as_ref()),
        }
    }

    pub fn from_config(config: &StatusConfig) -> Self {
        Self::load(&config.username_file, &config.password_file)
    }
}

fn read_secret(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                warn!("Secrets file {} is empty", path.display());
                None
            } else {
                Some(value.to_string())
            }
        }
        Err(err) => {
            warn!("Cannot read secrets file {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_remote_defaults_follow_host() {
        let config = StatusConfig::default().with_remote_host(Some("10.0.0.2".to_string()));
        assert_eq!(config.remote_display_name().as_deref(), Some("10.0.0.2"));
        assert_eq!(config.remote_api_url().as_deref(), Some("http://10.0.0.2"));

        let config = StatusConfig::default();
        assert!(config.remote_display_name().is_none());
        assert!(config.remote_api_url().is_none());
    }

    #[test]
    fn test_secrets_are_trimmed() {
        let mut user = tempfile::NamedTempFile::new().unwrap();
        writeln!(user, "pi").unwrap();
        let mut pass = tempfile::NamedTempFile::new().unwrap();
        writeln!(pass, "  hunter2  ").unwrap();

        let secrets = Secrets::load(user.path(), pass.path());
        assert_eq!(secrets.username.as_deref(), Some("pi"));
        assert_eq!(secrets.password.as_deref(), Some("hunter2"));
        assert!(!format!("{:?}", secrets).contains("hunter2"));
    }

    #[test]
    fn test_missing_secrets_are_not_fatal() {
        let secrets = Secrets::load("/nonexistent/user", "/nonexistent/pass");
        assert!(secrets.username.is_none());
        assert!(secrets.password.is_none());
    }

    #[test]
    fn test_config_file_uses_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"remote_host": "backup.lan", "collection_mode": "sequential"}}"#).unwrap();

        let config = StatusConfig::from_file(file.path()).unwrap();
        assert_eq!(config.remote_host.as_deref(), Some("backup.lan"));
        assert_eq!(config.collection_mode, CollectionMode::Sequential);
        assert_eq!(config.battery_addr, crate::DEFAULT_BATTERY_ADDR);
        assert_eq!(config.low_battery_threshold, 20.0);
    }

    #[test]
    fn test_invalid_config_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = StatusConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, StatusError::Config(_)));
    }
}
