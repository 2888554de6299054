//! Production metric sources and the fan-out / fan-in gather step.

use crate::config::{CollectionMode, Secrets, StatusConfig};
use crate::error::{Result, StatusError};
use crate::metrics::battery::BatteryClient;
use crate::metrics::data::*;
use crate::metrics::local;
use crate::metrics::pihole::{self, PiholeClient};
use crate::metrics::remote::RemoteHost;
use crate::metrics::traits::MetricSources;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time;
use tracing::{debug, info, warn};

/// Metric sources backed by the real battery manager, DNS-filter APIs,
/// SSH and the local filesystem.
pub struct StatusCollector {
    config: StatusConfig,
    battery: BatteryClient,
    local_api: PiholeClient,
    remote_api: Option<PiholeClient>,
    remote_host: Option<RemoteHost>,
}

impl StatusCollector {
    /// Create a collector from configuration and credentials.
    pub fn new(config: StatusConfig, secrets: Secrets) -> Result<Self> {
        let battery = BatteryClient::new(&config.battery_addr, config.probe_timeout());

        let local_api = PiholeClient::new(
            config.pihole_url.as_str(),
            secrets.password.clone(),
            config.http_timeout(),
        )?;
        let remote_api = config
            .remote_api_url()
            .map(|url| PiholeClient::new(url, secrets.password.clone(), config.http_timeout()))
            .transpose()?;

        let remote_host = config.remote_host.as_ref().map(|host| {
            RemoteHost::new(
                host.clone(),
                secrets.username.clone(),
                secrets.password.clone(),
                config.ssh_timeout(),
            )
        });

        Ok(Self {
            config,
            battery,
            local_api,
            remote_api,
            remote_host,
        })
    }

    pub fn config(&self) -> &StatusConfig {
        &self.config
    }
}

#[async_trait]
impl MetricSources for StatusCollector {
    fn local_name(&self) -> String {
        self.config.device_name.clone()
    }

    fn remote_identity(&self) -> Option<(String, String)> {
        let host = self.config.remote_host.clone()?;
        let name = self.config.remote_display_name()?;
        Some((name, host))
    }

    async fn battery(&self) -> Reading<f32> {
        let reading = Reading::capture("battery", self.battery.percentage().await);
        if self.config.sync_rtc {
            if let Err(err) = self.battery.sync_clock_from_rtc().await {
                warn!("RTC sync failed: {}", err);
            }
        }
        reading
    }

    async fn local_address(&self) -> Reading<String> {
        Reading::capture(
            "local_address",
            local::local_address(&self.config.probe_addr).await,
        )
        .map(|ip| ip.to_string())
    }

    async fn local_filter(&self) -> FilterStats {
        let mut stats = self.local_api.fetch_stats().await;
        if !stats.blocking.is_available() {
            debug!("Falling back to `pihole status` for local blocking state");
            let status = pihole::local_cli_status(self.config.probe_timeout()).await;
            stats.blocking = Reading::capture("dns_blocking_cli", status);
        }
        stats
    }

    async fn local_vitals(&self) -> HostVitals {
        let (uptime, temperature) = tokio::join!(
            local::read_uptime(&self.config.uptime_path),
            local::read_temperature(&self.config.thermal_path)
        );
        HostVitals {
            uptime_seconds: Reading::capture("uptime", uptime),
            cpu_celsius: Reading::capture("temperature", temperature),
        }
    }

    async fn remote_filter(&self) -> Option<FilterStats> {
        self.config.remote_host.as_ref()?;
        Some(match &self.remote_api {
            Some(api) => api.fetch_stats().await,
            None => FilterStats::default(),
        })
    }

    async fn remote_vitals(&self) -> Option<HostVitals> {
        let remote = self.remote_host.as_ref()?;
        Some(remote.vitals().await)
    }

    async fn disk_free(&self) -> Reading<u64> {
        let mount = self.config.disk_mount.clone();
        let result = tokio::task::spawn_blocking(move || local::disk_free(&mount))
            .await
            .map_err(|err| StatusError::Io(std::io::Error::other(err)))
            .and_then(|inner| inner);
        Reading::capture("disk_free", result)
    }

    async fn connectivity(&self) -> bool {
        local::is_online(&self.config.probe_addr, self.config.probe_timeout()).await
    }
}

/// Collect one snapshot from `sources`.
///
/// `Sequential` awaits each collector in turn. `Concurrent` starts all of
/// them at once and returns when the slowest has finished.
pub async fn gather(sources: &dyn MetricSources, mode: CollectionMode) -> StatusSnapshot {
    let started = Instant::now();

    let (battery, address, local_filter, local_vitals, remote_filter, remote_vitals, disk, online) =
        match mode {
            CollectionMode::Concurrent => {
                tokio::join!(
                    sources.battery(),
                    sources.local_address(),
                    sources.local_filter(),
                    sources.local_vitals(),
                    sources.remote_filter(),
                    sources.remote_vitals(),
                    sources.disk_free(),
                    sources.connectivity(),
                )
            }
            CollectionMode::Sequential => (
                sources.battery().await,
                sources.local_address().await,
                sources.local_filter().await,
                sources.local_vitals().await,
                sources.remote_filter().await,
                sources.remote_vitals().await,
                sources.disk_free().await,
                sources.connectivity().await,
            ),
        };

    let remote = sources.remote_identity().map(|(name, host)| DeviceStatus {
        name,
        address: Reading::Value(host),
        filter: remote_filter.unwrap_or_default(),
        vitals: remote_vitals.unwrap_or_default(),
    });

    let elapsed = started.elapsed();
    info!("Collected status in {:?} ({:?} mode)", elapsed, mode);

    StatusSnapshot {
        timestamp: now_millis(),
        elapsed_ms: elapsed.as_millis() as u64,
        battery_percent: battery,
        local: DeviceStatus {
            name: sources.local_name(),
            address,
            filter: local_filter,
            vitals: local_vitals,
        },
        remote,
        disk_free_bytes: disk,
        online,
    }
}

/// A stream of snapshots, one per `interval`, starting immediately.
pub fn snapshot_stream(
    sources: Arc<dyn MetricSources>,
    mode: CollectionMode,
    interval: Duration,
) -> BoxStream<'static, StatusSnapshot> {
    let stream = stream::unfold(
        (sources, time::interval(interval)),
        move |(sources, mut interval)| async move {
            interval.tick().await;
            let snapshot = gather(sources.as_ref(), mode).await;
            Some((snapshot, (sources, interval)))
        },
    );

    Box::pin(stream)
}
