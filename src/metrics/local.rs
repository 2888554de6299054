//! Host metrics read from the local filesystem and network stack.

use crate::error::{Result, StatusError};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use sysinfo::Disks;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio::time;
use tracing::debug;

/// Parse the contents of `/proc/uptime` into whole seconds.
pub fn parse_uptime(raw: &str) -> Result<u64> {
    let first = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| StatusError::parse_error("empty uptime"))?;
    let seconds: f64 = first
        .parse()
        .map_err(|_| StatusError::parse_error(format!("bad uptime value {first:?}")))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(StatusError::parse_error(format!("bad uptime value {first:?}")));
    }
    Ok(seconds as u64)
}

/// Parse a thermal zone reading (millidegrees Celsius) into degrees.
pub fn parse_temperature(raw: &str) -> Result<f32> {
    let trimmed = raw.trim();
    let millidegrees: i64 = trimmed
        .parse()
        .map_err(|_| StatusError::parse_error(format!("bad temperature value {trimmed:?}")))?;
    Ok(millidegrees as f32 / 1000.0)
}

/// Format an uptime as `3d 4h`, `4h 12m` or `12m`.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Format a byte count as `12.3G`, `512M` or `900K`.
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value >= KIB * KIB * KIB {
        format!("{:.1}G", value / (KIB * KIB * KIB))
    } else if value >= KIB * KIB {
        format!("{:.0}M", value / (KIB * KIB))
    } else {
        format!("{:.0}K", value / KIB)
    }
}

pub async fn read_uptime(path: &Path) -> Result<u64> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_uptime(&raw)
}

pub async fn read_temperature(path: &Path) -> Result<f32> {
    let raw = tokio::fs::read_to_string(path).await?;
    parse_temperature(&raw)
}

/// Free space on the filesystem mounted at `mount`.
pub fn disk_free(mount: &Path) -> Result<u64> {
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .find(|disk| disk.mount_point() == mount)
        .map(|disk| disk.available_space())
        .ok_or_else(|| StatusError::parse_error(format!("no disk mounted at {}", mount.display())))
}

async fn resolve(addr: &str) -> Result<SocketAddr> {
    lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| StatusError::network_error(format!("cannot resolve {addr}")))
}

/// The address of the interface that routes towards `probe_addr`.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub async fn local_address(probe_addr: &str) -> Result<IpAddr> {
    let target = resolve(probe_addr).await?;
    let bind: SocketAddr = if target.is_ipv4() {
        "0.0.0.0:0".parse().map_err(|_| StatusError::parse_error("bind address"))?
    } else {
        "[::]:0".parse().map_err(|_| StatusError::parse_error("bind address"))?
    };
    let socket = UdpSocket::bind(bind).await?;
    socket.connect(target).await?;
    let ip = socket.local_addr()?.ip();
    if ip.is_unspecified() {
        return Err(StatusError::network_error("no route to probe address"));
    }
    Ok(ip)
}

/// Whether a TCP connection to `probe_addr` succeeds within `timeout`.
pub async fn is_online(probe_addr: &str, timeout: Duration) -> bool {
    match time::timeout(timeout, TcpStream::connect(probe_addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            debug!("Connectivity probe to {} failed: {}", probe_addr, err);
            false
        }
        Err(_) => {
            debug!("Connectivity probe to {} timed out", probe_addr);
            false
        }
    }
}
