//! Uptime and temperature of a remote host over SSH.

use crate::error::{Result, StatusError};
use crate::metrics::data::{HostVitals, Reading};
use crate::metrics::local::{parse_temperature, parse_uptime};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

/// Both files are read in a single round trip: uptime first, temperature second.
pub const REMOTE_COMMAND: &str = "cat /proc/uptime /sys/class/thermal/thermal_zone0/temp";

/// SSH target and credentials.
#[derive(Debug, Clone)]
pub struct RemoteHost {
    pub host: String,
    pub username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl RemoteHost {
    pub fn new(
        host: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            username,
            password,
            timeout,
        }
    }

    fn destination(&self) -> String {
        match &self.username {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Build the command line. Password auth goes through `sshpass -e` so the
    /// password never appears in the process list.
    pub fn command(&self) -> Command {
        let connect_timeout = self.timeout.as_secs().max(1);
        let mut command = match &self.password {
            Some(password) => {
                let mut command = Command::new("sshpass");
                command.env("SSHPASS", password).arg("-e").arg("ssh");
                command
            }
            None => {
                let mut command = Command::new("ssh");
                command.args(["-o", "BatchMode=yes"]);
                command
            }
        };
        command
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!("ConnectTimeout={connect_timeout}"))
            .arg(self.destination())
            .arg(REMOTE_COMMAND)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Collect uptime and temperature. Never fails.
    pub async fn vitals(&self) -> HostVitals {
        debug!("Querying remote host {}", self.host);
        collect_vitals(self.command(), self.timeout, &self.host).await
    }
}

async fn run(mut command: Command, timeout: Duration, host: &str) -> Result<Output> {
    let output = time::timeout(timeout, command.kill_on_drop(true).output())
        .await
        .map_err(|_| StatusError::timeout(format!("ssh to {host}")))??;
    Ok(output)
}

/// Run `command` and parse whatever it printed. A non-zero exit is logged,
/// but lines that did arrive are still used.
async fn collect_vitals(command: Command, timeout: Duration, host: &str) -> HostVitals {
    let output = match run(command, timeout, host).await {
        Ok(output) => output,
        Err(err) => {
            warn!(host, error = %err, "remote host unavailable");
            return HostVitals::default();
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(host, status = %output.status, stderr = %stderr.trim(), "remote command failed");
    }
    parse_remote_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the output of [`REMOTE_COMMAND`]. Each line degrades independently.
pub fn parse_remote_output(output: &str) -> HostVitals {
    let mut lines = output.lines();
    let uptime = lines
        .next()
        .ok_or_else(|| StatusError::parse_error("missing uptime line"))
        .and_then(parse_uptime);
    let temperature = lines
        .next()
        .ok_or_else(|| StatusError::parse_error("missing temperature line"))
        .and_then(parse_temperature);

    HostVitals {
        uptime_seconds: Reading::capture("remote_uptime", uptime),
        cpu_celsius: Reading::capture("remote_temperature", temperature),
    }
}
