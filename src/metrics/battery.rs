//! Battery level from the power manager's line-oriented TCP interface.
//!
//! The manager answers one command per line: `get battery` is answered with
//! `battery: 87.5`, and `rtc_rtc2pi` copies the hat's RTC into the system
//! clock.

use crate::error::{Result, StatusError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

/// Client for the battery manager.
#[derive(Debug, Clone)]
pub struct BatteryClient {
    addr: String,
    timeout: Duration,
}

impl BatteryClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Send one command and return the reply line.
    async fn command(&self, command: &str) -> Result<String> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr).await?;
            stream.write_all(command.as_bytes()).await?;
            stream.write_all(b"\n").await?;

            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            let read = reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(StatusError::network_error(format!(
                    "battery manager closed the connection after {command:?}"
                )));
            }
            Ok::<_, StatusError>(line.trim().to_string())
        };

        time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| StatusError::timeout(format!("battery manager at {}", self.addr)))?
    }

    /// Current charge in percent, clamped to 0..=100.
    pub async fn percentage(&self) -> Result<f32> {
        debug!("Querying battery level from {}", self.addr);
        let reply = self.command("get battery").await?;
        let percent = parse_battery_reply(&reply)?;
        debug!("Battery: {:.0}%", percent);
        Ok(percent)
    }

    /// Set the system clock from the hat's RTC.
    pub async fn sync_clock_from_rtc(&self) -> Result<()> {
        debug!("Syncing system clock from RTC");
        let reply = self.command("rtc_rtc2pi").await?;
        let (key, _) = split_reply(&reply)?;
        if key != "rtc_rtc2pi" {
            return Err(StatusError::parse_error(format!("unexpected RTC reply {reply:?}")));
        }
        Ok(())
    }
}

fn split_reply(reply: &str) -> Result<(String, &str)> {
    let (key, value) = reply
        .split_once(':')
        .ok_or_else(|| StatusError::parse_error(format!("malformed reply {reply:?}")))?;
    Ok((key.trim().to_ascii_lowercase(), value.trim()))
}

/// Parse a `battery: <float>` reply. The key is matched case-insensitively.
pub fn parse_battery_reply(reply: &str) -> Result<f32> {
    let (key, value) = split_reply(reply)?;
    if key != "battery" {
        return Err(StatusError::parse_error(format!("unexpected battery reply {reply:?}")));
    }
    let percent: f32 = value
        .parse()
        .map_err(|_| StatusError::parse_error(format!("bad battery value {value:?}")))?;
    if percent.is_nan() {
        return Err(StatusError::parse_error("battery value is NaN"));
    }
    Ok(percent.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    /// Answer each connection's first line with whatever `reply` returns.
    async fn fake_manager(reply: fn(&str) -> String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (read, mut write) = stream.into_split();
                let mut line = String::new();
                BufReader::new(read).read_line(&mut line).await.unwrap();
                write.write_all(reply(line.trim()).as_bytes()).await.unwrap();
            }
        });
        addr
    }

    #[test]
    fn test_parse_battery_reply() {
        assert_eq!(parse_battery_reply("battery: 87.5").unwrap(), 87.5);
        assert_eq!(parse_battery_reply("Battery: 42").unwrap(), 42.0);
        assert_eq!(parse_battery_reply("battery: 104.2").unwrap(), 100.0);
        assert_eq!(parse_battery_reply("battery: -3").unwrap(), 0.0);
        assert!(parse_battery_reply("battery: lots").is_err());
        assert!(parse_battery_reply("voltage: 4.1").is_err());
        assert!(parse_battery_reply("garbage").is_err());
    }

    #[tokio::test]
    async fn test_percentage_from_fake_manager() {
        let addr = fake_manager(|cmd| match cmd {
            "get battery" => "battery: 63.2\n".to_string(),
            other => format!("unknown: {other}\n"),
        })
        .await;

        let client = BatteryClient::new(addr, Duration::from_secs(2));
        assert_eq!(client.percentage().await.unwrap(), 63.2);
    }

    #[tokio::test]
    async fn test_rtc_sync() {
        let addr = fake_manager(|cmd| format!("{cmd}: done\n")).await;
        let client = BatteryClient::new(addr, Duration::from_secs(2));
        assert!(client.sync_clock_from_rtc().await.is_ok());
    }

    #[tokio::test]
    async fn test_silent_manager_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            time::sleep(Duration::from_secs(5)).await;
        });

        let client = BatteryClient::new(addr, Duration::from_millis(100));
        let err = client.percentage().await.unwrap_err();
        assert!(matches!(err, StatusError::Timeout(_)));
    }
}
