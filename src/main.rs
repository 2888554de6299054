//! pi_status - e-paper status dashboard binary
//!
//! Collects appliance metrics once (or on an interval) and pushes the
//! rendered dashboard to a panel.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use futures_util::StreamExt;
use pi_status::metrics::local::{format_bytes, format_uptime};
use pi_status::{
    gather, present, render_dashboard, snapshot_stream, CollectionMode, DeviceStatus,
    OutputTarget, RenderOptions, Secrets, StatusCollector, StatusConfig, StatusSnapshot,
    DEFAULT_WATCH_INTERVAL_SECS,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "pi_status")]
#[command(about = "E-paper status dashboard for a Raspberry Pi DNS filter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Austin Couch")]
#[command(long_about = "Collects battery, DNS-filter, temperature, uptime, disk and \
connectivity metrics and renders them for a 2.13\" e-paper panel")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON configuration file (flags below override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the local DNS-filter API
    #[arg(long)]
    pihole_url: Option<String>,

    /// Remote device to include in the dashboard
    #[arg(long)]
    remote_host: Option<String>,

    /// Name shown for the remote device
    #[arg(long)]
    remote_name: Option<String>,

    /// File holding the SSH user name
    #[arg(long)]
    username_file: Option<PathBuf>,

    /// File holding the SSH / API password
    #[arg(long)]
    password_file: Option<PathBuf>,

    /// Battery manager address
    #[arg(long)]
    battery_addr: Option<String>,

    /// Set the system clock from the battery hat's RTC
    #[arg(long)]
    sync_rtc: bool,

    /// Collect metrics one after another instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// Battery percentage that triggers the low battery alert
    #[arg(long)]
    low_battery: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect once and push the dashboard to the panel (default)
    Render(RenderArgs),

    /// Collect once and print the metrics
    Snapshot(SnapshotArgs),

    /// Refresh the panel on an interval
    Watch(WatchArgs),

    /// Show the effective configuration
    Info,
}

#[derive(Args)]
struct RenderArgs {
    /// Panel output: 'terminal' or 'pbm:<path>'
    #[arg(short, long, default_value = "terminal")]
    output: String,
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,
}

#[derive(Args)]
struct WatchArgs {
    /// Seconds between refreshes
    #[arg(short, long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS)]
    interval: u64,

    /// Panel output: 'terminal' or 'pbm:<path>'
    #[arg(short, long, default_value = "terminal")]
    output: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = build_config(&cli)?;

    match &cli.command {
        Some(Commands::Render(args)) => render_command(config, args).await?,
        Some(Commands::Snapshot(args)) => snapshot_command(config, args).await?,
        Some(Commands::Watch(args)) => watch_command(config, args).await?,
        Some(Commands::Info) => info_command(&config)?,
        None => {
            // Default to a single render
            let args = RenderArgs {
                output: "terminal".to_string(),
            };
            render_command(config, &args).await?;
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level(cli), &directives))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG`-style directives win; without any, `level` applies everywhere.
fn log_filter(level: Level, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives)
}

fn build_config(cli: &Cli) -> anyhow::Result<StatusConfig> {
    let mut config = match &cli.config {
        Some(path) => StatusConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => StatusConfig::default(),
    };

    if let Some(url) = &cli.pihole_url {
        config.pihole_url = url.clone();
    }
    if cli.remote_host.is_some() {
        config.remote_host = cli.remote_host.clone();
    }
    if cli.remote_name.is_some() {
        config.remote_name = cli.remote_name.clone();
    }
    if let Some(path) = &cli.username_file {
        config.username_file = path.clone();
    }
    if let Some(path) = &cli.password_file {
        config.password_file = path.clone();
    }
    if let Some(addr) = &cli.battery_addr {
        config.battery_addr = addr.clone();
    }
    if cli.sync_rtc {
        config.sync_rtc = true;
    }
    if cli.sequential {
        config.collection_mode = CollectionMode::Sequential;
    }
    if let Some(threshold) = cli.low_battery {
        config.low_battery_threshold = threshold;
    }

    Ok(config)
}

fn collector_for(config: StatusConfig) -> anyhow::Result<StatusCollector> {
    let secrets = Secrets::from_config(&config);
    let collector = StatusCollector::new(config, secrets).context("creating status collector")?;
    info!("Status collector initialized");
    Ok(collector)
}

fn render_options(config: &StatusConfig) -> RenderOptions {
    RenderOptions::new(chrono::Local::now().naive_local())
        .with_low_battery_threshold(config.low_battery_threshold)
}

fn draw_and_present(
    snapshot: &StatusSnapshot,
    config: &StatusConfig,
    target: &OutputTarget,
) -> anyhow::Result<()> {
    let frame = render_dashboard(snapshot, &render_options(config));
    let mut panel = target.open();
    present(panel.as_mut(), &frame).context("pushing frame to panel")?;
    Ok(())
}

async fn render_command(config: StatusConfig, args: &RenderArgs) -> anyhow::Result<()> {
    let target: OutputTarget = args.output.parse()?;
    let mode = config.collection_mode;
    let collector = collector_for(config)?;

    let snapshot = gather(&collector, mode).await;
    draw_and_present(&snapshot, collector.config(), &target)
}

async fn snapshot_command(config: StatusConfig, args: &SnapshotArgs) -> anyhow::Result<()> {
    let mode = config.collection_mode;
    let collector = collector_for(config)?;
    let snapshot = gather(&collector, mode).await;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            println!("{}", json);
        }
        "pretty" => {
            print_pretty_snapshot(&snapshot, collector.config());
        }
        _ => {
            error!("Unsupported format: {}. Use 'json' or 'pretty'", args.format);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn watch_command(config: StatusConfig, args: &WatchArgs) -> anyhow::Result<()> {
    let target: OutputTarget = args.output.parse()?;
    let mode = config.collection_mode;
    let collector = Arc::new(collector_for(config.clone())?);
    let mut stream = snapshot_stream(
        collector,
        mode,
        Duration::from_secs(args.interval.max(1)),
    );
    info!("Refreshing every {}s", args.interval);

    loop {
        tokio::select! {
            next = stream.next() => {
                let Some(snapshot) = next else { break };
                draw_and_present(&snapshot, &config, &target)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                break;
            }
        }
    }

    Ok(())
}

fn info_command(config: &StatusConfig) -> anyhow::Result<()> {
    println!("pi_status configuration");
    println!("=======================");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn print_device(device: &DeviceStatus) {
    println!("  {} ({})", device.name, device.address);
    println!("    DNS filter: {}", device.filter.blocking);
    println!(
        "    Blocked:    {} of {} queries",
        device.filter.blocked_percent.format_with(|p| format!("{p:.1}%")),
        device.filter.total_queries
    );
    println!(
        "    Uptime:     {}",
        device.vitals.uptime_seconds.format_with(|s| format_uptime(*s))
    );
    println!(
        "    CPU temp:   {}",
        device.vitals.cpu_celsius.format_with(|t| format!("{t:.1}°C"))
    );
}

fn print_pretty_snapshot(snapshot: &StatusSnapshot, config: &StatusConfig) {
    println!(
        "Status Snapshot ({}, collected in {} ms)",
        chrono::DateTime::from_timestamp_millis(snapshot.timestamp as i64)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.elapsed_ms
    );
    println!("==========================================");
    println!();

    println!(
        "Battery: {}",
        snapshot.battery_percent.format_with(|p| format!("{p:.0}%"))
    );
    println!(
        "Disk free: {}",
        snapshot.disk_free_bytes.format_with(|b| format_bytes(*b))
    );
    println!("Network: {}", if snapshot.online { "online" } else { "offline" });
    println!();

    println!("Devices:");
    for device in snapshot.devices() {
        print_device(device);
    }

    let alerts = snapshot.alerts(config.low_battery_threshold);
    if !alerts.is_empty() {
        println!();
        println!("Alerts:");
        for alert in alerts {
            println!("  ! {}", alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["pi_status", "--remote-host", "backup.lan", "--sequential"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.remote_host.as_deref(), Some("backup.lan"));
        assert_eq!(config.collection_mode, CollectionMode::Sequential);
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["pi_status"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.collection_mode, CollectionMode::Concurrent);
        assert_eq!(config.low_battery_threshold, pi_status::DEFAULT_LOW_BATTERY_THRESHOLD);
        assert!(config.remote_host.is_none());
    }

    #[test]
    fn test_log_level_flags() {
        let quiet = Cli::try_parse_from(["pi_status"]).unwrap();
        assert_eq!(log_filter(log_level(&quiet), "").max_level_hint(), Some(LevelFilter::WARN));

        let verbose = Cli::try_parse_from(["pi_status", "-v"]).unwrap();
        assert_eq!(log_filter(log_level(&verbose), "").max_level_hint(), Some(LevelFilter::INFO));

        let debug = Cli::try_parse_from(["pi_status", "-d"]).unwrap();
        assert_eq!(log_filter(log_level(&debug), "").max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_env_directives_override_flags() {
        let filter = log_filter(Level::DEBUG, "error");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn test_watch_subcommand() {
        let cli = Cli::try_parse_from(["pi_status", "watch", "--interval", "60", "--output", "pbm:/tmp/x.pbm"])
            .unwrap();
        match cli.command {
            Some(Commands::Watch(args)) => {
                assert_eq!(args.interval, 60);
                assert_eq!(args.output, "pbm:/tmp/x.pbm");
            }
            _ => panic!("expected watch command"),
        }
    }
}
