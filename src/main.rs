//! concentratorconfig: keep the `WireGuard` concentrator in sync with etcd
//!
//! Reads the node configuration from etcd every interval and applies the
//! peer changes to the `WireGuard` device. Any error skips the whole batch.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile wg-nodes every minute
//! concentratorconfig
//!
//! # Custom descriptor, device and interval
//! concentratorconfig -e /etc/etcd-client.json -d wg-nodes -i 30s
//!
//! # Print the pending changes once and exit
//! concentratorconfig simulate
//!
//! # List nodes overriding a default value
//! concentratorconfig show-overrides
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use concentrator_config::config::{
    load_config_with_env, parse_duration, LogConfig, DEFAULT_DEVICE_NAME,
    DEFAULT_ETCD_CONFIG_PATH,
};
use concentrator_config::scheduler::{LoopSettings, ReconcileLoop};
use concentrator_config::store::{compute_overrides, ConfigStore, EtcdStore};
use concentrator_config::wireguard::WgCli;

/// Configure the `WireGuard` interface based on the etcd KV configuration
#[derive(Parser, Debug)]
#[command(name = "concentratorconfig", version)]
struct Cli {
    /// Path to the etcd client configuration file
    #[arg(short = 'e', long, default_value = DEFAULT_ETCD_CONFIG_PATH, global = true)]
    etcdconfig: PathBuf,

    /// Interval between two reconciliations (e.g. 60s, 1m30s)
    #[arg(short = 'i', long, default_value = "60s", value_parser = parse_interval, global = true)]
    interval: Duration,

    /// Name of the WireGuard device to configure
    #[arg(short = 'd', long, default_value = DEFAULT_DEVICE_NAME, global = true)]
    devicename: String,

    /// Path of the wg tool
    #[arg(long, default_value = "wg", global = true)]
    wg_binary: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"], global = true)]
    log_format: String,

    /// Include the module path in log lines
    #[arg(long, global = true)]
    log_target: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the peer updates that would be applied and exit
    Simulate,

    /// Show all nodes overriding a default value
    #[command(alias = "showoverrides")]
    ShowOverrides,
}

fn parse_interval(value: &str) -> Result<Duration, String> {
    let interval = parse_duration(value).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than 0".into());
    }
    Ok(interval)
}

/// Initialize logging
///
/// Logs go to stderr so simulate output on stdout stays clean.
fn init_logging(config: &LogConfig) -> Result<()> {
    config.validate()?;

    let level = match config.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("h2=warn".parse()?)
        .add_directive("tower=warn".parse()?)
        .add_directive("tokio=warn".parse()?);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.target);

    if config.format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let log_config = LogConfig {
        level: cli.log_level.clone(),
        format: cli.log_format.clone(),
        target: cli.log_target,
    };
    if let Err(e) = init_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("concentratorconfig v{}", concentrator_config::VERSION);

    let config = load_config_with_env(&cli.etcdconfig).with_context(|| {
        format!(
            "Couldn't load etcd configuration from {}",
            cli.etcdconfig.display()
        )
    })?;

    let store = EtcdStore::connect(&config)
        .await
        .context("Couldn't setup etcd connection")?;

    if matches!(cli.command, Some(Command::ShowOverrides)) {
        let snapshot = store.fetch_all().await.context("Couldn't get all nodes")?;
        print!("{}", compute_overrides(&snapshot.nodes, &snapshot.defaults));
        return Ok(ExitCode::SUCCESS);
    }

    let controller = WgCli::connect(&cli.wg_binary)
        .await
        .context("Couldn't open connection to configure wireguard")?;

    let settings = LoopSettings {
        device_name: cli.devicename,
        interval: cli.interval,
    };
    let reconciler = ReconcileLoop::new(store, controller, settings);

    if matches!(cli.command, Some(Command::Simulate)) {
        let mut stdout = std::io::stdout();
        return Ok(match reconciler.simulate(&mut stdout).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        });
    }

    tokio::select! {
        () = reconciler.run() => {}
        result = signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            info!("Received SIGINT, shutting down");
        }
        result = wait_for_sigterm() => {
            result.context("Failed to register SIGTERM handler")?;
            info!("Received SIGTERM, shutting down");
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Wait for SIGTERM signal
#[cfg(unix)]
async fn wait_for_sigterm() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> std::io::Result<()> {
    std::future::pending::<()>().await;
    Ok(())
}
