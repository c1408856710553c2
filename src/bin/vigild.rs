//! Vigil Daemon - fall-alert ingestion for the home-guardian twin
//!
//! This binary runs as a background daemon, maintaining transport
//! connections to the fall sensors and driving the alert state machine.
//! Headless: alert intents go to a logging actuator; embedding hosts use
//! the `vigild` library crate directly instead.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! vigild start
//!
//! # Start the daemon (background/daemonized)
//! vigild start -d
//!
//! # Start with an explicit config file
//! vigild start --config /etc/vigil/vigil.toml
//!
//! # Stop the daemon
//! vigild stop
//!
//! # Check daemon status
//! vigild status
//!
//! # Enable debug logging
//! RUST_LOG=vigild=debug vigild start
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown (adapters unsubscribed and joined)

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vigild::actuator::LoggingActuator;
use vigild::config::DaemonConfig;
use vigild::driver::{spawn_driver_task, Driver};
use vigild::queue::event_queue;
use vigild::transport::{spawn_broker_adapter, spawn_serial_adapter, TransportHandle};

/// Vigil daemon - fall-sensor ingestion and alerting
#[derive(Parser, Debug)]
#[command(name = "vigild", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,

        /// Path to the TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

fn state_dir() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("vigil")
}

fn pid_file_path() -> PathBuf {
    state_dir().join("vigild.pid")
}

fn log_file_path() -> PathBuf {
    state_dir().join("vigild.log")
}

fn read_pid() -> Option<u32> {
    let path = pid_file_path();
    let mut file = File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

fn remove_pid_file() {
    let path = pid_file_path();
    let _ = fs::remove_file(path);
}

fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

fn is_daemon_running() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        remove_pid_file();
    }
    None
}

fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let result = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {pid}");
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Command::Start {
        daemon: false,
        config: None,
    });

    match command {
        Command::Start { daemon, config } => {
            if let Some(pid) = is_daemon_running() {
                eprintln!("Daemon is already running (PID {pid})");
                eprintln!("Use 'vigild stop' to stop it first.");
                process::exit(1);
            }

            if daemon {
                daemonize()?;
            }

            write_pid()?;

            let result = run_daemon(config);

            remove_pid_file();

            result
        }
        Command::Stop => {
            if let Some(pid) = is_daemon_running() {
                println!("Stopping daemon (PID {pid})...");
                stop_daemon(pid)?;

                for _ in 0..50 {
                    if !is_process_running(pid) {
                        println!("Daemon stopped.");
                        return Ok(());
                    }
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }

                eprintln!("Daemon did not stop within 5 seconds.");
                process::exit(1);
            } else {
                println!("Daemon is not running.");
                Ok(())
            }
        }
        Command::Status => {
            if let Some(pid) = is_daemon_running() {
                println!("Daemon is running (PID {pid})");
                println!("Log: {}", log_file_path().display());
                Ok(())
            } else {
                println!("Daemon is not running.");
                process::exit(1);
            }
        }
    }
}

fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = File::create(&log_path).context("Failed to create log file for stderr")?;

    let daemonize = Daemonize::new()
        .working_directory("/")
        .stdout(stdout)
        .stderr(stderr);

    daemonize.start().context("Failed to daemonize")?;

    Ok(())
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon(config_path: Option<PathBuf>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vigild=info".parse()?)
                .add_directive("vigil_core=info".parse()?)
                .add_directive("vigil_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Vigil daemon starting"
    );

    let config =
        DaemonConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let (pusher, drain) = event_queue(config.tick.queue_capacity);

    let mut transports: Vec<TransportHandle> = Vec::new();
    if config.broker.enabled {
        transports.push(spawn_broker_adapter(config.broker.clone(), pusher.clone()));
        info!("Broker adapter spawned");
    }
    if config.serial.enabled {
        transports.push(spawn_serial_adapter(config.serial.clone(), pusher.clone()));
        info!("Serial adapter spawned");
    }

    let driver = Driver::new(&config, drain, Box::new(LoggingActuator));
    let driver_task = spawn_driver_task(driver, config.tick.period(), cancel_token.clone());
    info!(tick_rate_hz = config.tick.rate_hz, "Driver started");

    // Park until shutdown is requested.
    cancel_token.cancelled().await;

    for handle in transports {
        let kind = handle.kind();
        if let Err(e) = handle.shutdown().await {
            // Abandoned loop: resource considered leaked, process continues.
            warn!(transport = %kind, error = %e, "Transport shutdown incomplete");
        }
    }

    match driver_task.await {
        Ok(driver) => {
            let state = driver.alert_state();
            info!(final_state = %state, "Driver stopped");
        }
        Err(e) => error!(error = %e, "Driver task failed"),
    }

    info!("Vigil daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
