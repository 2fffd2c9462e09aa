//! `logtree`: inspect and exercise a logger hierarchy configuration.
//!
//! ```text
//! logtree [--config PATH] [--metrics-address ADDR] check
//! logtree resolve NAME...
//! logtree run [--logger NAME]... [--interval-ms N] [--watch]
//! ```
//!
//! `run` emits sample records on every tick, reconfigures in place when the
//! file changes, and flushes every appender on SIGINT/SIGTERM.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use logtree::config::watcher::ConfigWatcher;
use logtree::config::{load_config, resolve_config_path, LogConfig};
use logtree::lifecycle::{shutdown_signal, Shutdown};
use logtree::observability::{logging, metrics};
use logtree::{field, CompletionStatus, LogBridge, LogManager, LoggerHandle};

#[derive(Parser)]
#[command(name = "logtree", version)]
#[command(about = "Inspect and exercise a hierarchical logging configuration", long_about = None)]
struct Cli {
    /// Configuration file (default: $LOGTREE_CONFIG_FILE, then ./logtree.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Print the logging system's own debug diagnostics
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print a summary
    Check,
    /// Print the effective routing of each logger name
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Emit sample records until interrupted
    Run {
        /// Logger to emit through (repeatable; default: root)
        #[arg(short, long = "logger")]
        loggers: Vec<String>,

        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Reconfigure when the configuration file changes
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init_bootstrap_logging(cli.debug || logging::debug_enabled());

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let path = cli.config.clone().or_else(resolve_config_path);
    let config = match &path {
        Some(path) => load_config(path)?,
        None => {
            tracing::info!("no configuration file found, using defaults");
            LogConfig::default()
        }
    };

    match cli.command {
        Commands::Check => check(&config)?,
        Commands::Resolve { names } => resolve(&config, &names)?,
        Commands::Run {
            loggers,
            interval_ms,
            watch,
        } => run(config, path, loggers, Duration::from_millis(interval_ms.max(1)), watch).await?,
    }
    Ok(())
}

fn check(config: &LogConfig) -> Result<(), Box<dyn Error>> {
    let manager = LogManager::new(config)?;

    println!("configuration ok");
    println!("appenders:");
    for appender in &config.appenders {
        println!("  {:<16} type={} encoder={}", appender.name, appender.kind, appender.encoder.kind);
    }
    println!("loggers:");
    print_policy(&manager, "");
    for logger in &config.loggers {
        print_policy(&manager, &logger.name);
    }
    Ok(())
}

fn resolve(config: &LogConfig, names: &[String]) -> Result<(), Box<dyn Error>> {
    let manager = LogManager::new(config)?;
    for name in names {
        print_policy(&manager, name);
    }
    Ok(())
}

fn print_policy(manager: &LogManager, name: &str) {
    let node = manager.node(name);
    let policy = node.policy();
    let appenders = policy
        .appender_levels
        .iter()
        .map(|(appender, level)| format!("{appender}:{level}"))
        .collect::<Vec<_>>()
        .join(",");
    println!(
        "  {:<24} level={} appenders=[{}] caller={} stacktrace={}{}",
        if name.is_empty() { "root" } else { name },
        policy.level,
        appenders,
        policy.add_caller,
        policy.stacktrace_level,
        if node.is_declared() { "" } else { " (inherited)" },
    );
}

async fn run(
    config: LogConfig,
    path: Option<PathBuf>,
    names: Vec<String>,
    interval: Duration,
    watch: bool,
) -> Result<(), Box<dyn Error>> {
    let manager = LogManager::new(&config)?;
    LogBridge::new(manager.clone()).install()?;

    let loggers: Vec<LoggerHandle> = if names.is_empty() {
        vec![manager.get_logger("")]
    } else {
        names.iter().map(|name| manager.get_logger(name)).collect()
    };

    let (mut updates, _watcher, mut watching) = match (&path, watch || config.watch.enabled) {
        (Some(path), true) => {
            let poll = Duration::from_secs(config.watch.poll_interval_secs.max(1));
            let (watcher, updates) = ConfigWatcher::new(path, poll);
            (updates, Some(watcher.run()?), true)
        }
        (None, true) => {
            tracing::warn!("no configuration file to watch");
            (mpsc::unbounded_channel().1, None, false)
        }
        (_, false) => (mpsc::unbounded_channel().1, None, false),
    };

    let shutdown = Shutdown::new();
    let mut stop = shutdown.subscribe();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match shutdown_signal().await {
                Ok(signal) => tracing::info!(signal, "shutdown requested"),
                Err(error) => tracing::error!(%error, "failed to listen for shutdown signals"),
            }
            shutdown.trigger();
        });
    }

    let mut ticker = tokio::time::interval(interval);
    let mut seq: u64 = 0;
    loop {
        tokio::select! {
            _ = stop.recv() => break,
            update = updates.recv(), if watching => match update {
                Some(config) => {
                    if let Err(error) = manager.reconfigure(&config) {
                        tracing::error!(%error, "keeping the current configuration");
                    }
                }
                None => watching = false,
            },
            _ = ticker.tick() => {
                seq += 1;
                for logger in &loggers {
                    emit_samples(logger, seq);
                }
            }
        }
    }

    if let Err(error) = manager.sync() {
        eprintln!("logtree: flush on shutdown failed: {error}");
    }
    Ok(())
}

fn emit_samples(logger: &LoggerHandle, seq: u64) {
    let job = logger.job("sample").key_value(field::uint("seq", seq));
    logger.debug("debug sample", &[field::uint("seq", seq)]);
    logger.info("info sample", &[field::uint("seq", seq)]);
    if seq % 5 == 0 {
        logger.warn("warn sample", &[field::uint("seq", seq)]);
    }
    if seq % 10 == 0 {
        logger.error("error sample", &[field::uint("seq", seq)]);
    }
    log::debug!(target: "logtree::run", "tick {seq}");
    job.complete(CompletionStatus::Success);
}
