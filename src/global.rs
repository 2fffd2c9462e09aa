//! The process-wide default manager.
//!
//! Built on first use from `LOGTREE_CONFIG_FILE` or `./logtree.toml`, falling
//! back to [`LogConfig::default`] when neither yields a usable configuration.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;

use crate::appender::SyncError;
use crate::bridge::LogBridge;
use crate::config::{load_config, parse_config, resolve_config_path, LogConfig};
use crate::error::{Error, Result};
use crate::level::Level;
use crate::logger::LoggerHandle;
use crate::manager::LogManager;
use crate::observability::logging;

static DEFAULT: Lazy<LogManager> = Lazy::new(build_default);

static INITIALIZED: AtomicBool = AtomicBool::new(false);

fn build_default() -> LogManager {
    if logging::debug_enabled() {
        logging::init_bootstrap_logging(true);
    }

    let config = match resolve_config_path() {
        Some(path) => match load_config(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded logging configuration");
                config
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "unusable logging configuration, using defaults");
                LogConfig::default()
            }
        },
        None => LogConfig::default(),
    };

    LogManager::new(&config).unwrap_or_else(|error| {
        tracing::warn!(%error, "failed to build the default log manager, logging is disabled");
        LogManager::disabled()
    })
}

/// The process-wide manager.
pub fn default_manager() -> &'static LogManager {
    &DEFAULT
}

/// The handle for `name` on the default manager.
pub fn get_logger(name: &str) -> LoggerHandle {
    DEFAULT.get_logger(name)
}

/// See [`LogManager::set_level`].
pub fn set_level(name: &str, level: Level, appenders: &[&str]) {
    DEFAULT.set_level(name, level, appenders);
}

/// See [`LogManager::reconfigure`].
pub fn reconfigure(config: &LogConfig) -> Result<()> {
    DEFAULT.reconfigure(config)
}

/// Flush every appender of the default manager.
pub fn sync() -> Result<(), SyncError> {
    DEFAULT.sync()
}

/// Configure the default manager explicitly. Only the first successful call
/// applies; later calls fail with [`Error::AlreadyInitialized`].
pub fn init_with_config(config: &LogConfig) -> Result<()> {
    if INITIALIZED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(Error::AlreadyInitialized);
    }
    DEFAULT.reconfigure(config).inspect_err(|_| {
        INITIALIZED.store(false, Ordering::Release);
    })
}

/// [`init_with_config`] from TOML text.
pub fn init_with_config_str(text: &str) -> Result<()> {
    init_with_config(&parse_config(text)?)
}

/// [`init_with_config`] from a TOML file.
pub fn init_with_config_file(path: &Path) -> Result<()> {
    init_with_config(&load_config(path)?)
}

/// Route records from the `log` facade into the `stdlog` logger of the
/// default manager.
pub fn redirect_std_log() -> Result<()> {
    LogBridge::new(DEFAULT.clone()).install()
}
