//! Crate-level error type.

use thiserror::Error;

use crate::appender::{AppenderError, SyncError};
use crate::config::ConfigError;

/// Errors surfaced by the public entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("appender setup failed: {0}")]
    Appender(#[from] AppenderError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("the default log manager has already been initialized")]
    AlreadyInitialized,

    #[error("failed to install the `log` bridge: {0}")]
    Bridge(#[from] log::SetLoggerError),
}

impl From<crate::config::ValidationError> for Error {
    fn from(error: crate::config::ValidationError) -> Self {
        Error::Config(ConfigError::Validation(vec![error]))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
