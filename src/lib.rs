//! Hierarchical logger routing with hot reconfiguration.
//!
//! Loggers are named by slash-separated paths (`app/db/pool`). Each name
//! resolves to a routing node that decides which appenders receive a record
//! and at which level. A [`LogManager`] owns the hierarchy and can be
//! reconfigured while handles are in use: every [`LoggerHandle`] keeps its
//! identity and switches to the new routing before `reconfigure` returns.
//!
//! ```no_run
//! use logtree::{field, LogConfig, LogManager};
//!
//! let manager = LogManager::new(&LogConfig::default())?;
//! let db = manager.get_logger("app/db");
//! db.info("connected", &[field::string("host", "localhost")]);
//! # Ok::<(), logtree::Error>(())
//! ```

// Records and sinks
pub mod appender;
pub mod encoder;
pub mod field;
pub mod level;

// Hierarchy and handles
pub mod logger;
pub mod manager;
pub mod routing;

// Entry points
pub mod bridge;
pub mod global;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use appender::{Appender, AppenderRegistry, AppenderSet, SyncError, WriteSyncer};
pub use bridge::LogBridge;
pub use config::{load_config, parse_config, LogConfig};
pub use error::{Error, Result};
pub use field::{Field, Value};
pub use global::{
    default_manager, get_logger, init_with_config, init_with_config_file, init_with_config_str,
    redirect_std_log, reconfigure, set_level, sync,
};
pub use level::Level;
pub use lifecycle::Shutdown;
pub use logger::{CompletionStatus, Job, LoggerHandle};
pub use manager::LogManager;
