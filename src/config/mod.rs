//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LogConfig (validated, immutable)
//!     → LogManager::reconfigure builds appenders + routing tree off to the side
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → LogManager::reconfigure swaps the live tree in place
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, resolve_config_path, ConfigError};
pub use schema::{
    AppenderConfig, AppenderLevelConfig, EncoderConfig, LogConfig, LoggerConfig, RootLoggerConfig,
    WatchConfig,
};
pub use validation::{validate_config, ValidationError};
