//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the logger
//! hierarchy. All types derive Serde traits for deserialization from config files.
//! Level names stay strings here; validation parses them.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Appender declarations.
    pub appenders: Vec<AppenderConfig>,

    /// Root logger policy.
    pub root: RootLoggerConfig,

    /// Named logger policies.
    pub loggers: Vec<LoggerConfig>,

    /// File watching for hot reload.
    pub watch: WatchConfig,
}

impl Default for LogConfig {
    /// One stdout console appender, root at `info`.
    fn default() -> Self {
        Self {
            appenders: vec![AppenderConfig::new("CONSOLE", "console")
                .with_option("target", "stdout")
                .with_encoder("console")],
            root: RootLoggerConfig {
                appender_refs: vec!["CONSOLE".to_string()],
                ..RootLoggerConfig::default()
            },
            loggers: Vec::new(),
            watch: WatchConfig::default(),
        }
    }
}

impl LogConfig {
    /// A configuration with no appenders and a root that routes nowhere.
    pub fn empty() -> Self {
        Self {
            appenders: Vec::new(),
            root: RootLoggerConfig::default(),
            loggers: Vec::new(),
            watch: WatchConfig::default(),
        }
    }

    pub fn logger(&self, name: &str) -> Option<&LoggerConfig> {
        self.loggers.iter().find(|l| l.name == name)
    }
}

/// Appender declaration: a registered writer type plus its encoder.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppenderConfig {
    /// Unique appender name referenced by logger policies.
    pub name: String,

    /// Registered writer type (e.g. "console", "file").
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Encoder selection.
    #[serde(default)]
    pub encoder: EncoderConfig,

    /// Writer-specific options (e.g. `target`, `file_name`).
    #[serde(flatten)]
    pub options: toml::Table,
}

impl AppenderConfig {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            encoder: EncoderConfig::default(),
            options: toml::Table::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_encoder(mut self, kind: impl Into<String>) -> Self {
        self.encoder.kind = kind.into();
        self
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(toml::Value::as_str)
    }
}

/// Encoder selection for an appender.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EncoderConfig {
    /// Registered encoder type (default: "json").
    #[serde(rename = "type", default = "default_encoder")]
    pub kind: String,

    /// Encoder-specific options.
    #[serde(flatten)]
    pub options: toml::Table,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            kind: default_encoder(),
            options: toml::Table::new(),
        }
    }
}

impl EncoderConfig {
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(toml::Value::as_str)
    }
}

fn default_encoder() -> String {
    "json".to_string()
}

/// Root logger policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RootLoggerConfig {
    /// Minimum level (default: "info").
    pub level: String,

    /// Appenders bound at `level`.
    pub appender_refs: Vec<String>,

    /// Per-appender level overrides.
    pub appenders: Vec<AppenderLevelConfig>,

    /// Attach call-site location.
    pub add_caller: bool,

    /// Minimum level that captures a stack trace (default: "error").
    pub trace_level: Option<String>,
}

impl Default for RootLoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            appender_refs: Vec::new(),
            appenders: Vec::new(),
            add_caller: false,
            trace_level: None,
        }
    }
}

/// Named logger policy. Unset fields inherit from the nearest ancestor.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
pub struct LoggerConfig {
    /// Slash-separated hierarchy name, e.g. "app/db".
    pub name: String,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub add_caller: Option<bool>,

    #[serde(default)]
    pub trace_level: Option<String>,

    /// When non-empty, replaces the inherited fan-out.
    #[serde(default)]
    pub appender_refs: Vec<String>,

    /// Per-appender level overrides.
    #[serde(default)]
    pub appenders: Vec<AppenderLevelConfig>,
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_appender_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.appender_refs = refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_appender_level(mut self, appender: impl Into<String>, level: impl Into<String>) -> Self {
        self.appenders.push(AppenderLevelConfig {
            name: appender.into(),
            level: Some(level.into()),
        });
        self
    }
}

/// Binds one appender at a specific level.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppenderLevelConfig {
    pub name: String,

    /// Absent: the owning logger's level.
    #[serde(default)]
    pub level: Option<String>,
}

/// Hot reload settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Watch the config file and reconfigure on change.
    pub enabled: bool,

    /// Poll interval for the file watcher in seconds.
    pub poll_interval_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 2,
        }
    }
}
