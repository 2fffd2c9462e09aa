//! Appenders: named sinks pairing a writer with an encoder.
//!
//! # Data Flow
//! ```text
//! [[appenders]] config
//!     → AppenderRegistry (type name → writer/encoder factory)
//!     → AppenderSet (one immutable generation)
//!     → Backend fan-out (shared Arc handles to the same writers)
//! ```
//!
//! # Design Decisions
//! - A generation is never mutated after construction; reconfiguration swaps
//!   the whole set
//! - Writers must tolerate concurrent `write` calls from many backends
//! - `sync` across a set is best-effort: every appender is flushed and every
//!   failure is reported

pub mod console;
pub mod file;
pub mod memory;
pub mod registry;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::encoder::Encoder;
use crate::observability::metrics;

pub use console::ConsoleWriter;
pub use file::FileWriter;
pub use memory::MemoryWriter;
pub use registry::{AppenderRegistry, EncoderFactory, WriterFactory};

/// Synchronous byte sink.
pub trait WriteSyncer: Send + Sync + fmt::Debug {
    /// Write one complete encoded record.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Flush anything buffered to the underlying device.
    fn sync(&self) -> io::Result<()>;
}

/// A named writer/encoder pair.
#[derive(Debug, Clone)]
pub struct Appender {
    name: Arc<str>,
    writer: Arc<dyn WriteSyncer>,
    encoder: Arc<dyn Encoder>,
}

impl Appender {
    pub fn new(name: impl Into<Arc<str>>, writer: Arc<dyn WriteSyncer>, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            name: name.into(),
            writer,
            encoder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn writer(&self) -> &Arc<dyn WriteSyncer> {
        &self.writer
    }

    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    /// Returns true if both appenders write through the same writer instance.
    pub fn same_writer(&self, other: &Appender) -> bool {
        Arc::ptr_eq(&self.writer, &other.writer)
    }

    pub fn sync(&self) -> io::Result<()> {
        self.writer.sync()
    }
}

/// One immutable generation of appenders, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct AppenderSet {
    appenders: Arc<HashMap<String, Appender>>,
}

impl AppenderSet {
    pub fn new(appenders: impl IntoIterator<Item = Appender>) -> Self {
        let appenders = appenders
            .into_iter()
            .map(|a| (a.name().to_string(), a))
            .collect();
        Self {
            appenders: Arc::new(appenders),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Appender> {
        self.appenders.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.appenders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.appenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appenders.is_empty()
    }

    /// Appender names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.appenders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Appender> {
        self.appenders.values()
    }

    /// Flush every appender, continuing past failures.
    pub fn sync(&self) -> Result<(), SyncError> {
        sync_all(self.appenders.values())
    }
}

/// Flush each appender once, collecting every failure.
pub fn sync_all<'a>(appenders: impl IntoIterator<Item = &'a Appender>) -> Result<(), SyncError> {
    let mut failures = Vec::new();
    for appender in appenders {
        if let Err(source) = appender.sync() {
            metrics::record_sync_error(appender.name());
            failures.push(SyncFailure {
                appender: appender.name().to_string(),
                source,
            });
        }
    }
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncError { failures })
    }
}

/// A flush failure for a single appender.
#[derive(Debug, Error)]
#[error("appender `{appender}`: {source}")]
pub struct SyncFailure {
    pub appender: String,
    #[source]
    pub source: io::Error,
}

/// Aggregated flush failures; the remaining appenders were still flushed.
#[derive(Debug, Error)]
#[error("failed to sync {} appender(s): {}", .failures.len(), join_failures(.failures))]
pub struct SyncError {
    pub failures: Vec<SyncFailure>,
}

impl SyncError {
    /// Names of the appenders that failed to flush.
    pub fn appenders(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.appender.as_str())
    }

    /// Fold another aggregate into this one.
    pub fn merge(mut self, other: SyncError) -> Self {
        self.failures.extend(other.failures);
        self
    }
}

fn join_failures(failures: &[SyncFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while building appenders from configuration.
#[derive(Debug, Error)]
pub enum AppenderError {
    #[error("appender type `{0}` is not registered")]
    UnknownType(String),

    #[error("encoder type `{0}` is not registered")]
    UnknownEncoder(String),

    #[error("{kind} type `{name}` is already registered")]
    Duplicate { kind: &'static str, name: String },

    #[error("appender `{appender}`: {reason}")]
    InvalidOption { appender: String, reason: String },

    #[error("appender `{appender}`: {source}")]
    Io {
        appender: String,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::JsonEncoder;

    #[derive(Debug)]
    struct FailingSync;

    impl WriteSyncer for FailingSync {
        fn write(&self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn sync(&self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }
    }

    #[test]
    fn test_sync_continues_past_failures() {
        let healthy = Arc::new(MemoryWriter::new());
        let set = AppenderSet::new([
            Appender::new("A", Arc::new(FailingSync), Arc::new(JsonEncoder::new())),
            Appender::new("B", healthy.clone(), Arc::new(JsonEncoder::new())),
        ]);

        let err = set.sync().unwrap_err();
        assert_eq!(err.appenders().collect::<Vec<_>>(), vec!["A"]);
        assert!(err.to_string().contains("sink closed"));
        assert_eq!(healthy.sync_count(), 1);
    }

    #[test]
    fn test_names_sorted() {
        let set = AppenderSet::new([
            Appender::new("ZETA", Arc::new(MemoryWriter::new()), Arc::new(JsonEncoder::new())),
            Appender::new("ALPHA", Arc::new(MemoryWriter::new()), Arc::new(JsonEncoder::new())),
        ]);
        assert_eq!(set.names(), vec!["ALPHA", "ZETA"]);
        assert!(set.contains("ZETA"));
        assert!(!set.contains("OTHER"));
    }
}
