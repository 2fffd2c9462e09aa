//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use logtree::appender::{AppenderRegistry, MemoryWriter, WriteSyncer};
use logtree::config::{AppenderConfig, LogConfig};
use logtree::LogManager;

/// Writer whose flushes always fail.
#[derive(Debug, Default)]
pub struct FailingWriter;

impl WriteSyncer for FailingWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk unplugged"))
    }
}

/// Registers `memory` and `failing` appender types and keeps the latest
/// memory writer built for each appender name.
#[derive(Clone, Default)]
pub struct Capture {
    writers: Arc<Mutex<HashMap<String, Arc<MemoryWriter>>>>,
}

impl Capture {
    pub fn registry(&self) -> AppenderRegistry {
        let mut registry = AppenderRegistry::default();
        let writers = Arc::clone(&self.writers);
        registry
            .register_writer("memory", move |config: &AppenderConfig| {
                let writer = Arc::new(MemoryWriter::new());
                writers
                    .lock()
                    .unwrap()
                    .insert(config.name.clone(), Arc::clone(&writer));
                Ok(writer as Arc<dyn WriteSyncer>)
            })
            .unwrap();
        registry
            .register_writer("failing", |_: &AppenderConfig| {
                Ok(Arc::new(FailingWriter) as Arc<dyn WriteSyncer>)
            })
            .unwrap();
        registry
    }

    /// Writer of the newest generation of `appender`.
    pub fn writer(&self, appender: &str) -> Arc<MemoryWriter> {
        Arc::clone(
            self.writers
                .lock()
                .unwrap()
                .get(appender)
                .unwrap_or_else(|| panic!("no memory appender named {appender}")),
        )
    }
}

/// Memory appenders with JSON encoding; the root routes to the first one.
#[allow(dead_code)]
pub fn memory_config(appenders: &[&str], root_level: &str) -> LogConfig {
    let mut config = LogConfig::empty();
    for name in appenders {
        config.appenders.push(AppenderConfig::new(*name, "memory"));
    }
    config.root.level = root_level.to_string();
    config.root.appender_refs = appenders.iter().take(1).map(|n| n.to_string()).collect();
    config
}

pub fn manager(config: &LogConfig) -> (LogManager, Capture) {
    let capture = Capture::default();
    let manager = LogManager::with_registry(config, capture.registry()).unwrap();
    (manager, capture)
}

/// Every line of `writer`, parsed as JSON.
#[allow(dead_code)]
pub fn records(writer: &MemoryWriter) -> Vec<serde_json::Value> {
    writer
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("corrupted line {line:?}: {e}")))
        .collect()
}

/// Messages of every record in `writer`.
#[allow(dead_code)]
pub fn messages(writer: &MemoryWriter) -> Vec<String> {
    records(writer)
        .iter()
        .map(|r| r["msg"].as_str().unwrap_or_default().to_string())
        .collect()
}
