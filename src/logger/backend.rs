//! The write path behind a handle: one core per bound appender.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::sync::Arc;

use chrono::Utc;

use crate::appender::{sync_all, Appender, AppenderSet, SyncError};
use crate::encoder::Record;
use crate::field::Field;
use crate::level::Level;
use crate::observability::metrics;
use crate::routing::NodePolicy;

#[derive(Debug)]
struct Core {
    appender: Appender,
    level: Level,
}

/// Immutable fan-out built from one node policy and one appender generation.
///
/// Reconfiguration never edits a backend; it binds a new one and swaps it
/// into the handle.
#[derive(Debug)]
pub struct Backend {
    name: Arc<str>,
    cores: Vec<Core>,
    min_level: Level,
    add_caller: bool,
    stacktrace_level: Level,
}

impl Backend {
    /// Bind `policy` against `appenders`.
    ///
    /// Appenders at `Off` are left out. Names absent from the set are left
    /// out with a warning. An empty fan-out writes nothing.
    pub fn bind(name: &Arc<str>, policy: &NodePolicy, appenders: &AppenderSet) -> Self {
        let mut cores = Vec::with_capacity(policy.appender_levels.len());
        for (appender, level) in policy.appender_levels.iter() {
            if level == Level::Off {
                continue;
            }
            match appenders.get(appender) {
                Some(appender) => cores.push(Core {
                    appender: appender.clone(),
                    level,
                }),
                None => tracing::warn!(
                    logger = %display_name(name),
                    appender,
                    "appender is not configured, leaving it out of the fan-out"
                ),
            }
        }

        let min_level = cores.iter().map(|core| core.level).min().unwrap_or(Level::Off);
        Self {
            name: Arc::clone(name),
            cores,
            min_level,
            add_caller: policy.add_caller,
            stacktrace_level: policy.stacktrace_level,
        }
    }

    /// A backend that discards everything.
    pub fn noop(name: &Arc<str>) -> Self {
        Self {
            name: Arc::clone(name),
            cores: Vec::new(),
            min_level: Level::Off,
            add_caller: false,
            stacktrace_level: Level::Off,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowest threshold across the fan-out.
    pub fn min_level(&self) -> Level {
        self.min_level
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.min_level)
    }

    pub fn appenders(&self) -> impl Iterator<Item = &Appender> {
        self.cores.iter().map(|core| &core.appender)
    }

    /// Bound appender names and their thresholds.
    pub fn appender_levels(&self) -> Vec<(String, Level)> {
        self.cores
            .iter()
            .map(|core| (core.appender.name().to_string(), core.level))
            .collect()
    }

    /// Encode once per passing core and hand each encoding to its writer in
    /// a single call. Failures are counted, never returned.
    ///
    /// Records above `Error` are flushed through every appender that took
    /// them before this returns, since the caller may be about to unwind or
    /// exit.
    pub fn write(&self, level: Level, message: &str, context: &[Field], fields: &[Field], caller: &'static Location<'static>) {
        if !self.enabled(level) {
            return;
        }

        let stack = level
            .passes(self.stacktrace_level)
            .then(|| Backtrace::force_capture().to_string());
        let record = Record {
            time: Utc::now(),
            level,
            logger: &self.name,
            message,
            context,
            fields,
            caller: self.add_caller.then_some(caller),
            stack: stack.as_deref(),
        };

        let mut buf = Vec::with_capacity(256);
        for core in &self.cores {
            if !level.passes(core.level) {
                continue;
            }
            buf.clear();
            if let Err(error) = core.appender.encoder().encode(&record, &mut buf) {
                metrics::record_encode_error(core.appender.name());
                tracing::debug!(appender = core.appender.name(), %error, "dropping record that failed to encode");
                continue;
            }
            if let Err(error) = core.appender.writer().write(&buf) {
                metrics::record_write_error(core.appender.name());
                tracing::debug!(appender = core.appender.name(), %error, "appender write failed");
                continue;
            }
            if level > Level::Error {
                if let Err(error) = core.appender.writer().sync() {
                    metrics::record_sync_error(core.appender.name());
                    tracing::debug!(appender = core.appender.name(), %error, "appender sync failed");
                }
            }
        }
    }

    /// Flush every bound appender.
    pub fn sync(&self) -> Result<(), SyncError> {
        sync_all(self.appenders())
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "root"
    } else {
        name
    }
}
