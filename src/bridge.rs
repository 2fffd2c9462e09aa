//! Redirect for the `log` facade.

use log::{LevelFilter, Log, Metadata};

use crate::error::Result;
use crate::field;
use crate::level::Level;
use crate::logger::LoggerHandle;
use crate::manager::LogManager;

/// Logger that receives `log` records.
pub const STD_LOG_NAME: &str = "stdlog";

/// A `log::Log` that forwards to the `stdlog` logger.
///
/// Each record carries its `target`, plus `file` and `line` when known.
#[derive(Debug)]
pub struct LogBridge {
    logger: LoggerHandle,
}

impl LogBridge {
    pub fn new(manager: LogManager) -> Self {
        Self {
            logger: manager.get_logger(STD_LOG_NAME),
        }
    }

    /// Install as the global `log` logger.
    pub fn install(self) -> Result<()> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.logger.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        let level = Level::from(record.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut fields = vec![field::string("target", record.target().to_string())];
        if let Some(file) = record.file() {
            fields.push(field::string("file", file.to_string()));
        }
        if let Some(line) = record.line() {
            fields.push(field::uint("line", u64::from(line)));
        }
        self.logger.log(level, &record.args().to_string(), &fields);
    }

    fn flush(&self) {
        if let Err(error) = self.logger.sync() {
            tracing::debug!(%error, "flushing the log bridge failed");
        }
    }
}
