//! Tab-separated, human-oriented encoder.

use std::io::{self, Write};

use crate::encoder::{Encoder, Record};

const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// `time<TAB>LEVEL<TAB>logger<TAB>caller<TAB>message<TAB>{fields}` followed by the
/// stack trace on its own lines. Empty columns are skipped.
#[derive(Debug, Clone)]
pub struct ConsoleEncoder {
    time_format: String,
}

impl ConsoleEncoder {
    pub fn new() -> Self {
        Self {
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    /// Use a `chrono` strftime pattern for the timestamp column.
    pub fn with_time_format(time_format: impl Into<String>) -> Self {
        Self {
            time_format: time_format.into(),
        }
    }
}

impl Default for ConsoleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for ConsoleEncoder {
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> io::Result<()> {
        write!(buf, "{}\t{}", record.time.format(&self.time_format), record.level.as_upper_str())?;
        if !record.logger.is_empty() {
            write!(buf, "\t{}", record.logger)?;
        }
        if let Some(caller) = record.caller {
            write!(buf, "\t{}:{}", caller.file(), caller.line())?;
        }
        write!(buf, "\t{}", record.message)?;

        if record.has_fields() {
            buf.extend_from_slice(b"\t{");
            for (i, field) in record.all_fields().enumerate() {
                if i > 0 {
                    buf.extend_from_slice(b", ");
                }
                serde_json::to_writer(&mut *buf, field.key.as_ref())?;
                buf.push(b':');
                serde_json::to_writer(&mut *buf, &field.value)?;
            }
            buf.push(b'}');
        }
        buf.push(b'\n');

        if let Some(stack) = record.stack {
            buf.extend_from_slice(stack.as_bytes());
            if !stack.ends_with('\n') {
                buf.push(b'\n');
            }
        }
        Ok(())
    }
}
