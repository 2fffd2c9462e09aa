//! Newline-delimited JSON encoder.

use std::io::{self, Write};

use chrono::SecondsFormat;
use serde::Serialize;

use crate::encoder::{Encoder, Record};

/// One JSON object per line: `ts`, `level`, `logger`, `caller`, `msg`,
/// `stacktrace`, then every field in order.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    pub fn new() -> Self {
        Self
    }
}

fn put<T: Serialize + ?Sized>(buf: &mut Vec<u8>, first: &mut bool, key: &str, value: &T) -> io::Result<()> {
    if !*first {
        buf.push(b',');
    }
    *first = false;
    serde_json::to_writer(&mut *buf, key)?;
    buf.push(b':');
    serde_json::to_writer(&mut *buf, value)?;
    Ok(())
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> io::Result<()> {
        let mut first = true;
        buf.push(b'{');
        put(buf, &mut first, "ts", &record.time.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        put(buf, &mut first, "level", record.level.as_str())?;
        if !record.logger.is_empty() {
            put(buf, &mut first, "logger", record.logger)?;
        }
        if let Some(caller) = record.caller {
            put(buf, &mut first, "caller", &format!("{}:{}", caller.file(), caller.line()))?;
        }
        put(buf, &mut first, "msg", record.message)?;
        if let Some(stack) = record.stack {
            put(buf, &mut first, "stacktrace", stack)?;
        }
        for field in record.all_fields() {
            put(buf, &mut first, &field.key, &field.value)?;
        }
        buf.write_all(b"}\n")
    }
}
