//! Record encoders.
//!
//! # Data Flow
//! ```text
//! LoggerHandle::log
//!     → Backend builds a Record (borrowed, no copies of fields)
//!     → Encoder::encode writes bytes into a scratch buffer
//!     → WriteSyncer::write receives one complete record per call
//! ```
//!
//! # Design Decisions
//! - Encoders are pure and reentrant; one instance is shared by every logger
//!   routed to the same appender
//! - One `write` call per record so appenders never see a partial record

pub mod console;
pub mod json;

use std::fmt;
use std::io;
use std::panic::Location;

use chrono::{DateTime, Utc};

use crate::field::Field;
use crate::level::Level;

pub use console::ConsoleEncoder;
pub use json::JsonEncoder;

/// A structured log record, borrowed from the emitting call.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub logger: &'a str,
    pub message: &'a str,
    /// Fields pre-populated on the handle with `with`.
    pub context: &'a [Field],
    /// Fields passed at the call site.
    pub fields: &'a [Field],
    pub caller: Option<&'a Location<'a>>,
    pub stack: Option<&'a str>,
}

impl<'a> Record<'a> {
    /// Context fields followed by call-site fields.
    pub fn all_fields(&self) -> impl Iterator<Item = &'a Field> {
        self.context.iter().chain(self.fields.iter())
    }

    pub fn has_fields(&self) -> bool {
        !self.context.is_empty() || !self.fields.is_empty()
    }
}

/// Turns a record into bytes.
pub trait Encoder: Send + Sync + fmt::Debug {
    /// Append the encoded record, including its trailing newline, to `buf`.
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> io::Result<()>;
}
