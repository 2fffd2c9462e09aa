//! Standard stream writer.

use std::io::{self, Write};
use std::str::FromStr;

use crate::appender::WriteSyncer;

/// Which stream a console appender writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
    Discard,
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Target::Stdout),
            "stderr" => Ok(Target::Stderr),
            "discard" => Ok(Target::Discard),
            other => Err(format!("unknown target {other:?}, expected stdout, stderr or discard")),
        }
    }
}

/// Writes each record to stdout or stderr under the stream lock.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleWriter {
    target: Target,
}

impl ConsoleWriter {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Target {
        self.target
    }
}

impl WriteSyncer for ConsoleWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self.target {
            Target::Stdout => io::stdout().lock().write_all(buf)?,
            Target::Stderr => io::stderr().lock().write_all(buf)?,
            Target::Discard => {}
        }
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        match self.target {
            Target::Stdout => io::stdout().flush(),
            Target::Stderr => io::stderr().flush(),
            Target::Discard => Ok(()),
        }
    }
}
