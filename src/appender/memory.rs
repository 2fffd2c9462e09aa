//! In-memory capture writer.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::appender::WriteSyncer;

/// Keeps every written record in memory. Useful for tests and for exposing
/// recent output to an in-process consumer.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    buf: Mutex<Vec<u8>>,
    syncs: AtomicUsize,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().expect("memory writer mutex poisoned");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Written output split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.buf.lock().expect("memory writer mutex poisoned").clear();
    }

    /// Number of completed `sync` calls.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }
}

impl WriteSyncer for MemoryWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .expect("memory writer mutex poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
