//! Append-only file writer.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::appender::WriteSyncer;

/// Buffered file writer. Records are appended whole under a mutex; `sync`
/// flushes the buffer and the file's data to disk.
#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    file: Mutex<BufWriter<File>>,
}

impl FileWriter {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteSyncer for FileWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file.lock().expect("file writer mutex poisoned");
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        let mut file = self.file.lock().expect("file writer mutex poisoned");
        file.flush()?;
        file.get_ref().sync_data()
    }
}
