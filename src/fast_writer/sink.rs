//! Output sinks for a spreadsheet package
//!
//! A sink is one archive being written entry by entry. The engine only ever
//! starts an entry, appends bytes to it, and finally finishes the archive.
//! Sink failures are propagated to the caller unchanged; retrying them is the
//! caller's decision.

use crate::error::{ExcelError, Result};
use indexmap::IndexMap;
use s_zip::StreamingZipWriter;
use std::fs::File;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Deflate level used when none is configured
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Trait for archive backends the writer streams into
pub trait PackageSink {
    /// Value handed back once the archive is complete
    type Output;

    /// Start a new entry. Later writes go to this entry.
    fn start_entry(&mut self, name: &str) -> impl Future<Output = Result<()>>;

    /// Append bytes to the current entry
    fn write_entry(&mut self, bytes: &[u8]) -> impl Future<Output = Result<()>>;

    /// Close the archive
    fn finish(self) -> impl Future<Output = Result<Self::Output>>
    where
        Self: Sized;
}

/// In-memory package. Keeps every entry and counts the flushes it received.
#[derive(Debug, Default)]
pub struct MemoryPackage {
    entries: IndexMap<String, Vec<u8>>,
    current: Option<usize>,
    flush_count: usize,
}

impl MemoryPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of an entry
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Entry decoded as UTF-8
    pub fn entry_str(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Entry names in creation order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of `write_entry` calls so far
    pub fn flush_count(&self) -> usize {
        self.flush_count
    }
}

impl PackageSink for MemoryPackage {
    type Output = MemoryPackage;

    async fn start_entry(&mut self, name: &str) -> Result<()> {
        if self.entries.contains_key(name) {
            return Err(ExcelError::WriteError(format!(
                "Entry '{}' already exists",
                name
            )));
        }
        let (index, _) = self.entries.insert_full(name.to_string(), Vec::new());
        self.current = Some(index);
        Ok(())
    }

    async fn write_entry(&mut self, bytes: &[u8]) -> Result<()> {
        let index = self
            .current
            .ok_or_else(|| ExcelError::WriteError("No entry started".to_string()))?;
        if let Some((_, data)) = self.entries.get_index_mut(index) {
            data.extend_from_slice(bytes);
        }
        self.flush_count += 1;
        Ok(())
    }

    async fn finish(self) -> Result<MemoryPackage> {
        Ok(self)
    }
}

/// Zip file on disk, compressed on the fly by `s-zip`.
pub struct ZipPackage {
    writer: StreamingZipWriter<File>,
    path: PathBuf,
}

impl ZipPackage {
    /// Create the archive. `compression_level` is clamped to 0..=9.
    pub fn create<P: AsRef<Path>>(path: P, compression_level: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let path_str = path
            .to_str()
            .ok_or_else(|| ExcelError::InvalidConfig(format!("Path {:?} is not UTF-8", path)))?;
        if compression_level > 9 {
            log::warn!("Compression level {} clamped to 9", compression_level);
        }
        let writer = StreamingZipWriter::with_compression(path_str, compression_level.min(9))?;
        Ok(ZipPackage { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageSink for ZipPackage {
    type Output = PathBuf;

    async fn start_entry(&mut self, name: &str) -> Result<()> {
        self.writer.start_entry(name)?;
        Ok(())
    }

    async fn write_entry(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_data(bytes)?;
        Ok(())
    }

    async fn finish(self) -> Result<PathBuf> {
        self.writer.finish()?;
        Ok(self.path)
    }
}
