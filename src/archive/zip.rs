//! In-memory ZIP archiver

use super::traits::{ArchiveWriter, Archiver};
use crate::config::ArchiveCompression;
use crate::error::{Error, ExportError, Result};
use async_trait::async_trait;
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archiver producing ZIP files in memory
#[derive(Clone, Copy, Debug, Default)]
pub struct ZipArchiver {
    compression: ArchiveCompression,
}

impl ZipArchiver {
    /// Create a ZIP archiver with the given entry compression
    pub fn new(compression: ArchiveCompression) -> Self {
        Self { compression }
    }
}

impl Archiver for ZipArchiver {
    fn begin(&self) -> Box<dyn ArchiveWriter> {
        Box::new(ZipArchiveWriter {
            compression: self.compression,
            entries: Vec::new(),
        })
    }

    fn extension(&self) -> &'static str {
        "zip"
    }

    fn name(&self) -> &'static str {
        "zip"
    }
}

/// Entries collected for one ZIP archive
struct ZipArchiveWriter {
    compression: ArchiveCompression,
    entries: Vec<(String, Arc<[u8]>)>,
}

#[async_trait]
impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: Arc<[u8]>) {
        // Same name: last write wins, keeping the original position
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = bytes,
            None => self.entries.push((name.to_string(), bytes)),
        }
    }

    async fn build(self: Box<Self>) -> Result<Vec<u8>> {
        let ZipArchiveWriter {
            compression,
            entries,
        } = *self;

        // ZIP writing is CPU-bound; keep it off the async workers
        tokio::task::spawn_blocking(move || write_zip(&entries, compression))
            .await
            .map_err(|e| {
                Error::Export(ExportError::BuildFailed {
                    reason: format!("archive task failed: {}", e),
                })
            })?
    }
}

fn write_zip(entries: &[(String, Arc<[u8]>)], compression: ArchiveCompression) -> Result<Vec<u8>> {
    let method = match compression {
        ArchiveCompression::Stored => CompressionMethod::Stored,
        ArchiveCompression::Deflated => CompressionMethod::Deflated,
    };
    let options = FileOptions::default().compression_method(method);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| build_failed(name, e))?;
        writer
            .write_all(bytes)
            .map_err(|e| build_failed(name, e))?;
    }

    let cursor = writer.finish().map_err(|e| {
        Error::Export(ExportError::BuildFailed {
            reason: format!("failed to finish archive: {}", e),
        })
    })?;

    Ok(cursor.into_inner())
}

fn build_failed(entry: &str, e: impl std::fmt::Display) -> Error {
    Error::Export(ExportError::BuildFailed {
        reason: format!("failed to write entry {}: {}", entry, e),
    })
}
