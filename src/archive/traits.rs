//! Traits for the external archiver

use async_trait::async_trait;
use std::sync::Arc;

/// One archive in the making
///
/// Entries are added first, then [`build`](ArchiveWriter::build) produces the
/// finished archive. Adding an entry never fails; only the build can.
#[async_trait]
pub trait ArchiveWriter: Send {
    /// Add a named entry; adding the same name twice keeps the last bytes
    fn add_entry(&mut self, name: &str, bytes: Arc<[u8]>);

    /// Bundle all entries into archive bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Export(ExportError::BuildFailed)` if the archive
    /// cannot be written.
    async fn build(self: Box<Self>) -> crate::Result<Vec<u8>>;
}

/// Factory for archives
///
/// # Examples
///
/// ```
/// use heic_batch::archive::{Archiver, ZipArchiver};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let archiver = ZipArchiver::default();
/// let mut writer = archiver.begin();
/// writer.add_entry("beach.jpg", Arc::from(&b"jpeg bytes"[..]));
/// let bytes = writer.build().await?;
/// assert!(bytes.starts_with(b"PK"));
/// # Ok(())
/// # }
/// ```
pub trait Archiver: Send + Sync {
    /// Start a new, empty archive
    fn begin(&self) -> Box<dyn ArchiveWriter>;

    /// File extension of produced archives, without the dot
    fn extension(&self) -> &'static str;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
