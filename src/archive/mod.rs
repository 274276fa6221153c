//! Archive construction for batch export
//!
//! The export coordinator hands named blobs to an [`Archiver`] and gets the
//! finished archive bytes back. [`ZipArchiver`] writes ZIP files in memory
//! with the `zip` crate.

mod traits;
mod zip;

pub use self::zip::ZipArchiver;
pub use traits::{ArchiveWriter, Archiver};
