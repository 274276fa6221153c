//! Core types for heic-batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for a conversion record
///
/// Ids come from a per-batch monotonic counter and are never reused, even
/// after the record they named has been removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Create a new RecordId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Target raster format for a conversion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG, lossy
    #[default]
    Jpeg,
    /// PNG, lossless
    Png,
}

impl OutputFormat {
    /// Media type handed to the codec
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// File extension used for downloads and archive entries
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::Png => write!(f, "png"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" | "image/jpeg" => Ok(OutputFormat::Jpeg),
            "png" | "image/png" => Ok(OutputFormat::Png),
            other => Err(crate::Error::NotSupported(format!(
                "output format '{}' (expected jpeg or png)",
                other
            ))),
        }
    }
}

/// Conversion status of a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Submitted, conversion in flight
    Converting,
    /// Converted; output bytes and preview are available
    Ready,
    /// Conversion failed; stays visible until removed
    Error,
}

impl Status {
    /// Whether the record can no longer change status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Converting)
    }
}

/// A raw file handed to [`BatchConverter::submit`](crate::BatchConverter::submit)
#[derive(Clone, Debug)]
pub struct SourceFile {
    /// File name as provided by the user (e.g. "IMG_0001.HEIC")
    pub name: String,
    /// Declared media type, possibly empty when the platform does not know it
    pub media_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Create a new source file
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// Snapshot of a single record, detached from the live collection
#[derive(Clone, Debug, Serialize)]
pub struct RecordInfo {
    /// Record ID
    pub id: RecordId,
    /// Input base name without the source extension
    pub original_name: String,
    /// Current output name (user-editable)
    pub output_name: String,
    /// File name a single-file download would use (`output_name.ext`)
    pub file_name: String,
    /// Conversion status
    pub status: Status,
    /// Output format fixed at submission
    pub output_format: OutputFormat,
    /// Preview URL, resolvable through the batch's
    /// [`PreviewRegistry`](crate::preview::PreviewRegistry) while the record is ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Size of the converted output in bytes (ready only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<usize>,
    /// User-facing error message (error only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the file was submitted
    pub submitted_at: DateTime<Utc>,
}

/// Counts derived from the live record collection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    /// Number of live records
    pub total: usize,
    /// Records in `ready`
    pub ready: usize,
    /// Records still converting
    pub converting: usize,
    /// Records in `error`
    pub failed: usize,
}

/// A converted file ready for single-file download
#[derive(Clone, Debug)]
pub struct DownloadFile {
    /// `output_name.ext`
    pub file_name: String,
    /// Converted bytes
    pub bytes: Arc<[u8]>,
}

/// Result of [`BatchConverter::prepare_export`](crate::BatchConverter::prepare_export)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportPreview {
    /// Suggested archive name, without extension
    pub archive_name: String,
    /// Entry names the archive would contain right now
    pub included_names: Vec<String>,
    /// File names shared by more than one ready record; how they end up in
    /// the archive depends on the configured collision action
    pub conflicts: Vec<String>,
}

/// A finished archive of all ready records
#[derive(Clone, Debug)]
pub struct ExportedArchive {
    /// Archive file name including extension (e.g. "converted-images-20240131.zip")
    pub file_name: String,
    /// Names of the entries written, in archive order
    pub entry_names: Vec<String>,
    /// Archive bytes
    pub bytes: Vec<u8>,
}

/// Event emitted during the batch lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// File accepted, conversion dispatched
    Queued {
        /// Record ID
        id: RecordId,
        /// Original name
        name: String,
        /// Output format
        format: OutputFormat,
    },

    /// Conversion finished successfully
    Converted {
        /// Record ID
        id: RecordId,
        /// Output size in bytes
        output_size: usize,
    },

    /// Conversion failed
    ConversionFailed {
        /// Record ID
        id: RecordId,
        /// User-facing message
        error: String,
    },

    /// Output name changed
    Renamed {
        /// Record ID
        id: RecordId,
        /// New output name
        name: String,
    },

    /// Record removed
    Removed {
        /// Record ID
        id: RecordId,
    },

    /// All records removed
    Cleared {
        /// Number of records removed
        count: usize,
    },

    /// Archive exported
    Exported {
        /// Archive file name
        file_name: String,
        /// Number of entries
        entries: usize,
    },

    /// Converter shut down
    Shutdown,
}
