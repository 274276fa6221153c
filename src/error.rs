//! Error types for heic-batch
//!
//! Conversion failures are scoped to a single record and never surface from
//! [`BatchConverter`](crate::BatchConverter) calls; they end up as the
//! record's `error` status. The variants here cover the operations a caller
//! invokes directly (submission, rename, export, configuration) and the
//! errors the external collaborators report to the adapter.

use std::time::Duration;
use thiserror::Error;

use crate::types::RecordId;

/// Result type alias for heic-batch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for heic-batch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "jpeg_quality")
        key: Option<String>,
    },

    /// Conversion-related error reported by the codec adapter
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Archive export error
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Record not found in the batch
    #[error("record not found: {0}")]
    NotFound(RecordId),

    /// Shutdown in progress - not accepting new submissions
    #[error("shutdown in progress: not accepting new files")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// External tool execution failed (heif-convert)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),
}

/// Errors produced while turning source bytes into output bytes
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The codec rejected the input (corrupt data, unsupported variant, ...)
    #[error("codec {codec} failed: {reason}")]
    CodecFailed {
        /// Name of the codec implementation
        codec: String,
        /// Diagnostic detail from the codec
        reason: String,
    },

    /// The codec reported success but returned no output image
    #[error("codec {codec} returned no output")]
    EmptyOutput {
        /// Name of the codec implementation
        codec: String,
    },

    /// The codec did not finish within the configured timeout
    #[error("conversion timed out after {after:?}")]
    TimedOut {
        /// The timeout that elapsed
        after: Duration,
    },

    /// The conversion task itself failed (panicked or was aborted)
    #[error("conversion task failed: {0}")]
    TaskFailed(String),
}

/// Errors produced while exporting ready records as one archive
#[derive(Debug, Error)]
pub enum ExportError {
    /// Two ready records resolve to the same file name and the collision
    /// action is `Reject`
    #[error("export name collision: {file_name} is used by records {first} and {second}")]
    NameCollision {
        /// The shared file name
        file_name: String,
        /// The record that claimed the name first
        first: RecordId,
        /// The record that collided with it
        second: RecordId,
    },

    /// A ready record has an empty output name
    #[error("record {id} has an empty output name")]
    EmptyName {
        /// The offending record
        id: RecordId,
    },

    /// The archiver failed to produce the archive
    #[error("archive build failed: {reason}")]
    BuildFailed {
        /// The reason the build failed
        reason: String,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
