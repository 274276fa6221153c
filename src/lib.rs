//! # heic-batch
//!
//! Batch conversion of HEIC/HEIF photos into JPEG or PNG.
//!
//! A [`BatchConverter`] holds one batch session: submitted files become
//! records that convert in the background, can be renamed, previewed,
//! downloaded one by one, removed, or exported together as a ZIP archive.
//!
//! - **Non-blocking** - submission returns as soon as records exist
//! - **Isolated failures** - a file that fails to convert never affects its siblings
//! - **Pluggable** - the codec and the archiver sit behind traits
//! - **Event-driven** - consumers subscribe to events instead of polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use heic_batch::{BatchConverter, Config, OutputFormat, SourceFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let converter = BatchConverter::new(Config::default())?;
//!
//!     let mut events = converter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let files = vec![SourceFile::new(
//!         "IMG_0001.HEIC",
//!         "image/heic",
//!         std::fs::read("IMG_0001.HEIC")?,
//!     )];
//!     converter.submit(files, OutputFormat::Jpeg).await?;
//!
//!     if let Some(archive) = converter.confirm_export("").await? {
//!         std::fs::write(&archive.file_name, &archive.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive builders for batch export
pub mod archive;
/// Batch orchestrator (decomposed into focused submodules)
pub mod batch;
/// HEIC/HEIF codecs
pub mod codec;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Scoped preview renderings
pub mod preview;
mod record;
/// Core types and events
pub mod types;
/// File name helpers
pub mod utils;

// Re-export commonly used types
pub use archive::{ArchiveWriter, Archiver, ZipArchiver};
pub use batch::BatchConverter;
pub use codec::{CliCodec, Codec, NoOpCodec};
pub use config::{ArchiveCompression, Config, ConversionConfig, ExportConfig, NameCollisionAction};
pub use error::{ConversionError, Error, ExportError, Result};
pub use preview::{Preview, PreviewHandle, PreviewRegistry};
pub use record::GENERIC_FAILURE_MESSAGE;
pub use types::{
    BatchCounts, DownloadFile, Event, ExportPreview, ExportedArchive, OutputFormat, RecordId,
    RecordInfo, SourceFile, Status,
};

/// Wait for a termination signal, then shut the converter down.
///
/// - **Unix:** SIGTERM or SIGINT, falling back to whichever handler could be registered.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use heic_batch::{BatchConverter, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let converter = BatchConverter::new(Config::default())?;
///     run_with_shutdown(converter).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(converter: BatchConverter) -> Result<()> {
    wait_for_signal().await;
    converter.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
            }
        }
        (Ok(mut only), Err(e)) | (Err(e), Ok(mut only)) => {
            tracing::warn!(error = %e, "Could not register both signal handlers, waiting on the other");
            only.recv().await;
            tracing::info!("Received termination signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        return;
    }
    tracing::info!("Received Ctrl+C");
}
