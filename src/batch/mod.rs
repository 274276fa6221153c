//! Batch conversion orchestrator split into focused submodules.
//!
//! The `BatchConverter` struct and its methods are organized by concern:
//! - [`submit`] - Input filtering and record creation
//! - [`conversion`] - Codec invocation and state transitions
//! - [`records`] - Snapshots, derived counts and single-file downloads
//! - [`naming`] - Output renaming and archive entry naming
//! - [`export`] - Archive export preview and confirmation
//! - [`lifecycle`] - Removal, clearing and shutdown

mod conversion;
mod export;
mod lifecycle;
mod naming;
mod records;
mod submit;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::archive::{Archiver, ZipArchiver};
use crate::codec::{self, Codec};
use crate::config::Config;
use crate::error::Result;
use crate::preview::PreviewRegistry;
use crate::record::ConversionRecord;
use crate::types::{Event, RecordId};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64};
use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tokio_util::sync::CancellationToken;

/// Live records keyed by id; ids are monotonic, so key order is submission order
pub(crate) type RecordMap = BTreeMap<RecordId, ConversionRecord>;

/// Record collection and conversion bookkeeping
#[derive(Clone)]
pub(crate) struct BatchState {
    /// The single shared mutable record collection
    pub(crate) records: Arc<Mutex<RecordMap>>,
    /// Last id handed out (ids start at 1 and are never reused)
    pub(crate) next_id: Arc<AtomicU64>,
    /// Limits concurrent codec invocations (respects max_concurrent_conversions)
    pub(crate) concurrent_limit: Arc<Semaphore>,
    /// In-flight conversions and the tokens shutdown uses to stop waiting on them
    pub(crate) active_conversions: Arc<Mutex<HashMap<RecordId, CancellationToken>>>,
    /// Whether submissions are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl BatchState {
    fn new(max_concurrent: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            concurrent_limit: Arc::new(Semaphore::new(max_concurrent)),
            active_conversions: Arc::new(Mutex::new(HashMap::new())),
            accepting_new: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// External collaborators (trait objects for pluggable implementations)
#[derive(Clone)]
pub(crate) struct Collaborators {
    /// Decoder/encoder for source files
    pub(crate) codec: Arc<dyn Codec>,
    /// Archive builder for batch export
    pub(crate) archiver: Arc<dyn Archiver>,
}

/// Batch conversion orchestrator (cloneable - all fields are Arc-wrapped)
///
/// Owns one batch session: the record collection, the preview registry and
/// the in-flight conversions. Independent instances share nothing.
///
/// # Examples
///
/// ```no_run
/// use heic_batch::{BatchConverter, Config, OutputFormat, SourceFile};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let converter = BatchConverter::new(Config::default())?;
///
///     let bytes = std::fs::read("IMG_0001.HEIC")?;
///     let ids = converter
///         .submit(vec![SourceFile::new("IMG_0001.HEIC", "image/heic", bytes)], OutputFormat::Png)
///         .await?;
///
///     println!("submitted {} file(s)", ids.len());
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct BatchConverter {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Record collection and conversion bookkeeping
    pub(crate) state: BatchState,
    /// Codec and archiver
    pub(crate) collaborators: Collaborators,
    /// Preview renderings owned by ready records
    pub(crate) previews: PreviewRegistry,
}

impl BatchConverter {
    /// Create a converter with the codec selected from configuration and a
    /// ZIP archiver
    ///
    /// An explicit `codec_path` uses that heif-convert binary; otherwise PATH
    /// is searched (if enabled); if nothing is found every conversion fails
    /// with a not-supported error.
    pub fn new(config: Config) -> Result<Self> {
        let codec = codec::from_config(&config.conversion);
        let archiver = Arc::new(ZipArchiver::new(config.export.compression));
        Self::with_components(config, codec, archiver)
    }

    /// Create a converter with explicit codec and archiver implementations
    pub fn with_components(
        config: Config,
        codec: Arc<dyn Codec>,
        archiver: Arc<dyn Archiver>,
    ) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            codec = codec.name(),
            archiver = archiver.name(),
            max_concurrent = config.conversion.max_concurrent_conversions,
            "Batch converter initialized"
        );

        let (event_tx, _rx) = broadcast::channel(config.event_buffer);
        let state = BatchState::new(config.conversion.max_concurrent_conversions);

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            state,
            collaborators: Collaborators { codec, archiver },
            previews: PreviewRegistry::new(),
        })
    }

    /// Subscribe to batch events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls behind by more than `event_buffer` events receives
    /// `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Batch events as a stream; lagged gaps are logged and skipped
    pub fn event_stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        BroadcastStream::new(self.event_tx.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!(error = %e, "Event stream lagged, events skipped");
                None
            }
        })
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Registry resolving the `preview_url` of ready records
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Name of the codec in use
    pub fn codec_name(&self) -> &'static str {
        self.collaborators.codec.name()
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

impl std::fmt::Debug for BatchConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConverter")
            .field("codec", &self.collaborators.codec.name())
            .field("archiver", &self.collaborators.archiver.name())
            .field("previews", &self.previews)
            .finish_non_exhaustive()
    }
}
