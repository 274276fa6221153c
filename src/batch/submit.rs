//! File submission: filtering, record creation and conversion dispatch.

use crate::error::{Error, Result};
use crate::record::ConversionRecord;
use crate::types::{Event, OutputFormat, RecordId, SourceFile};
use crate::utils;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

use super::BatchConverter;

impl BatchConverter {
    /// Submit files for conversion into `format`
    ///
    /// Files that are not HEIC/HEIF (by media type or file extension) are
    /// dropped silently. Every accepted file gets a new record in `converting`
    /// state, appended after all existing records, and its conversion is
    /// dispatched in the background; this call returns as soon as the records
    /// exist. The format is fixed per record at this point.
    ///
    /// Returns the ids of the created records, in input order. An input with
    /// no acceptable files yields an empty list and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::ShuttingDown` once [`shutdown`](Self::shutdown) has
    /// started.
    pub async fn submit(&self, files: Vec<SourceFile>, format: OutputFormat) -> Result<Vec<RecordId>> {
        if !self.state.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let submitted = files.len();
        let accepted: Vec<SourceFile> = files
            .into_iter()
            .filter(|file| {
                let keep = utils::is_source_file(&file.name, &file.media_type);
                if !keep {
                    tracing::debug!(
                        name = %file.name,
                        media_type = %file.media_type,
                        "Ignoring non-HEIC file"
                    );
                }
                keep
            })
            .collect();

        if accepted.is_empty() {
            tracing::debug!(submitted, "No HEIC files in submission");
            return Ok(Vec::new());
        }

        // Insert records and register their cancel tokens under one lock;
        // shutdown flips `accepting_new` under the same lock
        let mut dispatch = Vec::with_capacity(accepted.len());
        {
            let mut records = self.state.records.lock().await;
            if !self.state.accepting_new.load(Ordering::SeqCst) {
                return Err(Error::ShuttingDown);
            }

            let mut active = self.state.active_conversions.lock().await;
            for file in accepted {
                let id = self.allocate_id();
                let original_name = utils::strip_source_extension(&file.name);
                let token = CancellationToken::new();
                records.insert(id, ConversionRecord::new(id, original_name.clone(), format));
                active.insert(id, token.clone());
                dispatch.push((id, original_name, file.bytes, token));
            }
        }

        let ids: Vec<RecordId> = dispatch.iter().map(|(id, ..)| *id).collect();

        tracing::info!(
            submitted,
            accepted = ids.len(),
            format = %format,
            "Files submitted for conversion"
        );

        for (id, name, bytes, token) in dispatch {
            self.emit_event(Event::Queued { id, name, format });
            self.spawn_conversion(id, bytes, format, token);
        }

        Ok(ids)
    }

    /// Submit files using the configured default format
    pub async fn submit_with_default_format(&self, files: Vec<SourceFile>) -> Result<Vec<RecordId>> {
        self.submit(files, self.config.conversion.default_format).await
    }

    /// Next record id; ids start at 1 and are never reused
    fn allocate_id(&self) -> RecordId {
        RecordId(self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
