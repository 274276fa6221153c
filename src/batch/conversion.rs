//! Codec adapter: runs one conversion and applies its outcome to the record.

use crate::error::{ConversionError, Result};
use crate::record::{ConversionOutcome, GENERIC_FAILURE_MESSAGE};
use crate::types::{Event, OutputFormat, RecordId, Status};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::BatchConverter;

impl BatchConverter {
    /// Start the background conversion of one record
    ///
    /// `token` must already be registered in `active_conversions`.
    pub(crate) fn spawn_conversion(
        &self,
        id: RecordId,
        input: Vec<u8>,
        format: OutputFormat,
        token: CancellationToken,
    ) {
        let converter = self.clone();
        tokio::spawn(async move {
            converter.run_conversion(id, input, format, token).await;
        });
    }

    async fn run_conversion(
        &self,
        id: RecordId,
        input: Vec<u8>,
        format: OutputFormat,
        token: CancellationToken,
    ) {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.convert_with_limits(id, input, format) => Some(result),
        };

        self.state.active_conversions.lock().await.remove(&id);

        let Some(result) = result else {
            tracing::debug!(record_id = id.0, "Conversion abandoned during shutdown");
            return;
        };

        let outcome = match result {
            Ok(bytes) => {
                let bytes: Arc<[u8]> = Arc::from(bytes);
                ConversionOutcome::Converted {
                    preview: self.previews.register(Arc::clone(&bytes), format),
                    bytes,
                }
            }
            Err(e) => {
                tracing::warn!(
                    record_id = id.0,
                    codec = self.collaborators.codec.name(),
                    error = %e,
                    "Conversion failed"
                );
                ConversionOutcome::Failed
            }
        };

        self.apply_outcome(id, outcome).await;
    }

    /// Run the codec under the concurrency limit and optional timeout
    ///
    /// The codec runs in its own task so a panic inside it becomes an
    /// ordinary conversion error instead of leaving the record converting.
    async fn convert_with_limits(
        &self,
        id: RecordId,
        input: Vec<u8>,
        format: OutputFormat,
    ) -> Result<Vec<u8>> {
        let _permit = self
            .state
            .concurrent_limit
            .acquire()
            .await
            .map_err(|e| ConversionError::TaskFailed(e.to_string()))?;

        let codec = Arc::clone(&self.collaborators.codec);
        let codec_name = codec.name();
        let quality = self.config.conversion.quality_for(format);

        tracing::debug!(
            record_id = id.0,
            codec = codec_name,
            format = %format,
            quality,
            input_size = input.len(),
            "Starting conversion"
        );

        let mut task = CodecTask(tokio::spawn(async move {
            codec.convert(&input, format, quality).await
        }));

        let joined = match self.config.conversion.conversion_timeout {
            Some(after) => match tokio::time::timeout(after, &mut task.0).await {
                Ok(joined) => joined,
                Err(_) => return Err(ConversionError::TimedOut { after }.into()),
            },
            None => (&mut task.0).await,
        };

        let outputs = joined.map_err(|e| ConversionError::TaskFailed(e.to_string()))??;
        first_output(outputs, codec_name, id)
    }

    /// Apply a finished conversion to its record
    ///
    /// A record removed (or cleared) while converting is gone; its outcome is
    /// dropped here, which releases any preview it carried.
    pub(crate) async fn apply_outcome(&self, id: RecordId, outcome: ConversionOutcome) {
        let mut records = self.state.records.lock().await;

        let Some(record) = records.get_mut(&id) else {
            tracing::debug!(
                record_id = id.0,
                "Record removed before conversion finished, discarding result"
            );
            return;
        };

        match record.complete(outcome) {
            Ok(Status::Ready) => {
                let output_size = record.ready_bytes().map_or(0, |bytes| bytes.len());
                drop(records);

                tracing::info!(record_id = id.0, output_size, "Conversion complete");
                self.emit_event(Event::Converted { id, output_size });
            }
            Ok(_) => {
                drop(records);
                self.emit_event(Event::ConversionFailed {
                    id,
                    error: GENERIC_FAILURE_MESSAGE.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(
                    record_id = id.0,
                    "Record already completed, ignoring duplicate result"
                );
            }
        }
    }
}

/// Codec task aborted on drop
///
/// Timeouts and shutdown abandon the conversion by dropping it; the codec
/// future is dropped with the task, which stops any external decoder.
struct CodecTask<T>(JoinHandle<T>);

impl<T> Drop for CodecTask<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Keep the first image of a possibly multi-image result
fn first_output(outputs: Vec<Vec<u8>>, codec: &str, id: RecordId) -> Result<Vec<u8>> {
    if outputs.len() > 1 {
        tracing::debug!(
            record_id = id.0,
            images = outputs.len(),
            "Multi-image source, keeping the first image"
        );
    }

    outputs.into_iter().next().ok_or_else(|| {
        ConversionError::EmptyOutput {
            codec: codec.to_string(),
        }
        .into()
    })
}
