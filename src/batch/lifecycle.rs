//! Record removal and converter shutdown.

use crate::error::Result;
use crate::types::{Event, RecordId};
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::BatchConverter;

impl BatchConverter {
    /// Remove a record and release its preview
    ///
    /// Returns `false` if no record has this id. Removing a converting record
    /// does not stop its conversion; the result is discarded when it arrives.
    pub async fn remove(&self, id: RecordId) -> bool {
        let removed = self.state.records.lock().await.remove(&id);

        match removed {
            Some(record) => {
                let status = record.status();
                // Dropping the record releases its preview
                drop(record);

                tracing::debug!(record_id = id.0, ?status, "Record removed");
                self.emit_event(Event::Removed { id });
                true
            }
            None => {
                tracing::debug!(record_id = id.0, "Remove ignored, record not found");
                false
            }
        }
    }

    /// Remove every record, releasing all previews
    ///
    /// Returns the number of records removed.
    pub async fn clear(&self) -> usize {
        let removed = std::mem::take(&mut *self.state.records.lock().await);
        let count = removed.len();
        drop(removed);

        if count > 0 {
            tracing::info!(count, "Batch cleared");
            self.emit_event(Event::Cleared { count });
        }
        count
    }

    /// Gracefully shut down the converter
    ///
    /// Performs the following steps:
    /// 1. Stops accepting new submissions
    /// 2. Signals every in-flight conversion to stop waiting on the codec
    /// 3. Waits for those conversions to wind down (up to `shutdown_timeout`)
    /// 4. Clears the batch, releasing all previews
    /// 5. Emits `Event::Shutdown`
    ///
    /// Conversions stopped this way end without a status transition.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        // 1. Stop accepting new submissions; taking the records lock waits
        //    out any submit already inserting
        {
            let _records = self.state.records.lock().await;
            self.state.accepting_new.store(false, Ordering::SeqCst);
        }

        // 2. Signal in-flight conversions
        self.cancel_active_conversions().await;

        // 3. Wait for them with timeout
        let shutdown_timeout = self.config.shutdown_timeout;
        match tokio::time::timeout(shutdown_timeout, self.wait_for_active_conversions()).await {
            Ok(()) => tracing::info!("All in-flight conversions stopped"),
            Err(_) => tracing::warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "Timeout waiting for conversions to stop, proceeding with shutdown"
            ),
        }

        // 4. Release records and previews
        let cleared = self.clear().await;

        // 5. Emit shutdown event
        self.emit_event(Event::Shutdown);

        tracing::info!(cleared, "Graceful shutdown complete");
        Ok(())
    }

    /// Whether new submissions are still accepted
    pub fn is_accepting(&self) -> bool {
        self.state.accepting_new.load(Ordering::SeqCst)
    }

    async fn cancel_active_conversions(&self) {
        let active = self.state.active_conversions.lock().await;
        tracing::debug!(active_count = active.len(), "Cancelling in-flight conversions");

        for (id, token) in active.iter() {
            tracing::debug!(record_id = id.0, "Signaling conversion cancel");
            token.cancel();
        }
    }

    /// Wait until no conversion is registered as active
    async fn wait_for_active_conversions(&self) {
        loop {
            let remaining = self.state.active_conversions.lock().await.len();
            if remaining == 0 {
                return;
            }

            tracing::debug!(remaining, "Waiting for conversions to stop");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}
