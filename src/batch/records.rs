//! Read-only views of the record collection.

use crate::error::{Error, Result};
use crate::types::{BatchCounts, DownloadFile, RecordId, RecordInfo, Status};

use super::BatchConverter;

impl BatchConverter {
    /// Snapshot of all live records, in submission order
    pub async fn records(&self) -> Vec<RecordInfo> {
        let records = self.state.records.lock().await;
        records.values().map(|record| record.info()).collect()
    }

    /// Snapshot of one record
    pub async fn record(&self, id: RecordId) -> Option<RecordInfo> {
        let records = self.state.records.lock().await;
        records.get(&id).map(|record| record.info())
    }

    /// Counts derived from the current collection
    ///
    /// Computed on every call; `ready + converting + failed == total` always
    /// holds.
    pub async fn counts(&self) -> BatchCounts {
        let records = self.state.records.lock().await;
        records
            .values()
            .fold(BatchCounts::default(), |mut counts, record| {
                counts.total += 1;
                match record.status() {
                    Status::Converting => counts.converting += 1,
                    Status::Ready => counts.ready += 1,
                    Status::Error => counts.failed += 1,
                }
                counts
            })
    }

    /// Converted output of one record, named `output_name.ext`
    ///
    /// Returns `Ok(None)` if the record exists but is not ready. Nothing is
    /// mutated.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this id.
    pub async fn download(&self, id: RecordId) -> Result<Option<DownloadFile>> {
        let records = self.state.records.lock().await;
        let record = records.get(&id).ok_or(Error::NotFound(id))?;

        Ok(record.ready_bytes().map(|bytes| DownloadFile {
            file_name: record.file_name(),
            bytes: bytes.clone(),
        }))
    }
}
