//! Archive export of all ready records.

use crate::error::{ExportError, Result};
use crate::types::{Event, ExportPreview, ExportedArchive, RecordId};
use crate::utils;
use std::collections::HashMap;
use std::sync::Arc;

use super::BatchConverter;
use super::naming::{conflicting_names, resolve_entry_names};

/// A ready record captured for export
struct ReadyEntry {
    id: RecordId,
    output_name: String,
    file_name: String,
    bytes: Arc<[u8]>,
}

impl BatchConverter {
    /// Describe what an export would contain right now
    ///
    /// Suggests `<archive_prefix>-YYYYMMDD` (local date) as the archive name
    /// and lists the entry names of all ready records after collision
    /// handling. With `NameCollisionAction::Reject`, colliding names are
    /// listed unresolved and reported in `conflicts`. Has no side effects.
    pub async fn prepare_export(&self) -> ExportPreview {
        let entries: Vec<(RecordId, String)> = self
            .ready_snapshot()
            .await
            .into_iter()
            .map(|entry| (entry.id, entry.file_name))
            .collect();

        let conflicts = conflicting_names(&entries);
        let included_names = match resolve_entry_names(entries.clone(), self.config.export.name_collision) {
            Ok(resolved) => resolved.into_iter().map(|(_, name)| name).collect(),
            Err(_) => entries.into_iter().map(|(_, name)| name).collect(),
        };

        ExportPreview {
            archive_name: utils::default_archive_name(&self.config.export.archive_prefix),
            included_names,
            conflicts,
        }
    }

    /// Bundle every ready record into one archive
    ///
    /// Ready records are re-read at call time, so records that became ready
    /// or were removed after [`prepare_export`](Self::prepare_export) are
    /// accounted for. Each record becomes one entry named `output_name.ext`.
    /// The archive is named `archive_name` plus the archiver's extension; a
    /// blank `archive_name` falls back to the suggested default.
    ///
    /// Returns `Ok(None)` without building anything if no record is ready.
    ///
    /// # Errors
    ///
    /// Returns `Error::Export` if names collide under
    /// `NameCollisionAction::Reject` or the archiver fails.
    pub async fn confirm_export(&self, archive_name: &str) -> Result<Option<ExportedArchive>> {
        let snapshot = self.ready_snapshot().await;
        if snapshot.is_empty() {
            tracing::info!("No ready records, nothing to export");
            return Ok(None);
        }

        if let Some(entry) = snapshot.iter().find(|entry| entry.output_name.trim().is_empty()) {
            return Err(ExportError::EmptyName { id: entry.id }.into());
        }

        let mut bytes_by_id: HashMap<RecordId, Arc<[u8]>> = snapshot
            .iter()
            .map(|entry| (entry.id, Arc::clone(&entry.bytes)))
            .collect();
        let resolved = resolve_entry_names(
            snapshot
                .into_iter()
                .map(|entry| (entry.id, entry.file_name))
                .collect(),
            self.config.export.name_collision,
        )?;

        let archiver = &self.collaborators.archiver;
        let mut writer = archiver.begin();
        let mut entry_names = Vec::with_capacity(resolved.len());
        for (id, name) in resolved {
            if let Some(bytes) = bytes_by_id.remove(&id) {
                writer.add_entry(&name, bytes);
                entry_names.push(name);
            }
        }

        let archive_name = match archive_name.trim() {
            "" => utils::default_archive_name(&self.config.export.archive_prefix),
            name => utils::sanitize_file_name(name),
        };
        let file_name = format!("{}.{}", archive_name, archiver.extension());

        let bytes = writer.build().await?;

        tracing::info!(
            archive = %file_name,
            entries = entry_names.len(),
            size = bytes.len(),
            archiver = archiver.name(),
            "Archive exported"
        );
        self.emit_event(Event::Exported {
            file_name: file_name.clone(),
            entries: entry_names.len(),
        });

        Ok(Some(ExportedArchive {
            file_name,
            entry_names,
            bytes,
        }))
    }

    /// Ready records in batch order, captured under one lock
    async fn ready_snapshot(&self) -> Vec<ReadyEntry> {
        let records = self.state.records.lock().await;
        records
            .values()
            .filter_map(|record| {
                record.ready_bytes().map(|bytes| ReadyEntry {
                    id: record.id,
                    output_name: record.output_name().to_string(),
                    file_name: record.file_name(),
                    bytes: Arc::clone(bytes),
                })
            })
            .collect()
    }
}
