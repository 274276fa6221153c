//! Output renaming and archive entry naming.

use crate::config::NameCollisionAction;
use crate::error::{Error, ExportError, Result};
use crate::types::{Event, RecordId};
use crate::utils;
use std::collections::{HashMap, HashSet};

use super::BatchConverter;

impl BatchConverter {
    /// Set a record's output name
    ///
    /// Surrounding whitespace is trimmed. A blank name is ignored and the
    /// previous name kept. Names are stored as given; sanitizing happens when
    /// a file name is derived from them. Allowed in any status.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record has this id.
    pub async fn rename(&self, id: RecordId, name: &str) -> Result<()> {
        let mut records = self.state.records.lock().await;
        let record = records.get_mut(&id).ok_or(Error::NotFound(id))?;

        if !record.set_output_name(name) {
            tracing::debug!(record_id = id.0, "Rename ignored, name blank or unchanged");
            return Ok(());
        }

        let name = record.output_name().to_string();
        drop(records);

        tracing::debug!(record_id = id.0, name = %name, "Record renamed");
        self.emit_event(Event::Renamed { id, name });
        Ok(())
    }
}

/// Resolve archive entry names for `(record, file name)` pairs in batch order
///
/// - `Rename`: later duplicates become `stem (1).ext`, `stem (2).ext`, ...
/// - `Overwrite`: a duplicate replaces the earlier record in its slot
/// - `Reject`: the first duplicate fails with `ExportError::NameCollision`
pub(crate) fn resolve_entry_names(
    entries: Vec<(RecordId, String)>,
    action: NameCollisionAction,
) -> Result<Vec<(RecordId, String)>> {
    match action {
        NameCollisionAction::Rename => {
            let mut taken = HashSet::with_capacity(entries.len());
            let mut resolved = Vec::with_capacity(entries.len());

            for (id, file_name) in entries {
                let unique = utils::unique_entry_name(&file_name, &taken).ok_or_else(|| {
                    ExportError::BuildFailed {
                        reason: format!("no free entry name for {}", file_name),
                    }
                })?;
                if unique != file_name {
                    tracing::debug!(record_id = id.0, from = %file_name, to = %unique, "Renamed colliding entry");
                }
                taken.insert(unique.clone());
                resolved.push((id, unique));
            }
            Ok(resolved)
        }
        NameCollisionAction::Overwrite => {
            let mut slots: HashMap<String, usize> = HashMap::with_capacity(entries.len());
            let mut resolved: Vec<(RecordId, String)> = Vec::with_capacity(entries.len());

            for (id, file_name) in entries {
                match slots.get(&file_name) {
                    Some(&slot) => {
                        tracing::debug!(
                            record_id = id.0,
                            replaced = resolved[slot].0.0,
                            name = %file_name,
                            "Entry overwritten by later record"
                        );
                        resolved[slot].0 = id;
                    }
                    None => {
                        slots.insert(file_name.clone(), resolved.len());
                        resolved.push((id, file_name));
                    }
                }
            }
            Ok(resolved)
        }
        NameCollisionAction::Reject => {
            let mut owners: HashMap<&str, RecordId> = HashMap::with_capacity(entries.len());
            for (id, file_name) in &entries {
                if let Some(&first) = owners.get(file_name.as_str()) {
                    return Err(ExportError::NameCollision {
                        file_name: file_name.clone(),
                        first,
                        second: *id,
                    }
                    .into());
                }
                owners.insert(file_name.as_str(), *id);
            }
            Ok(entries)
        }
    }
}

/// File names used by more than one entry, in first-seen order
pub(crate) fn conflicting_names(entries: &[(RecordId, String)]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut conflicts = Vec::new();
    for (_, file_name) in entries {
        if !seen.insert(file_name.as_str()) && !conflicts.contains(file_name) {
            conflicts.push(file_name.clone());
        }
    }
    conflicts
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<(RecordId, String)> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (RecordId(i as u64 + 1), name.to_string()))
            .collect()
    }

    fn names(resolved: &[(RecordId, String)]) -> Vec<&str> {
        resolved.iter().map(|(_, name)| name.as_str()).collect()
    }

    #[test]
    fn rename_suffixes_later_duplicates() {
        let resolved = resolve_entry_names(
            entries(&["a.jpg", "b.jpg", "a.jpg", "a.jpg"]),
            NameCollisionAction::Rename,
        )
        .unwrap();

        assert_eq!(names(&resolved), ["a.jpg", "b.jpg", "a (1).jpg", "a (2).jpg"]);
        assert_eq!(resolved[2].0, RecordId(3));
    }

    #[test]
    fn rename_avoids_names_that_already_exist_literally() {
        let resolved = resolve_entry_names(
            entries(&["a (1).jpg", "a.jpg", "a.jpg"]),
            NameCollisionAction::Rename,
        )
        .unwrap();

        assert_eq!(names(&resolved), ["a (1).jpg", "a.jpg", "a (2).jpg"]);
    }

    #[test]
    fn overwrite_keeps_last_record_in_first_slot() {
        let resolved = resolve_entry_names(
            entries(&["a.jpg", "b.jpg", "a.jpg"]),
            NameCollisionAction::Overwrite,
        )
        .unwrap();

        assert_eq!(
            resolved,
            vec![
                (RecordId(3), "a.jpg".to_string()),
                (RecordId(2), "b.jpg".to_string())
            ]
        );
    }

    #[test]
    fn reject_reports_both_records() {
        let result = resolve_entry_names(
            entries(&["a.jpg", "b.jpg", "a.jpg"]),
            NameCollisionAction::Reject,
        );

        match result {
            Err(Error::Export(ExportError::NameCollision {
                file_name,
                first,
                second,
            })) => {
                assert_eq!(file_name, "a.jpg");
                assert_eq!(first, RecordId(1));
                assert_eq!(second, RecordId(3));
            }
            other => panic!("expected NameCollision, got: {:?}", other),
        }
    }

    #[test]
    fn distinct_names_pass_every_policy_unchanged() {
        for action in [
            NameCollisionAction::Rename,
            NameCollisionAction::Overwrite,
            NameCollisionAction::Reject,
        ] {
            let resolved = resolve_entry_names(entries(&["a.jpg", "b.png"]), action).unwrap();
            assert_eq!(names(&resolved), ["a.jpg", "b.png"], "{:?}", action);
        }
    }

    #[test]
    fn conflicting_names_lists_each_duplicate_once() {
        let conflicts = conflicting_names(&entries(&["a.jpg", "a.jpg", "b.jpg", "a.jpg", "b.jpg"]));
        assert_eq!(conflicts, ["a.jpg", "b.jpg"]);
    }
}
