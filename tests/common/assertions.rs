//! Custom test assertions for integration tests

use heic_batch::{BatchConverter, Event, RecordId};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::time::Duration;

/// Wait until every record in `ids` is ready or failed
///
/// Polls the batch; panics after `timeout`.
pub async fn wait_for_settled(converter: &BatchConverter, ids: &[RecordId], timeout: Duration) {
    let settled = tokio::time::timeout(timeout, async {
        loop {
            let mut pending = 0;
            for id in ids {
                if let Some(info) = converter.record(*id).await {
                    if !info.status.is_terminal() {
                        pending += 1;
                    }
                }
            }
            if pending == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    assert!(settled.is_ok(), "records did not settle within {:?}", timeout);
}

/// Collect events until `done` returns true for one of them or `timeout` elapses
pub async fn collect_events_until<F>(
    events: &mut tokio::sync::broadcast::Receiver<Event>,
    timeout: Duration,
    done: F,
) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        while let Ok(event) = events.recv().await {
            let finished = done(&event);
            collected.push(event);
            if finished {
                return;
            }
        }
    })
    .await;
    collected
}

/// Entry name to contents of a ZIP archive
pub fn zip_entries(bytes: &[u8]) -> HashMap<String, Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip archive");
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).expect("readable entry");
            let mut contents = Vec::new();
            entry.read_to_end(&mut contents).expect("entry contents");
            (entry.name().to_string(), contents)
        })
        .collect()
}
