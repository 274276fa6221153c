//! Shared test helpers for creating BatchConverter instances in tests.

use crate::archive::ZipArchiver;
use crate::batch::BatchConverter;
use crate::codec::Codec;
use crate::config::Config;
use crate::error::{ConversionError, Result};
use crate::types::{OutputFormat, RecordId, SourceFile};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Scripted codec; the input bytes choose the behavior
///
/// - `corrupt...` fails like a codec rejecting the data
/// - `empty...` succeeds with no output image
/// - `burst...` yields two images
/// - `panic...` panics inside the codec
/// - `hang...` never finishes
/// - anything else converts to `<format>:<input>`
///
/// A gated codec additionally holds every conversion until
/// [`release`](MockCodec::release) lets it through.
pub(crate) struct MockCodec {
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
    seen: Mutex<Vec<(OutputFormat, f32)>>,
}

impl MockCodec {
    pub(crate) fn new() -> Self {
        Self {
            gate: None,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak_running: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Codec whose conversions wait until released
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Let `n` waiting conversions proceed
    pub(crate) fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_running(&self) -> usize {
        self.peak_running.load(Ordering::SeqCst)
    }

    /// (format, quality) of every conversion started so far
    pub(crate) fn seen(&self) -> Vec<(OutputFormat, f32)> {
        self.seen.lock().unwrap().clone()
    }

    /// Expected output of a successful conversion
    pub(crate) fn converted(input: &[u8], format: OutputFormat) -> Vec<u8> {
        let mut output = format!("{}:", format).into_bytes();
        output.extend_from_slice(input);
        output
    }
}

#[async_trait]
impl Codec for MockCodec {
    async fn convert(&self, input: &[u8], format: OutputFormat, quality: f32) -> Result<Vec<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((format, quality));

        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(running, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let result = if input.starts_with(b"corrupt") {
            Err(ConversionError::CodecFailed {
                codec: "mock".to_string(),
                reason: "invalid HEIF header".to_string(),
            }
            .into())
        } else if input.starts_with(b"empty") {
            Ok(Vec::new())
        } else if input.starts_with(b"burst") {
            Ok(vec![
                Self::converted(b"frame-1", format),
                Self::converted(b"frame-2", format),
            ])
        } else if input.starts_with(b"panic") {
            panic!("decoder crashed");
        } else if input.starts_with(b"hang") {
            std::future::pending::<Result<Vec<Vec<u8>>>>().await
        } else {
            Ok(vec![Self::converted(input, format)])
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Converter backed by a fresh [`MockCodec`] and a ZIP archiver
pub(crate) fn create_test_converter() -> (BatchConverter, Arc<MockCodec>) {
    create_test_converter_with(Config::default(), MockCodec::new())
}

/// Converter with an explicit config and codec
pub(crate) fn create_test_converter_with(
    config: Config,
    codec: MockCodec,
) -> (BatchConverter, Arc<MockCodec>) {
    let codec = Arc::new(codec);
    let archiver = Arc::new(ZipArchiver::new(config.export.compression));
    let converter =
        BatchConverter::with_components(config, codec.clone(), archiver).unwrap();
    (converter, codec)
}

/// A HEIC source file with the given name and contents
pub(crate) fn heic(name: &str, contents: &[u8]) -> SourceFile {
    SourceFile::new(name, "image/heic", contents.to_vec())
}

/// Wait (up to 5s) until none of `ids` is converting anymore
pub(crate) async fn wait_until_settled(converter: &BatchConverter, ids: &[RecordId]) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let mut settled = true;
            for id in ids {
                if let Some(info) = converter.record(*id).await {
                    if !info.status.is_terminal() {
                        settled = false;
                        break;
                    }
                }
            }
            if settled {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("conversions did not settle in time");
}

/// Wait (up to 5s) until the codec has been invoked `n` times
pub(crate) async fn wait_for_calls(codec: &MockCodec, n: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while codec.calls() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("codec was not invoked in time");
}

/// Wait (up to 5s) until no conversion is registered as active
pub(crate) async fn wait_until_idle(converter: &BatchConverter) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !converter.state.active_conversions.lock().await.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("conversions did not finish in time");
}
