//! Fake codec and source file fixtures

use async_trait::async_trait;
use heic_batch::{
    BatchConverter, Codec, Config, ConversionError, OutputFormat, SourceFile, ZipArchiver,
};
use std::sync::Arc;
use std::time::Duration;

/// Codec that "converts" by prefixing the format name
///
/// Inputs starting with `corrupt` fail. Inputs starting with `slow` take
/// 50ms, enough for tests to observe the converting state.
pub struct FakeCodec;

impl FakeCodec {
    /// Bytes a successful conversion produces
    pub fn output(input: &[u8], format: OutputFormat) -> Vec<u8> {
        let mut output = format!("{}:", format).into_bytes();
        output.extend_from_slice(input);
        output
    }
}

#[async_trait]
impl Codec for FakeCodec {
    async fn convert(
        &self,
        input: &[u8],
        format: OutputFormat,
        _quality: f32,
    ) -> heic_batch::Result<Vec<Vec<u8>>> {
        if input.starts_with(b"slow") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if input.starts_with(b"corrupt") {
            return Err(ConversionError::CodecFailed {
                codec: "fake".to_string(),
                reason: "not a HEIF container".to_string(),
            }
            .into());
        }
        Ok(vec![Self::output(input, format)])
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Converter using [`FakeCodec`] and the real ZIP archiver
pub fn fake_converter(config: Config) -> BatchConverter {
    let archiver = Arc::new(ZipArchiver::new(config.export.compression));
    BatchConverter::with_components(config, Arc::new(FakeCodec), archiver)
        .expect("test config must be valid")
}

/// HEIC source file declared by media type
pub fn heic(name: &str, contents: &[u8]) -> SourceFile {
    SourceFile::new(name, "image/heic", contents.to_vec())
}

/// A file that is not a HEIC source
pub fn text_file(name: &str) -> SourceFile {
    SourceFile::new(name, "text/plain", b"just text".to_vec())
}
