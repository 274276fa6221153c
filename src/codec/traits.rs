//! Trait for the external HEIC/HEIF codec

use async_trait::async_trait;

use crate::types::OutputFormat;

/// Trait for HEIC/HEIF decoding and re-encoding
///
/// A codec takes the raw source bytes, the desired output format and a
/// quality in (0, 1] and returns one or more encoded images. Multi-image
/// sources (bursts, live photos) may yield several outputs, in source order.
/// Implementations report every failure as an error; the batch adapter turns
/// it into a per-record `error` status and never retries.
///
/// # Examples
///
/// ```no_run
/// use heic_batch::codec::{CliCodec, Codec};
/// use heic_batch::OutputFormat;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let codec = CliCodec::from_path().expect("heif-convert not found");
///
/// let input = std::fs::read("IMG_0001.HEIC")?;
/// let outputs = codec.convert(&input, OutputFormat::Jpeg, 0.92).await?;
/// println!("{} image(s) decoded", outputs.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Codec: Send + Sync {
    /// Convert `input` into `format`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input is corrupt or uses an unsupported HEIF variant
    /// - The external binary fails to execute (for CLI implementations)
    /// - The operation is not supported (for stub implementations)
    async fn convert(
        &self,
        input: &[u8],
        format: OutputFormat,
        quality: f32,
    ) -> crate::Result<Vec<Vec<u8>>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
