//! No-op codec for graceful degradation

use super::traits::Codec;
use crate::types::OutputFormat;
use async_trait::async_trait;

/// Codec used when no HEIC decoder is available
///
/// Every conversion fails with `Error::NotSupported`, so submitted files end
/// in the `error` state instead of hanging in `converting`.
///
/// # Examples
///
/// ```
/// use heic_batch::codec::{Codec, NoOpCodec};
/// use heic_batch::OutputFormat;
///
/// # #[tokio::main]
/// # async fn main() {
/// let result = NoOpCodec.convert(b"...", OutputFormat::Png, 1.0).await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpCodec;

#[async_trait]
impl Codec for NoOpCodec {
    async fn convert(
        &self,
        _input: &[u8],
        _format: OutputFormat,
        _quality: f32,
    ) -> crate::Result<Vec<Vec<u8>>> {
        Err(crate::Error::NotSupported(
            "HEIC conversion requires the external heif-convert binary. \
             Configure codec_path in config or ensure heif-convert is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
