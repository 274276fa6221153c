//! HEIC/HEIF codec handling
//!
//! The batch core treats the codec as a black box behind the [`Codec`]
//! trait. Two implementations are provided:
//!
//! - [`CliCodec`]: runs the external `heif-convert` binary from libheif
//! - [`NoOpCodec`]: stub used when no decoder is available
//!
//! [`from_config`] picks one the same way the converter does at startup.

mod cli;
mod noop;
mod traits;

pub use cli::CliCodec;
pub use noop::NoOpCodec;
pub use traits::Codec;

use crate::config::ConversionConfig;
use std::sync::Arc;

/// Select a codec from configuration
///
/// An explicit `codec_path` wins; otherwise PATH is searched when
/// `search_path` is set; otherwise (or if nothing is found) the no-op codec
/// is used.
pub fn from_config(config: &ConversionConfig) -> Arc<dyn Codec> {
    if let Some(ref codec_path) = config.codec_path {
        Arc::new(CliCodec::new(codec_path.clone()))
    } else if config.search_path {
        CliCodec::from_path()
            .map(|c| Arc::new(c) as Arc<dyn Codec>)
            .unwrap_or_else(|| Arc::new(NoOpCodec))
    } else {
        Arc::new(NoOpCodec)
    }
}
