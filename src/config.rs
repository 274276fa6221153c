//! Configuration types for heic-batch

use crate::error::{Error, Result};
use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Conversion behavior (target format, quality, concurrency, codec discovery)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Format used by [`BatchConverter::submit_with_default_format`](crate::BatchConverter::submit_with_default_format)
    #[serde(default)]
    pub default_format: OutputFormat,

    /// JPEG quality handed to the codec, in (0, 1] (default: 0.92)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    /// PNG quality handed to the codec, in (0, 1] (default: 1.0, lossless)
    #[serde(default = "default_png_quality")]
    pub png_quality: f32,

    /// Maximum conversions running at once (default: 4)
    ///
    /// Records waiting for a slot stay in `converting`.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_conversions: usize,

    /// Per-conversion timeout in seconds (None = wait for the codec)
    #[serde(default, with = "optional_duration_serde")]
    pub conversion_timeout: Option<Duration>,

    /// Path to the heif-convert executable (auto-detected if None)
    #[serde(default)]
    pub codec_path: Option<PathBuf>,

    /// Whether to search PATH for heif-convert if `codec_path` is not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::default(),
            jpeg_quality: default_jpeg_quality(),
            png_quality: default_png_quality(),
            max_concurrent_conversions: default_max_concurrent(),
            conversion_timeout: None,
            codec_path: None,
            search_path: true,
        }
    }
}

impl ConversionConfig {
    /// Quality parameter for a given output format
    pub fn quality_for(&self, format: OutputFormat) -> f32 {
        match format {
            OutputFormat::Jpeg => self.jpeg_quality,
            OutputFormat::Png => self.png_quality,
        }
    }
}

/// How to resolve two ready records that map to the same archive entry name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCollisionAction {
    /// Append " (1)", " (2)", ... to later duplicates (default)
    #[default]
    Rename,
    /// Last write wins; only the last record with that name is kept
    Overwrite,
    /// Fail the export
    Reject,
}

/// Compression used for archive entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveCompression {
    /// No compression; JPEG and PNG payloads are already compressed (default)
    #[default]
    Stored,
    /// Deflate
    Deflated,
}

/// Archive export settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Prefix of the suggested archive name; the local date is appended as
    /// `-YYYYMMDD` (default: "converted-images")
    #[serde(default = "default_archive_prefix")]
    pub archive_prefix: String,

    /// Entry name collision handling
    #[serde(default)]
    pub name_collision: NameCollisionAction,

    /// Entry compression
    #[serde(default)]
    pub compression: ArchiveCompression,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            archive_prefix: default_archive_prefix(),
            name_collision: NameCollisionAction::default(),
            compression: ArchiveCompression::default(),
        }
    }
}

/// Main configuration for BatchConverter
///
/// Fields are organized into logical sub-configs:
/// - [`conversion`](ConversionConfig) - target format, quality and concurrency settings
/// - [`export`](ExportConfig) - archive naming and packaging
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Archive export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Event broadcast buffer size (default: 256)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// How long shutdown waits for in-flight conversions, in seconds (default: 10)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            export: ExportConfig::default(),
            event_buffer: default_event_buffer(),
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        for (key, quality) in [
            ("jpeg_quality", self.conversion.jpeg_quality),
            ("png_quality", self.conversion.png_quality),
        ] {
            if !(quality > 0.0 && quality <= 1.0) {
                return Err(Error::config(
                    key,
                    format!("{} must be in (0, 1], got {}", key, quality),
                ));
            }
        }

        if self.conversion.max_concurrent_conversions == 0 {
            return Err(Error::config(
                "max_concurrent_conversions",
                "max_concurrent_conversions must be at least 1",
            ));
        }

        if self.event_buffer == 0 {
            return Err(Error::config("event_buffer", "event_buffer must be at least 1"));
        }

        if self.export.archive_prefix.trim().is_empty() {
            return Err(Error::config(
                "archive_prefix",
                "archive_prefix must not be empty",
            ));
        }

        Ok(())
    }
}

fn default_jpeg_quality() -> f32 {
    0.92
}

fn default_png_quality() -> f32 {
    1.0
}

fn default_max_concurrent() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_archive_prefix() -> String {
    "converted-images".to_string()
}

fn default_event_buffer() -> usize {
    256
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
