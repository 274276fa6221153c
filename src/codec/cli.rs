//! CLI-based codec using the external heif-convert binary (libheif)

use super::traits::Codec;
use crate::error::ConversionError;
use crate::types::OutputFormat;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Stem heif-convert writes to; multi-image sources become `output-1.ext`, `output-2.ext`, ...
const OUTPUT_STEM: &str = "output";

/// CLI-based codec using the external `heif-convert` binary
///
/// Each conversion runs in its own temporary directory: the source is
/// written to disk, heif-convert decodes it and encodes every top-level
/// image, and the outputs are read back in image order.
///
/// # Examples
///
/// ```no_run
/// use heic_batch::codec::{CliCodec, Codec};
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let codec = CliCodec::new(PathBuf::from("/usr/bin/heif-convert"));
///
/// // Or auto-discover from PATH
/// let codec = CliCodec::from_path().expect("heif-convert not found in PATH");
/// assert_eq!(codec.name(), "cli-heif-convert");
/// ```
pub struct CliCodec {
    binary_path: PathBuf,
}

impl CliCodec {
    /// Create a new CLI codec with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find heif-convert in PATH
    ///
    /// Uses the `which` crate to search the system PATH.
    pub fn from_path() -> Option<Self> {
        which::which("heif-convert").ok().map(Self::new)
    }
}

#[async_trait]
impl Codec for CliCodec {
    async fn convert(
        &self,
        input: &[u8],
        format: OutputFormat,
        quality: f32,
    ) -> crate::Result<Vec<Vec<u8>>> {
        let work_dir = tempfile::tempdir()?;
        let input_path = work_dir.path().join("input.heic");
        tokio::fs::write(&input_path, input).await?;

        let output_path = work_dir
            .path()
            .join(format!("{}.{}", OUTPUT_STEM, format.extension()));

        let mut command = Command::new(&self.binary_path);
        // A timed-out or cancelled conversion drops this future; the decoder must go with it
        command.kill_on_drop(true);
        // PNG is always lossless; heif-convert only honors -q for lossy encoders
        if format == OutputFormat::Jpeg {
            command.arg("-q").arg(jpeg_quality_arg(quality).to_string());
        }

        let output = command
            .arg(&input_path)
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to execute heif-convert: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::CodecFailed {
                codec: self.name().to_string(),
                reason: format!("heif-convert exited with {}: {}", output.status, stderr.trim()),
            }
            .into());
        }

        let produced = list_outputs(work_dir.path(), format.extension()).await?;
        tracing::debug!(
            codec = self.name(),
            images = produced.len(),
            "heif-convert finished"
        );

        let mut images = Vec::with_capacity(produced.len());
        for path in produced {
            images.push(tokio::fs::read(&path).await?);
        }

        Ok(images)
    }

    fn name(&self) -> &'static str {
        "cli-heif-convert"
    }
}

/// Map a (0, 1] quality to heif-convert's 1..=100 scale
fn jpeg_quality_arg(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// List the images heif-convert wrote into `dir`, in image order
async fn list_outputs(dir: &Path, extension: &str) -> crate::Result<Vec<PathBuf>> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    Ok(order_output_names(names, extension)
        .into_iter()
        .map(|name| dir.join(name))
        .collect())
}

/// Keep only heif-convert outputs and sort them by image index
///
/// `output.ext` (single image) sorts first, numbered `output-N.ext` files
/// follow by N.
fn order_output_names(names: Vec<String>, extension: &str) -> Vec<String> {
    let single = format!("{}.{}", OUTPUT_STEM, extension);
    let suffix = format!(".{}", extension);
    let numbered_prefix = format!("{}-", OUTPUT_STEM);

    let mut indexed: Vec<(u32, String)> = names
        .into_iter()
        .filter_map(|name| {
            if name == single {
                return Some((0, name));
            }
            let index = name
                .strip_prefix(&numbered_prefix)?
                .strip_suffix(&suffix)?
                .parse::<u32>()
                .ok()?;
            Some((index, name))
        })
        .collect();

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, name)| name).collect()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_consistency_with_which_crate() {
        // Both should agree on whether the binary exists
        let which_result = which::which("heif-convert");
        let from_path_result = CliCodec::from_path();

        assert_eq!(
            which_result.is_ok(),
            from_path_result.is_some(),
            "from_path() should return Some if and only if which::which() succeeds"
        );
    }

    #[test]
    fn test_jpeg_quality_arg_scales_and_clamps() {
        assert_eq!(jpeg_quality_arg(0.92), 92);
        assert_eq!(jpeg_quality_arg(1.0), 100);
        assert_eq!(jpeg_quality_arg(0.0), 1);
        assert_eq!(jpeg_quality_arg(3.0), 100);
    }

    #[test]
    fn test_order_output_names_sorts_numbered_images() {
        let names = vec![
            "output-10.jpg".to_string(),
            "input.heic".to_string(),
            "output-2.jpg".to_string(),
            "output-1.jpg".to_string(),
            "output-x.jpg".to_string(),
            "output-3.png".to_string(),
        ];

        assert_eq!(
            order_output_names(names, "jpg"),
            vec!["output-1.jpg", "output-2.jpg", "output-10.jpg"]
        );
    }

    #[test]
    fn test_order_output_names_single_image() {
        let names = vec!["input.heic".to_string(), "output.png".to_string()];
        assert_eq!(order_output_names(names, "png"), vec!["output.png"]);
    }

    #[tokio::test]
    async fn test_list_outputs_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("output-2.jpg"), b"b").unwrap();
        std::fs::write(dir.path().join("output-1.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join("input.heic"), b"src").unwrap();

        let listed = list_outputs(dir.path(), "jpg").await.unwrap();

        assert_eq!(
            listed,
            vec![dir.path().join("output-1.jpg"), dir.path().join("output-2.jpg")]
        );
    }

    #[tokio::test]
    async fn test_convert_with_invalid_binary_path() {
        let codec = CliCodec::new(PathBuf::from("/nonexistent/path/to/heif-convert"));

        let result = codec.convert(b"not heic", OutputFormat::Jpeg, 0.9).await;

        match result {
            Err(crate::Error::ExternalTool(msg)) => {
                assert!(msg.contains("Failed to execute heif-convert"));
            }
            other => panic!("Expected ExternalTool error, got: {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore] // Requires heif-convert binary in PATH
    async fn test_convert_rejects_garbage_input() {
        let codec = match CliCodec::from_path() {
            Some(c) => c,
            None => {
                println!("Skipping test: heif-convert binary not found in PATH");
                return;
            }
        };

        let result = codec.convert(b"definitely not heic", OutputFormat::Png, 1.0).await;

        assert!(matches!(
            result,
            Err(crate::Error::Conversion(ConversionError::CodecFailed { .. }))
        ));
    }

    /// Write an executable stand-in for heif-convert that sleeps, then touches `marker`
    #[cfg(unix)]
    fn slow_binary(dir: &Path, marker: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("slow-heif-convert");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropped_conversion_kills_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let codec = CliCodec::new(slow_binary(dir.path(), &marker));

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            codec.convert(b"input", OutputFormat::Jpeg, 0.9),
        )
        .await;
        assert!(result.is_err(), "slow decoder should outlast the timeout");

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        assert!(
            !marker.exists(),
            "decoder process must be killed when the conversion is dropped"
        );
    }
}
