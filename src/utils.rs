//! Utility functions for file name handling

use chrono::NaiveDate;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::types::OutputFormat;

/// Maximum number of suffixes tried when resolving entry name collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Name used when stripping or sanitizing leaves nothing behind
const FALLBACK_NAME: &str = "image";

/// Media types accepted as source files
const SOURCE_MEDIA_TYPES: &[&str] = &["image/heic", "image/heif"];

// static patterns, validated by the tests below
#[allow(clippy::unwrap_used)]
static SOURCE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.hei[cf]$").unwrap());

#[allow(clippy::unwrap_used)]
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").unwrap());

/// Check whether a submitted file is a HEIC/HEIF source
///
/// A file is accepted if its declared media type is `image/heic` or
/// `image/heif`, or if its name ends in `.heic`/`.heif`. Both checks are
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use heic_batch::utils::is_source_file;
///
/// assert!(is_source_file("IMG_0001.HEIC", ""));
/// assert!(is_source_file("upload", "image/heif"));
/// assert!(!is_source_file("notes.txt", "text/plain"));
/// ```
#[must_use]
pub fn is_source_file(name: &str, media_type: &str) -> bool {
    let media_type = media_type.trim();
    SOURCE_MEDIA_TYPES
        .iter()
        .any(|accepted| media_type.eq_ignore_ascii_case(accepted))
        || SOURCE_SUFFIX.is_match(name.trim_end())
}

/// Derive a record's original name from the submitted file name
///
/// Drops any directory components and the `.heic`/`.heif` suffix. Names
/// without that suffix (accepted by media type) are kept whole.
///
/// # Examples
///
/// ```
/// use heic_batch::utils::strip_source_extension;
///
/// assert_eq!(strip_source_extension("IMG_0001.HEIC"), "IMG_0001");
/// assert_eq!(strip_source_extension("albums/summer.heif"), "summer");
/// assert_eq!(strip_source_extension("camera-upload"), "camera-upload");
/// ```
#[must_use]
pub fn strip_source_extension(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim();
    let stripped = SOURCE_SUFFIX.replace(base, "");
    let stripped = stripped.trim();

    if stripped.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        stripped.to_string()
    }
}

/// Make a user-provided name safe to use as a file or archive entry name
///
/// Path separators and control characters become `_`, so a name can never
/// introduce directories inside an archive.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}

/// File name for a single converted output: `output_name.ext`
#[must_use]
pub fn output_file_name(output_name: &str, format: OutputFormat) -> String {
    format!("{}.{}", sanitize_file_name(output_name), format.extension())
}

/// Suggested archive name for a given date: `prefix-YYYYMMDD`
#[must_use]
pub fn archive_name_for_date(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}", prefix.trim(), date.format("%Y%m%d"))
}

/// Suggested archive name for today's local date
#[must_use]
pub fn default_archive_name(prefix: &str) -> String {
    archive_name_for_date(prefix, chrono::Local::now().date_naive())
}

/// Find an entry name not yet in `taken`
///
/// Returns `file_name` itself if it is free, otherwise the first free
/// `stem (n).ext`. Returns `None` if all suffixes up to 9999 are taken.
///
/// # Examples
///
/// ```
/// use heic_batch::utils::unique_entry_name;
/// use std::collections::HashSet;
///
/// let taken: HashSet<String> = ["beach.jpg".to_string()].into();
/// assert_eq!(unique_entry_name("beach.jpg", &taken).as_deref(), Some("beach (1).jpg"));
/// assert_eq!(unique_entry_name("dunes.jpg", &taken).as_deref(), Some("dunes.jpg"));
/// ```
#[must_use]
pub fn unique_entry_name(file_name: &str, taken: &HashSet<String>) -> Option<String> {
    if !taken.contains(file_name) {
        return Some(file_name.to_string());
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };

    // Try adding (1), (2), (3), ... until we find a unique name
    (1..=MAX_RENAME_ATTEMPTS)
        .map(|i| match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        })
        .find(|candidate| !taken.contains(candidate))
}
