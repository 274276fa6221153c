//! Per-file conversion record

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::preview::PreviewHandle;
use crate::types::{OutputFormat, RecordId, RecordInfo, Status};
use crate::utils;

/// User-facing message for any failed conversion; details go to the log
pub const GENERIC_FAILURE_MESSAGE: &str = "Conversion failed. Please try again.";

/// Conversion state with its payload
///
/// Bytes and preview only exist in `Ready`, so a record can never hold
/// output while converting or after failing.
#[derive(Debug)]
pub(crate) enum RecordState {
    Converting,
    Ready {
        bytes: Arc<[u8]>,
        preview: PreviewHandle,
    },
    Failed {
        message: String,
    },
}

/// Result of one conversion attempt, as applied to a record
#[derive(Debug)]
pub(crate) enum ConversionOutcome {
    Converted {
        bytes: Arc<[u8]>,
        preview: PreviewHandle,
    },
    Failed,
}

/// One submitted file tracked from submission to removal
#[derive(Debug)]
pub(crate) struct ConversionRecord {
    pub(crate) id: RecordId,
    pub(crate) original_name: String,
    output_name: String,
    pub(crate) output_format: OutputFormat,
    state: RecordState,
    pub(crate) submitted_at: DateTime<Utc>,
}

impl ConversionRecord {
    pub(crate) fn new(id: RecordId, original_name: String, output_format: OutputFormat) -> Self {
        Self {
            id,
            output_name: original_name.clone(),
            original_name,
            output_format,
            state: RecordState::Converting,
            submitted_at: Utc::now(),
        }
    }

    pub(crate) fn status(&self) -> Status {
        match self.state {
            RecordState::Converting => Status::Converting,
            RecordState::Ready { .. } => Status::Ready,
            RecordState::Failed { .. } => Status::Error,
        }
    }

    pub(crate) fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Replace the output name; blank names are ignored
    ///
    /// Returns whether the name changed.
    pub(crate) fn set_output_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || name == self.output_name {
            return false;
        }
        self.output_name = name.to_string();
        true
    }

    /// `output_name.ext`, sanitized for use as a file name
    pub(crate) fn file_name(&self) -> String {
        utils::output_file_name(&self.output_name, self.output_format)
    }

    /// Output bytes, if ready
    pub(crate) fn ready_bytes(&self) -> Option<&Arc<[u8]>> {
        match &self.state {
            RecordState::Ready { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Apply the terminal transition
    ///
    /// Only a converting record accepts an outcome; anything else means the
    /// transition was already applied, and the outcome is handed back so the
    /// caller decides what to do with it (dropping it releases the preview).
    pub(crate) fn complete(
        &mut self,
        outcome: ConversionOutcome,
    ) -> std::result::Result<Status, ConversionOutcome> {
        if !matches!(self.state, RecordState::Converting) {
            return Err(outcome);
        }

        self.state = match outcome {
            ConversionOutcome::Converted { bytes, preview } => RecordState::Ready { bytes, preview },
            ConversionOutcome::Failed => RecordState::Failed {
                message: GENERIC_FAILURE_MESSAGE.to_string(),
            },
        };
        Ok(self.status())
    }

    /// Detached snapshot for callers
    pub(crate) fn info(&self) -> RecordInfo {
        let (preview_url, output_size, error) = match &self.state {
            RecordState::Converting => (None, None, None),
            RecordState::Ready { bytes, preview } => {
                (Some(preview.url().to_string()), Some(bytes.len()), None)
            }
            RecordState::Failed { message } => (None, None, Some(message.clone())),
        };

        RecordInfo {
            id: self.id,
            original_name: self.original_name.clone(),
            output_name: self.output_name.clone(),
            file_name: self.file_name(),
            status: self.status(),
            output_format: self.output_format,
            preview_url,
            output_size,
            error,
            submitted_at: self.submitted_at,
        }
    }
}
