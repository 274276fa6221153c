use super::test_helpers::*;
use super::*;
use crate::config::NameCollisionAction;
use crate::error::{Error, ExportError};
use crate::record::GENERIC_FAILURE_MESSAGE;
use crate::types::{OutputFormat, SourceFile, Status};
use std::time::Duration;
