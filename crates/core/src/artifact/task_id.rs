//! Opaque identifier of one conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::converter::ConverterError;

/// Identifier assigned to a conversion and used to name its artifact.
///
/// Always a UUID, so it can be embedded in file names without escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// File name of the artifact for this task in `format`.
    pub fn file_name(&self, format: &str) -> String {
        if format.is_empty() {
            self.0.to_string()
        } else {
            format!("{}.{}", self.0, format)
        }
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ConverterError;

    /// Parses a task id. Anything that is not a UUID cannot name an artifact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ConverterError::artifact_not_found(s))
    }
}
