//! Types for the conversion orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::artifact::TaskId;
use crate::converter::{normalize_extension, ConversionErrors, ConverterError};

/// Stage of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Staging,
    Converting,
    Relocating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Staging => "staging",
            Stage::Converting => "converting",
            Stage::Relocating => "relocating",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A request to convert one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// URL or local path of the source document.
    pub source_location: String,
    /// Caller-facing file name of the source, used in messages.
    pub source_file_name: String,
    /// Normalized input extension.
    pub input_extension: String,
    /// Normalized output format.
    pub output_format: String,
}

impl ConversionRequest {
    /// Creates a request, normalizing extension and format.
    pub fn new(
        source_location: impl Into<String>,
        source_file_name: impl Into<String>,
        input_extension: &str,
        output_format: &str,
    ) -> Self {
        Self {
            source_location: source_location.into(),
            source_file_name: source_file_name.into(),
            input_extension: normalize_extension(input_extension),
            output_format: normalize_extension(output_format),
        }
    }
}

/// A converted artifact, addressable by its task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub task_id: TaskId,
    /// Final artifact path, `<output_dir>/<task_id>.<format>`.
    pub output_path: PathBuf,
    /// Auxiliary artifacts. Reserved; always empty.
    pub related_files: Vec<PathBuf>,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Location of a previously produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub task_id: TaskId,
    pub file_path: PathBuf,
    /// Reserved; always empty.
    pub related_files: Vec<PathBuf>,
}

/// Outcome reported in a [`ConversionResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// A conversion finished and its artifact exists.
    Done,
    /// The artifact is available.
    Ready,
    /// No artifact exists (yet) for the task.
    Pending,
    /// The artifact was removed.
    Deleted,
    /// The operation failed; see `errors`.
    Failed,
}

/// Payload of a [`ConversionResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub related_files: Vec<String>,
    pub status: ResponseStatus,
}

/// Uniform envelope for conversion operations: `{ data, errors }`.
///
/// A non-empty `errors` list means `data.file_path` does not name a usable
/// artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResponse {
    pub data: ResponseData,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ConversionResponse {
    fn with_status(status: ResponseStatus) -> Self {
        Self {
            data: ResponseData {
                task_id: None,
                file_path: None,
                related_files: Vec::new(),
                status,
            },
            errors: Vec::new(),
        }
    }

    /// Response for a finished conversion.
    pub fn converted(result: &ConversionResult) -> Self {
        let mut response = Self::with_status(ResponseStatus::Done);
        response.data.task_id = Some(result.task_id);
        response.data.file_path = Some(result.output_path.display().to_string());
        response.data.related_files = paths_to_strings(&result.related_files);
        response
    }

    /// Response for a resolved artifact.
    pub fn resolved(artifact: &ResolvedArtifact) -> Self {
        let mut response = Self::with_status(ResponseStatus::Ready);
        response.data.task_id = Some(artifact.task_id);
        response.data.file_path = Some(artifact.file_path.display().to_string());
        response.data.related_files = paths_to_strings(&artifact.related_files);
        response
    }

    /// Response for a readiness probe.
    pub fn readiness(task_id: Option<TaskId>, ready: bool) -> Self {
        let mut response = Self::with_status(if ready {
            ResponseStatus::Ready
        } else {
            ResponseStatus::Pending
        });
        response.data.task_id = task_id;
        response
    }

    /// Response for a removed artifact.
    pub fn deleted(file_path: impl Into<String>) -> Self {
        let mut response = Self::with_status(ResponseStatus::Deleted);
        response.data.file_path = Some(file_path.into());
        response
    }

    /// Response carrying every collected failure.
    pub fn failed(errors: &ConversionErrors) -> Self {
        let mut response = Self::with_status(ResponseStatus::Failed);
        response.errors = errors.messages();
        response
    }

    /// Response for a single failure.
    pub fn error(error: &ConverterError) -> Self {
        let mut response = Self::with_status(ResponseStatus::Failed);
        response.errors = vec![error.to_string()];
        response
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

fn paths_to_strings(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_normalizes() {
        let request = ConversionRequest::new("https://x/a.DOCX", "a.DOCX", "DOCX", ".PDF");
        assert_eq!(request.input_extension, "docx");
        assert_eq!(request.output_format, "pdf");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Relocating.to_string(), "relocating");
        assert_eq!(serde_json::to_string(&Stage::Done).unwrap(), "\"done\"");
    }

    #[test]
    fn test_converted_envelope_shape() {
        let task_id = TaskId::new();
        let result = ConversionResult {
            task_id,
            output_path: PathBuf::from(format!("alternates/{}.pdf", task_id)),
            related_files: Vec::new(),
            output_size_bytes: 10,
            duration_ms: 5,
            completed_at: Utc::now(),
        };

        let json = serde_json::to_value(ConversionResponse::converted(&result)).unwrap();
        assert_eq!(json["data"]["task_id"], task_id.to_string());
        assert_eq!(json["data"]["file_path"], format!("alternates/{}.pdf", task_id));
        assert_eq!(json["data"]["related_files"], serde_json::json!([]));
        assert_eq!(json["data"]["status"], "done");
        assert_eq!(json["errors"], serde_json::json!([]));
    }

    #[test]
    fn test_failed_envelope_has_no_file() {
        let errors = ConversionErrors::from_vec(vec![
            ConverterError::UnsupportedInput {
                extension: "exe".to_string(),
            },
            ConverterError::UnsupportedOutput {
                format: "pdf".to_string(),
                source_name: "https://x/setup.exe".to_string(),
            },
        ])
        .unwrap();

        let response = ConversionResponse::failed(&errors);
        assert!(!response.is_success());
        assert!(response.data.file_path.is_none());
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.data.status, ResponseStatus::Failed);
    }
}
