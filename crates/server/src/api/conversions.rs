//! Conversion API handlers.
//!
//! Every handler answers with the `{ data, errors }` envelope; the HTTP status
//! carries the error category.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use docbridge_core::{
    ConversionErrors, ConversionRequest, ConversionResponse, ConverterError, ErrorKind,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for starting a conversion
#[derive(Debug, Deserialize)]
pub struct ConvertBody {
    /// URL or server-local path of the source document
    pub source_url: String,
    /// File name of the source, used in messages
    #[serde(default)]
    pub file_name: String,
    /// Input extension, e.g. "docx"
    #[serde(default)]
    pub file_type: String,
    /// Requested output format, e.g. "pdf"
    pub format: String,
}

/// Request body for an inline conversion
#[derive(Debug, Deserialize)]
pub struct InlineBody {
    /// Path of a document inside the staging directory
    pub path: PathBuf,
}

/// Response for an inline conversion
#[derive(Debug, Serialize)]
pub struct InlineResponse {
    pub content: String,
    pub errors: Vec<String>,
}

/// Request body for deleting an artifact by path
#[derive(Debug, Deserialize)]
pub struct DeleteArtifactBody {
    pub file_path: PathBuf,
}

type EnvelopeResult = (StatusCode, Json<ConversionResponse>);

/// HTTP status for an error category.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnsupportedInput | ErrorKind::UnsupportedOutput => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::StagingFailed => StatusCode::BAD_REQUEST,
        ErrorKind::ArtifactNotFound => StatusCode::NOT_FOUND,
        ErrorKind::EngineSpawnFailed | ErrorKind::EngineConversionFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::NoFreeInstance | ErrorKind::OutputDirectoryFailed | ErrorKind::Io => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn failed(errors: &ConversionErrors) -> EnvelopeResult {
    (
        status_for(errors.primary_kind()),
        Json(ConversionResponse::failed(errors)),
    )
}

fn error(error: &ConverterError) -> EnvelopeResult {
    (status_for(error.kind()), Json(ConversionResponse::error(error)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Convert a document and store the artifact
pub async fn create_conversion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConvertBody>,
) -> EnvelopeResult {
    let file_name = if body.file_name.is_empty() {
        body.source_url.clone()
    } else {
        body.file_name
    };
    let request = ConversionRequest::new(body.source_url, file_name, &body.file_type, &body.format);

    match state.orchestrator().convert(request).await {
        Ok(result) => {
            info!("Conversion {} stored at {}", result.task_id, result.output_path.display());
            (StatusCode::CREATED, Json(ConversionResponse::converted(&result)))
        }
        Err(errors) => failed(&errors),
    }
}

/// Convert a local document to HTML and return it inline
pub async fn convert_inline(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InlineBody>,
) -> (StatusCode, Json<InlineResponse>) {
    match state.orchestrator().convert_inline(&body.path).await {
        Ok(content) => (
            StatusCode::OK,
            Json(InlineResponse {
                content,
                errors: Vec::new(),
            }),
        ),
        Err(e) => (
            status_for(e.kind()),
            Json(InlineResponse {
                content: String::new(),
                errors: vec![e.to_string()],
            }),
        ),
    }
}

/// Resolve a task id to its artifact
pub async fn get_conversion(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> EnvelopeResult {
    match state.orchestrator().resolve(&task_id).await {
        Ok(artifact) => (StatusCode::OK, Json(ConversionResponse::resolved(&artifact))),
        Err(e) => error(&e),
    }
}

/// Check whether a task's artifact exists
pub async fn conversion_ready(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> EnvelopeResult {
    let ready = state.orchestrator().is_ready(&task_id).await;
    (
        StatusCode::OK,
        Json(ConversionResponse::readiness(task_id.parse().ok(), ready)),
    )
}

/// Delete a task's artifact
pub async fn delete_conversion(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> EnvelopeResult {
    match state.orchestrator().delete_task(&task_id).await {
        Ok(path) => (
            StatusCode::OK,
            Json(ConversionResponse::deleted(path.display().to_string())),
        ),
        Err(e) => error(&e),
    }
}

/// Delete an artifact by path
pub async fn delete_artifact(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeleteArtifactBody>,
) -> EnvelopeResult {
    match state.orchestrator().delete(&body.file_path).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ConversionResponse::deleted(body.file_path.display().to_string())),
        ),
        Err(e) => error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(ErrorKind::UnsupportedInput),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(ErrorKind::StagingFailed), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::ArtifactNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(ErrorKind::EngineConversionFailed),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            status_for(ErrorKind::NoFreeInstance),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
