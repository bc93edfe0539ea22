//! Error types for the converter module.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Maximum number of stderr characters kept in log lines.
const LOG_EXCERPT_CHARS: usize = 500;

/// Errors that can occur while converting a document.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Input extension is not registered in the capability table.
    #[error("Input file extension not supported -- {extension}")]
    UnsupportedInput { extension: String },

    /// Output format is not permitted for this input extension.
    #[error("Output extension({format}) not supported for input file({source_name})")]
    UnsupportedOutput { format: String, source_name: String },

    /// Source content could not be fetched or persisted locally.
    #[error("File downloading failed: {reason}")]
    StagingFailed { reason: String },

    /// The engine subprocess could not be started.
    #[error("Failed to start conversion engine {path}: {reason}")]
    EngineSpawnFailed { path: PathBuf, reason: String },

    /// The engine ran but exited with a non-zero status.
    #[error("Conversion failure, engine exited with code {}", display_code(.exit_code))]
    EngineConversionFailed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// No artifact exists for the given identifier or path.
    #[error("No file found for {target}")]
    ArtifactNotFound { target: String },

    /// Every sampled engine port was already in use.
    #[error("No free engine instance after {attempts} attempts")]
    NoFreeInstance { attempts: u32 },

    /// The engine did not finish within the configured limit.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// Category of a [`ConverterError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedInput,
    UnsupportedOutput,
    StagingFailed,
    EngineSpawnFailed,
    EngineConversionFailed,
    ArtifactNotFound,
    NoFreeInstance,
    Timeout,
    OutputDirectoryFailed,
    Io,
}

impl ErrorKind {
    /// Snake-case name, used as a metric label and in API payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedInput => "unsupported_input",
            Self::UnsupportedOutput => "unsupported_output",
            Self::StagingFailed => "staging_failed",
            Self::EngineSpawnFailed => "engine_spawn_failed",
            Self::EngineConversionFailed => "engine_conversion_failed",
            Self::ArtifactNotFound => "artifact_not_found",
            Self::NoFreeInstance => "no_free_instance",
            Self::Timeout => "timeout",
            Self::OutputDirectoryFailed => "output_directory_failed",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConverterError {
    /// Creates a staging failure.
    pub fn staging_failed(reason: impl Into<String>) -> Self {
        Self::StagingFailed {
            reason: reason.into(),
        }
    }

    /// Creates an artifact-not-found error.
    pub fn artifact_not_found(target: impl Into<String>) -> Self {
        Self::ArtifactNotFound {
            target: target.into(),
        }
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedInput { .. } => ErrorKind::UnsupportedInput,
            Self::UnsupportedOutput { .. } => ErrorKind::UnsupportedOutput,
            Self::StagingFailed { .. } => ErrorKind::StagingFailed,
            Self::EngineSpawnFailed { .. } => ErrorKind::EngineSpawnFailed,
            Self::EngineConversionFailed { .. } => ErrorKind::EngineConversionFailed,
            Self::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            Self::NoFreeInstance { .. } => ErrorKind::NoFreeInstance,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::OutputDirectoryFailed { .. } => ErrorKind::OutputDirectoryFailed,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether this error was raised before any side effect took place.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedInput { .. } | Self::UnsupportedOutput { .. }
        )
    }

    /// Truncated stderr of a failed engine run, for log lines.
    pub fn stderr_excerpt(&self) -> Option<String> {
        match self {
            Self::EngineConversionFailed { stderr, .. } => {
                Some(stderr.chars().take(LOG_EXCERPT_CHARS).collect())
            }
            _ => None,
        }
    }
}

/// A non-empty list of failures collected by one conversion request.
#[derive(Debug)]
pub struct ConversionErrors(Vec<ConverterError>);

impl ConversionErrors {
    /// Wraps a list of errors. Returns `None` when the list is empty.
    pub fn from_vec(errors: Vec<ConverterError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    /// The collected errors, in the order they were found.
    pub fn errors(&self) -> &[ConverterError] {
        &self.0
    }

    /// Consumes the list.
    pub fn into_inner(self) -> Vec<ConverterError> {
        self.0
    }

    /// Human-readable messages, one per error.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Kind of the first error.
    pub fn primary_kind(&self) -> ErrorKind {
        self.0[0].kind()
    }

    /// Whether any error has the given kind.
    pub fn contains(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|e| e.kind() == kind)
    }
}

impl From<ConverterError> for ConversionErrors {
    fn from(error: ConverterError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ConversionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ConversionErrors {}
