//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::capabilities::normalize_extension;

/// One engine conversion of a file that is already on local storage.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Identifier used in logs.
    pub job_id: String,
    /// Staged source file.
    pub source_path: PathBuf,
    /// Normalized input extension, used for filter selection.
    pub input_extension: String,
    /// Normalized output format.
    pub output_format: String,
    /// Directory the engine writes into.
    pub output_dir: PathBuf,
}

impl ConversionJob {
    /// Creates a job, normalizing extension and format.
    pub fn new(
        job_id: impl Into<String>,
        source_path: impl Into<PathBuf>,
        input_extension: &str,
        output_format: &str,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            source_path: source_path.into(),
            input_extension: normalize_extension(input_extension),
            output_format: normalize_extension(output_format),
            output_dir: output_dir.into(),
        }
    }

    /// Where the engine writes its artifact: the source's base name with the
    /// output format as extension, inside the output directory.
    pub fn expected_output_path(&self) -> PathBuf {
        engine_output_path(&self.source_path, &self.output_format, &self.output_dir)
    }
}

/// Path of the file the engine produces for `source` in `output_dir`.
pub fn engine_output_path(source: &Path, output_format: &str, output_dir: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", stem, output_format))
}

/// Result of a successful engine conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedFile {
    pub job_id: String,
    /// File written by the engine.
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    /// Wall time of the whole conversion in milliseconds.
    pub duration_ms: u64,
    pub input_extension: String,
    pub output_format: String,
}
