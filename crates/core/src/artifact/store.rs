//! Filesystem-backed artifact lookup.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::task_id::TaskId;
use crate::converter::{ConverterConfig, ConverterError};

/// Looks up and deletes artifacts in the output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.output_dir.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final location of the artifact for `task_id` in `format`.
    pub fn artifact_path(&self, task_id: &TaskId, format: &str) -> PathBuf {
        self.output_dir.join(task_id.file_name(format))
    }

    /// Finds the artifact whose name starts with `<task_id>.`.
    ///
    /// When several match, the lexicographically first name wins.
    pub async fn locate(&self, task_id: &TaskId) -> Result<PathBuf, ConverterError> {
        let prefix = format!("{}.", task_id);
        let mut entries = match tokio::fs::read_dir(&self.output_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(ConverterError::artifact_not_found(task_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && name.to_string_lossy().starts_with(&prefix) {
                matches.push(entry.path());
            }
        }

        matches.sort();
        matches
            .into_iter()
            .next()
            .ok_or_else(|| ConverterError::artifact_not_found(task_id.to_string()))
    }

    /// Whether an artifact exists for `task_id`.
    pub async fn is_ready(&self, task_id: &TaskId) -> bool {
        self.locate(task_id).await.is_ok()
    }

    /// Removes the artifact at `path`.
    ///
    /// Only regular files inside the output directory can be removed; any other
    /// path, and a file that does not exist, report
    /// [`ConverterError::ArtifactNotFound`].
    pub async fn delete(&self, path: &Path) -> Result<(), ConverterError> {
        let not_found = || ConverterError::artifact_not_found(path.display().to_string());

        let target = match tokio::fs::canonicalize(path).await {
            Ok(target) => target,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let root = tokio::fs::canonicalize(&self.output_dir)
            .await
            .map_err(|_| not_found())?;

        let is_file = tokio::fs::metadata(&target)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !target.starts_with(&root) || !is_file {
            debug!("Refusing to delete {} outside {}", target.display(), root.display());
            return Err(not_found());
        }

        match tokio::fs::remove_file(&target).await {
            Ok(()) => {
                info!("Deleted artifact {}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    /// Locates and removes the artifact of `task_id`, returning its former path.
    pub async fn delete_task(&self, task_id: &TaskId) -> Result<PathBuf, ConverterError> {
        let path = self.locate(task_id).await?;
        self.delete(&path).await?;
        Ok(path)
    }
}
