//! Conversion orchestrator implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::types::{ConversionRequest, ConversionResult, ResolvedArtifact, Stage};
use crate::artifact::{ArtifactStore, TaskId};
use crate::converter::{
    normalize_extension, Capabilities, ConversionErrors, ConversionJob, Converter, ConverterConfig,
    ConverterError,
};
use crate::metrics::{CONVERSIONS_TOTAL, CONVERSION_DURATION, STAGING_FAILURES};
use crate::source::SourceFetcher;

/// Format produced by [`ConversionOrchestrator::convert_inline`].
const INLINE_FORMAT: &str = "html";

/// Prefix of the private output directories used by inline conversions.
const INLINE_DIR_PREFIX: &str = "inline-";

/// Drives conversion requests from validation to a relocated artifact.
///
/// Requests are independent: any number may run concurrently on one
/// orchestrator, each with its own engine instance.
pub struct ConversionOrchestrator {
    config: ConverterConfig,
    converter: Arc<dyn Converter>,
    fetcher: Arc<dyn SourceFetcher>,
    store: ArtifactStore,
}

impl ConversionOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: ConverterConfig,
        converter: Arc<dyn Converter>,
        fetcher: Arc<dyn SourceFetcher>,
    ) -> Self {
        let store = ArtifactStore::from_config(&config);
        Self {
            config,
            converter,
            fetcher,
            store,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Converts a document and stores the artifact under a fresh task id.
    ///
    /// Validation and staging problems are all reported together and nothing is
    /// run. Engine failures abort with the engine's diagnostics.
    pub async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ConversionErrors> {
        let start = Instant::now();
        let task_id = TaskId::new();

        let outcome = self.run(&task_id, &request, start).await;

        let label = match &outcome {
            Ok(_) => "success",
            Err(errors) => errors.primary_kind().as_str(),
        };
        CONVERSIONS_TOTAL.with_label_values(&[label]).inc();
        CONVERSION_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        if let Err(errors) = &outcome {
            warn!("Conversion {} of {} failed: {}", task_id, request.source_file_name, errors);
        }
        outcome
    }

    async fn run(
        &self,
        task_id: &TaskId,
        request: &ConversionRequest,
        start: Instant,
    ) -> Result<ConversionResult, ConversionErrors> {
        let input = normalize_extension(&request.input_extension);
        let format = normalize_extension(&request.output_format);

        self.enter(task_id, Stage::Validating);
        if let Some(errors) = ConversionErrors::from_vec(validate(request, &input, &format)) {
            return Err(errors);
        }

        self.enter(task_id, Stage::Staging);
        let staged = self.config.staging_dir().join(task_id.file_name(&input));
        if let Err(e) = self.stage(&request.source_location, &staged).await {
            STAGING_FAILURES.inc();
            self.discard_source(&staged).await;
            return Err(e.into());
        }

        self.enter(task_id, Stage::Converting);
        let job = ConversionJob::new(
            task_id.to_string(),
            &staged,
            &input,
            &format,
            &self.config.output_dir,
        );
        let converted = self.converter.convert(job).await;
        // A same-format conversion staged in the output directory is its own artifact.
        let produced_in_place = matches!(&converted, Ok(c) if c.output_path == staged);
        if !produced_in_place {
            self.discard_source(&staged).await;
        }
        let converted = converted?;

        self.enter(task_id, Stage::Relocating);
        let output_path = self.store.artifact_path(task_id, &format);
        if converted.output_path != output_path {
            tokio::fs::rename(&converted.output_path, &output_path)
                .await
                .map_err(|e| {
                    error!(
                        "Failed to move {} to {}: {}",
                        converted.output_path.display(),
                        output_path.display(),
                        e
                    );
                    ConverterError::Io(e)
                })?;
        }

        self.enter(task_id, Stage::Done);
        info!(
            "Converted {} ({} -> {}) into {}",
            request.source_file_name,
            input,
            format,
            output_path.display()
        );

        Ok(ConversionResult {
            task_id: *task_id,
            output_path,
            related_files: Vec::new(),
            output_size_bytes: converted.output_size_bytes,
            duration_ms: start.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        })
    }

    fn enter(&self, task_id: &TaskId, stage: Stage) {
        debug!("Conversion {} entering {}", task_id, stage);
    }

    async fn stage(&self, location: &str, staged: &Path) -> Result<(), ConverterError> {
        let bytes = self.fetcher.fetch(location, staged).await.map_err(|e| match e {
            ConverterError::StagingFailed { .. } => e,
            other => ConverterError::staging_failed(other.to_string()),
        })?;
        if bytes == 0 {
            return Err(ConverterError::staging_failed(format!(
                "{} is empty",
                location
            )));
        }
        Ok(())
    }

    async fn discard_source(&self, staged: &Path) {
        if self.config.preserve_sources {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(staged).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove staged source {}: {}", staged.display(), e);
            }
        }
    }

    /// Converts a file already in the staging directory to HTML and returns the
    /// content.
    ///
    /// Paths outside the staging directory are refused. The engine writes into a
    /// private directory that is removed once the output is read, so nothing
    /// next to the source is touched.
    pub async fn convert_inline(&self, path: &Path) -> Result<String, ConverterError> {
        let input = normalize_extension(
            &path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        if !Capabilities::supports_input(&input) {
            return Err(ConverterError::UnsupportedInput { extension: input });
        }
        if !Capabilities::supports(&input, INLINE_FORMAT) {
            return Err(ConverterError::UnsupportedOutput {
                format: INLINE_FORMAT.to_string(),
                source_name: path.display().to_string(),
            });
        }

        let source = self.staged_file(path).await?;

        let job_id = TaskId::new().to_string();
        let output_dir = self
            .config
            .staging_dir()
            .join(format!("{}{}", INLINE_DIR_PREFIX, job_id));
        let job = ConversionJob::new(job_id, &source, &input, INLINE_FORMAT, &output_dir);
        let content = match self.converter.convert(job).await {
            Ok(converted) => tokio::fs::read(&converted.output_path)
                .await
                .map_err(ConverterError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = tokio::fs::remove_dir_all(&output_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove inline output {}: {}", output_dir.display(), e);
            }
        }
        let content = content?;

        debug!("Inline conversion of {} produced {} bytes", path.display(), content.len());
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    /// Resolves `path` to a regular file inside the staging directory.
    async fn staged_file(&self, path: &Path) -> Result<PathBuf, ConverterError> {
        let not_staged = || {
            ConverterError::staging_failed(format!(
                "{} is not a readable file in the staging directory",
                path.display()
            ))
        };

        let staging = tokio::fs::canonicalize(self.config.staging_dir())
            .await
            .map_err(|_| not_staged())?;
        let source = tokio::fs::canonicalize(path).await.map_err(|_| not_staged())?;
        if !source.starts_with(&staging) {
            warn!("Refusing inline conversion outside staging: {}", path.display());
            return Err(not_staged());
        }
        match tokio::fs::metadata(&source).await {
            Ok(meta) if meta.is_file() => Ok(source),
            _ => Err(not_staged()),
        }
    }

    /// Whether the artifact of `task_id` exists.
    pub async fn is_ready(&self, task_id: &str) -> bool {
        match task_id.parse::<TaskId>() {
            Ok(id) => self.store.is_ready(&id).await,
            Err(_) => false,
        }
    }

    /// Resolves `task_id` to its artifact path.
    pub async fn resolve(&self, task_id: &str) -> Result<ResolvedArtifact, ConverterError> {
        let id: TaskId = task_id.parse()?;
        let file_path = self.store.locate(&id).await?;
        Ok(ResolvedArtifact {
            task_id: id,
            file_path,
            related_files: Vec::new(),
        })
    }

    /// Deletes the artifact at `path`.
    pub async fn delete(&self, path: &Path) -> Result<(), ConverterError> {
        self.store.delete(path).await
    }

    /// Deletes the artifact of `task_id`, returning the removed path.
    pub async fn delete_task(&self, task_id: &str) -> Result<PathBuf, ConverterError> {
        let id: TaskId = task_id.parse()?;
        self.store.delete_task(&id).await
    }
}

/// Checks the request against the capability table, collecting every problem.
fn validate(request: &ConversionRequest, input: &str, format: &str) -> Vec<ConverterError> {
    let mut errors = Vec::new();
    if !Capabilities::supports_input(input) {
        errors.push(ConverterError::UnsupportedInput {
            extension: input.to_string(),
        });
    }
    if !Capabilities::supports(input, format) {
        errors.push(ConverterError::UnsupportedOutput {
            format: format.to_string(),
            source_name: request.source_location.clone(),
        });
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ErrorKind;
    use crate::testing::{fixtures, MockConverter, MockFetcher};
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        temp: TempDir,
        converter: Arc<MockConverter>,
        fetcher: Arc<MockFetcher>,
        orchestrator: ConversionOrchestrator,
    }

    fn harness_with(configure: impl FnOnce(ConverterConfig) -> ConverterConfig) -> Harness {
        let temp = TempDir::new().unwrap();
        let config = configure(
            ConverterConfig::default()
                .with_output_dir(temp.path().join("alternates"))
                .with_temp_root(temp.path().join("tmp")),
        );
        let converter = Arc::new(MockConverter::new());
        let fetcher = Arc::new(MockFetcher::new());
        let orchestrator = ConversionOrchestrator::new(
            config,
            converter.clone() as Arc<dyn Converter>,
            fetcher.clone() as Arc<dyn SourceFetcher>,
        );
        Harness {
            temp,
            converter,
            fetcher,
            orchestrator,
        }
    }

    fn harness() -> Harness {
        harness_with(|config| config)
    }

    #[tokio::test]
    async fn test_convert_success() {
        let h = harness();
        let result = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("Report.DOCX"))
            .await
            .unwrap();

        assert!(result.output_path.exists());
        assert_eq!(
            result.output_path.file_name().unwrap().to_string_lossy(),
            format!("{}.pdf", result.task_id)
        );
        assert!(result.related_files.is_empty());
        assert!(h.orchestrator.is_ready(&result.task_id.to_string()).await);

        let resolved = h
            .orchestrator
            .resolve(&result.task_id.to_string())
            .await
            .unwrap();
        assert_eq!(resolved.file_path, result.output_path);
        assert!(resolved.file_path.to_string_lossy().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_unknown_extension_accumulates_and_skips_staging() {
        let h = harness();
        let errors = h
            .orchestrator
            .convert(fixtures::request("setup.exe", "exe", "pdf"))
            .await
            .unwrap_err();

        assert_eq!(errors.errors().len(), 2);
        assert_eq!(errors.primary_kind(), ErrorKind::UnsupportedInput);
        assert!(errors.contains(ErrorKind::UnsupportedOutput));
        assert_eq!(h.fetcher.fetch_count().await, 0);
        assert_eq!(h.converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_unsupported_output_only() {
        let h = harness();
        let errors = h
            .orchestrator
            .convert(fixtures::request("slides.pptx", "pptx", "html"))
            .await
            .unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.primary_kind(), ErrorKind::UnsupportedOutput);
        assert!(errors.messages()[0].contains("Output extension(html)"));
        assert_eq!(h.fetcher.fetch_count().await, 0);
    }

    #[tokio::test]
    async fn test_every_capability_pair_passes_validation() {
        let h = harness();
        for (input, outputs) in Capabilities::table() {
            for output in outputs.iter() {
                let request = fixtures::request(&format!("file.{}", input), input, output);
                let result = h.orchestrator.convert(request).await;
                if let Err(errors) = result {
                    assert!(
                        !errors.contains(ErrorKind::UnsupportedInput)
                            && !errors.contains(ErrorKind::UnsupportedOutput),
                        "{input} -> {output} rejected: {errors}"
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_staging_failure_skips_conversion() {
        let h = harness();
        h.fetcher
            .set_next_error(ConverterError::staging_failed("connection refused"))
            .await;

        let errors = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("a.docx"))
            .await
            .unwrap_err();

        assert_eq!(errors.primary_kind(), ErrorKind::StagingFailed);
        assert_eq!(h.converter.conversion_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_source_is_staging_failure() {
        let h = harness();
        h.fetcher.set_default_content(Vec::new()).await;

        let errors = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("empty.docx"))
            .await
            .unwrap_err();

        assert_eq!(errors.primary_kind(), ErrorKind::StagingFailed);
        assert_eq!(h.converter.conversion_count().await, 0);
        let staging = h.orchestrator.config().staging_dir();
        let leftovers = std::fs::read_dir(&staging).map(|d| d.count()).unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_engine_failure_propagates_and_cleans_source() {
        let h = harness();
        h.converter
            .set_next_error(ConverterError::EngineConversionFailed {
                exit_code: Some(81),
                stdout: String::new(),
                stderr: "crash".to_string(),
            })
            .await;

        let errors = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("a.docx"))
            .await
            .unwrap_err();

        assert_eq!(errors.primary_kind(), ErrorKind::EngineConversionFailed);
        assert!(errors.to_string().contains("81"));
        let staging = h.orchestrator.config().staging_dir();
        assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_staged_name_derives_from_task_id() {
        let h = harness();
        let result = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("shared-name.docx"))
            .await
            .unwrap();

        let fetches = h.fetcher.recorded_fetches().await;
        assert_eq!(
            fetches[0].destination.file_name().unwrap().to_string_lossy(),
            format!("{}.docx", result.task_id)
        );

        let jobs = h.converter.recorded_conversions().await;
        assert_eq!(jobs[0].job.input_extension, "docx");
        assert_eq!(jobs[0].job.output_format, "pdf");
    }

    #[tokio::test]
    async fn test_preserve_sources_keeps_staged_file() {
        let h = harness_with(|config| config.with_preserve_sources(true));
        let result = h
            .orchestrator
            .convert(fixtures::docx_to_pdf("keep.docx"))
            .await
            .unwrap();

        let staged = h
            .orchestrator
            .config()
            .staging_dir()
            .join(format!("{}.docx", result.task_id));
        assert!(staged.exists());
    }

    #[tokio::test]
    async fn test_concurrent_conversions_get_distinct_artifacts() {
        let h = harness();
        h.converter
            .set_conversion_duration(Duration::from_millis(20))
            .await;

        let requests = (0..8).map(|_| h.orchestrator.convert(fixtures::docx_to_pdf("same.docx")));
        let results = futures::future::join_all(requests).await;

        let mut paths: Vec<PathBuf> = results
            .into_iter()
            .map(|r| r.unwrap().output_path)
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 8);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn test_delete_then_not_ready() {
        let h = harness();
        let result = h
            .orchestrator
            .convert(fixtures::request("notes.txt", "txt", "odt"))
            .await
            .unwrap();
        let id = result.task_id.to_string();

        h.orchestrator.delete(&result.output_path).await.unwrap();
        assert!(!h.orchestrator.is_ready(&id).await);

        let err = h.orchestrator.delete(&result.output_path).await.unwrap_err();
        assert!(matches!(err, ConverterError::ArtifactNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_task_and_resolve_invalid_id() {
        let h = harness();
        let result = h
            .orchestrator
            .convert(fixtures::request("a.rtf", "rtf", "txt"))
            .await
            .unwrap();

        let removed = h
            .orchestrator
            .delete_task(&result.task_id.to_string())
            .await
            .unwrap();
        assert_eq!(removed, result.output_path);

        assert!(!h.orchestrator.is_ready("../../etc/passwd").await);
        assert!(matches!(
            h.orchestrator.resolve("not-a-task").await,
            Err(ConverterError::ArtifactNotFound { .. })
        ));
    }

    /// Writes `name` into the staging directory and returns its path.
    fn staged(h: &Harness, name: &str, content: &str) -> PathBuf {
        let dir = h.orchestrator.config().staging_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn inline_dirs(h: &Harness) -> usize {
        std::fs::read_dir(h.orchestrator.config().staging_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(INLINE_DIR_PREFIX))
            .count()
    }

    #[tokio::test]
    async fn test_convert_inline_reads_and_removes_output() {
        let h = harness();
        h.converter
            .set_output_content("<html><body>inline</body></html>")
            .await;
        let source = staged(&h, "scan.pdf", "%PDF-1.4");

        let html = h.orchestrator.convert_inline(&source).await.unwrap();

        assert!(html.contains("inline"));
        assert!(source.exists());
        assert_eq!(inline_dirs(&h), 0);

        let jobs = h.converter.recorded_conversions().await;
        assert_eq!(jobs[0].job.output_format, "html");
        assert_ne!(jobs[0].job.output_dir, h.orchestrator.config().staging_dir());
    }

    #[tokio::test]
    async fn test_convert_inline_keeps_sibling_html() {
        let h = harness();
        let source = staged(&h, "notes.txt", "text");
        let sibling = staged(&h, "notes.html", "hand written page");

        let html = h.orchestrator.convert_inline(&source).await.unwrap();

        assert!(html.contains("converted"));
        assert_eq!(std::fs::read_to_string(&sibling).unwrap(), "hand written page");
        assert_eq!(inline_dirs(&h), 0);
    }

    #[tokio::test]
    async fn test_convert_inline_failure_removes_private_dir() {
        let h = harness();
        h.converter
            .set_next_error(ConverterError::Timeout { timeout_secs: 1 })
            .await;
        let source = staged(&h, "slow.doc", "text");

        let err = h.orchestrator.convert_inline(&source).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(inline_dirs(&h), 0);
    }

    #[tokio::test]
    async fn test_convert_inline_refuses_paths_outside_staging() {
        let h = harness();
        staged(&h, "inside.pdf", "%PDF-1.4");
        let outside_dir = h.temp.path().join("elsewhere");
        std::fs::create_dir_all(&outside_dir).unwrap();
        let outside = outside_dir.join("report.pdf");
        std::fs::write(&outside, "%PDF-1.4").unwrap();
        let sibling = outside_dir.join("report.html");
        std::fs::write(&sibling, "keep").unwrap();

        let err = h.orchestrator.convert_inline(&outside).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StagingFailed);

        let escaped = h
            .orchestrator
            .config()
            .staging_dir()
            .join("../../elsewhere/report.pdf");
        let err = h.orchestrator.convert_inline(&escaped).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StagingFailed);

        assert_eq!(h.converter.conversion_count().await, 0);
        assert_eq!(std::fs::read_to_string(&sibling).unwrap(), "keep");
    }

    #[tokio::test]
    async fn test_convert_inline_rejects_unsupported() {
        let h = harness();
        let slides = staged(&h, "deck.pptx", "x");
        let dir = h.orchestrator.config().staging_dir();

        assert!(matches!(
            h.orchestrator.convert_inline(&slides).await,
            Err(ConverterError::UnsupportedOutput { .. })
        ));
        assert!(matches!(
            h.orchestrator.convert_inline(&dir.join("tool.exe")).await,
            Err(ConverterError::UnsupportedInput { .. })
        ));
        assert!(matches!(
            h.orchestrator.convert_inline(&dir.join("missing.pdf")).await,
            Err(ConverterError::StagingFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_same_format_staged_in_output_dir_keeps_artifact() {
        let h = harness_with(|config| {
            let output_dir = config.output_dir.clone();
            config.with_staging_dir(output_dir)
        });

        let result = h
            .orchestrator
            .convert(fixtures::request("scan.pdf", "pdf", "pdf"))
            .await
            .unwrap();

        assert!(result.output_path.exists());
        assert!(h.orchestrator.is_ready(&result.task_id.to_string()).await);
    }
}
