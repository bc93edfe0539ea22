//! Converter backed by a headless office engine (`soffice`).

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{error, info};

use super::command::{CommandSpec, EngineCommand};
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::instance::InstanceAllocator;
use super::runner::ProcessRunner;
use super::traits::Converter;
use super::types::{ConversionJob, ConvertedFile};

/// How long `validate` waits for `--version`.
const VERSION_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Engine-backed converter.
///
/// Every conversion runs a fresh engine process with its own profile directory and
/// accept socket, so conversions may run concurrently.
pub struct SofficeConverter {
    config: ConverterConfig,
    allocator: InstanceAllocator,
    runner: ProcessRunner,
}

impl SofficeConverter {
    /// Creates a converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        let allocator = InstanceAllocator::from_config(&config);
        let runner = ProcessRunner::new(Duration::from_secs(config.timeout_secs));
        Self {
            config,
            allocator,
            runner,
        }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// The allocator handing out engine instances.
    pub fn allocator(&self) -> &InstanceAllocator {
        &self.allocator
    }

    /// Runs one conversion under a freshly allocated engine instance.
    async fn run_conversion(&self, job: &ConversionJob) -> Result<ConvertedFile, ConverterError> {
        let start = Instant::now();

        tokio::fs::create_dir_all(&job.output_dir)
            .await
            .map_err(|_| ConverterError::OutputDirectoryFailed {
                path: job.output_dir.clone(),
            })?;

        let instance = self.allocator.allocate()?;
        let command = EngineCommand::build(
            CommandSpec {
                engine_path: &self.config.engine_path,
                input_extension: &job.input_extension,
                output_format: &job.output_format,
                source_path: &job.source_path,
                output_dir: &job.output_dir,
            },
            instance.context(),
        );

        info!(
            "Converting {} ({} -> {}) on engine port {}",
            job.job_id,
            job.input_extension,
            job.output_format,
            instance.port()
        );

        let output = self.runner.run(&command, instance).await?;
        let output = output.into_result().inspect_err(|e| {
            error!(
                "Engine failed for {}: {} stderr='{}'",
                job.job_id,
                e,
                e.stderr_excerpt().unwrap_or_default()
            );
        })?;

        let output_path = job.expected_output_path();
        let meta = tokio::fs::metadata(&output_path).await.map_err(|_| {
            error!(
                "Engine reported success for {} but {} is missing; stdout='{}'",
                job.job_id,
                output_path.display(),
                output.stdout.trim()
            );
            ConverterError::artifact_not_found(output_path.display().to_string())
        })?;

        Ok(ConvertedFile {
            job_id: job.job_id.clone(),
            output_path,
            output_size_bytes: meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            input_extension: job.input_extension.clone(),
            output_format: job.output_format.clone(),
        })
    }
}

#[async_trait]
impl Converter for SofficeConverter {
    fn name(&self) -> &str {
        "soffice"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConvertedFile, ConverterError> {
        self.run_conversion(&job).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let spawn_failed = |reason: String| ConverterError::EngineSpawnFailed {
            path: self.config.engine_path.clone(),
            reason,
        };

        let version = Command::new(&self.config.engine_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(VERSION_CHECK_TIMEOUT, version).await {
            Ok(Ok(output)) => {
                info!(
                    "Engine available: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
            Ok(Err(e)) => return Err(spawn_failed(e.to_string())),
            Err(_) => return Err(spawn_failed("version check timed out".to_string())),
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        tokio::fs::create_dir_all(self.config.staging_dir()).await?;
        tokio::fs::create_dir_all(&self.config.temp_root).await?;

        Ok(())
    }
}
