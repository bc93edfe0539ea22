//! Mock converter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConvertedFile, Converter, ConverterError};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Knobs a test can turn between conversions.
#[derive(Debug)]
struct Behavior {
    next_error: Option<ConverterError>,
    delay: Duration,
    output_content: String,
    write_output: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            next_error: None,
            delay: Duration::ZERO,
            output_content: "<html><body>converted</body></html>".to_string(),
            write_output: true,
        }
    }
}

/// Converter double that writes a small artifact where the engine would.
///
/// Every job is recorded. A single failure can be queued with
/// [`MockConverter::set_next_error`].
///
/// ```rust,ignore
/// let converter = MockConverter::new();
/// converter.convert(job).await?;
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConverter {
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    behavior: Arc<RwLock<Behavior>>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Fail the next conversion with `error`.
    pub async fn set_next_error(&self, error: ConverterError) {
        self.behavior.write().await.next_error = Some(error);
    }

    /// Sleep this long inside every conversion.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        self.behavior.write().await.delay = duration;
    }

    pub async fn set_output_content(&self, content: impl Into<String>) {
        self.behavior.write().await.output_content = content.into();
    }

    /// Report success without producing a file, like an engine that silently
    /// skipped the input.
    pub async fn set_write_output(&self, write: bool) {
        self.behavior.write().await.write_output = write;
    }

    async fn record(&self, job: ConversionJob, success: bool) {
        self.conversions
            .write()
            .await
            .push(RecordedConversion { job, success });
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConvertedFile, ConverterError> {
        let (error, delay, content, write_output) = {
            let mut behavior = self.behavior.write().await;
            (
                behavior.next_error.take(),
                behavior.delay,
                behavior.output_content.clone(),
                behavior.write_output,
            )
        };

        if let Some(err) = error {
            self.record(job, false).await;
            return Err(err);
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let output_path = job.expected_output_path();
        if write_output {
            tokio::fs::create_dir_all(&job.output_dir).await?;
            tokio::fs::write(&output_path, content.as_bytes()).await?;
        }
        self.record(job.clone(), true).await;

        Ok(ConvertedFile {
            job_id: job.job_id,
            output_path,
            output_size_bytes: content.len() as u64,
            duration_ms: delay.as_millis() as u64,
            input_extension: job.input_extension,
            output_format: job.output_format,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
