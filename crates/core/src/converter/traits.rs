//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::capabilities::Capabilities;
use super::error::ConverterError;
use super::types::{ConversionJob, ConvertedFile};

/// A converter that turns a local document into another format.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts a staged file according to the job.
    ///
    /// On success the artifact exists at [`ConvertedFile::output_path`].
    async fn convert(&self, job: ConversionJob) -> Result<ConvertedFile, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;

    /// Returns the supported input extensions.
    fn supported_input_formats(&self) -> Vec<&'static str> {
        Capabilities::input_extensions().collect()
    }

    /// Returns the output formats permitted for `input_extension`.
    fn supported_output_formats(&self, input_extension: &str) -> &'static [&'static str] {
        Capabilities::outputs_for(input_extension)
    }
}
