//! Trait definitions for the source module.

use async_trait::async_trait;
use std::path::Path;

use crate::converter::ConverterError;

/// Retrieves source content and persists it locally.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Copies the content at `location` into `destination`.
    ///
    /// Returns the number of bytes written. Any failure is reported as
    /// [`ConverterError::StagingFailed`]; an empty result is not an error here.
    async fn fetch(&self, location: &str, destination: &Path) -> Result<u64, ConverterError>;
}
