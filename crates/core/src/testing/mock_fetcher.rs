//! Mock source fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::ConverterError;
use crate::source::SourceFetcher;

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub location: String,
    pub destination: PathBuf,
}

/// Mock implementation of the SourceFetcher trait.
///
/// Serves pre-configured content per location, falling back to a default
/// payload, and records every fetch.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    /// Content by location.
    contents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Content for locations without an explicit entry.
    default_content: Arc<RwLock<Vec<u8>>>,
    /// Recorded fetches.
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self {
            contents: Arc::new(RwLock::new(HashMap::new())),
            default_content: Arc::new(RwLock::new(b"mock document".to_vec())),
            fetches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the content served for a location.
    pub async fn set_content(&self, location: impl Into<String>, content: Vec<u8>) {
        self.contents.write().await.insert(location.into(), content);
    }

    /// Set the content served for unknown locations.
    pub async fn set_default_content(&self, content: Vec<u8>) {
        *self.default_content.write().await = content;
    }

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded fetches.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }

    /// Get the number of fetches performed.
    pub async fn fetch_count(&self) -> usize {
        self.fetches.read().await.len()
    }
}

#[async_trait]
impl SourceFetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, location: &str, destination: &Path) -> Result<u64, ConverterError> {
        self.fetches.write().await.push(RecordedFetch {
            location: location.to_string(),
            destination: destination.to_path_buf(),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let content = match self.contents.read().await.get(location) {
            Some(content) => content.clone(),
            None => self.default_content.read().await.clone(),
        };

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &content).await?;
        Ok(content.len() as u64)
    }
}
