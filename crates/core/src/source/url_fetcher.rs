//! Fetcher for `http(s)://` URLs, `file://` URLs and local paths.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::traits::SourceFetcher;
use crate::converter::{ConverterConfig, ConverterError};

/// Where a source location points.
#[derive(Debug, PartialEq, Eq)]
enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    fn parse(location: &str) -> Result<Self, ConverterError> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Location::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Location::Local)
                .map_err(|_| ConverterError::staging_failed(format!("invalid file URL {}", location))),
            // Single-letter schemes are Windows drive letters, not URLs.
            Ok(url) if url.scheme().len() > 1 => Err(ConverterError::staging_failed(format!(
                "unsupported scheme '{}'",
                url.scheme()
            ))),
            _ => Ok(Location::Local(PathBuf::from(location))),
        }
    }
}

/// Default [`SourceFetcher`]: downloads over HTTP or copies from disk.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: Client,
}

impl UrlFetcher {
    /// Creates a fetcher whose HTTP requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Failed to configure HTTP client, using defaults: {}", e);
            Client::new()
        });
        Self { client }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(Duration::from_secs(config.fetch_timeout_secs))
    }

    async fn download(&self, url: Url, destination: &Path) -> Result<u64, ConverterError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ConverterError::staging_failed(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ConverterError::staging_failed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| write_failed(destination, e))?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ConverterError::staging_failed(format!("reading {} failed: {}", url, e)))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| write_failed(destination, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| write_failed(destination, e))?;

        Ok(written)
    }

    async fn copy(&self, source: &Path, destination: &Path) -> Result<u64, ConverterError> {
        tokio::fs::copy(source, destination).await.map_err(|e| {
            ConverterError::staging_failed(format!("cannot copy {}: {}", source.display(), e))
        })
    }
}

impl Default for UrlFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

fn write_failed(path: &Path, error: std::io::Error) -> ConverterError {
    ConverterError::staging_failed(format!("cannot write {}: {}", path.display(), error))
}

#[async_trait]
impl SourceFetcher for UrlFetcher {
    fn name(&self) -> &str {
        "url"
    }

    async fn fetch(&self, location: &str, destination: &Path) -> Result<u64, ConverterError> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_failed(parent, e))?;
        }

        let bytes = match Location::parse(location)? {
            Location::Remote(url) => self.download(url, destination).await?,
            Location::Local(path) => self.copy(&path, destination).await?,
        };

        debug!("Staged {} bytes from {} to {}", bytes, location, destination.display());
        Ok(bytes)
    }
}
