//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the converter and source
//! traits, plus a scripted stand-in for the office engine, so conversions can
//! be exercised without LibreOffice or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use docbridge_core::testing::{MockConverter, MockFetcher};
//!
//! let converter = MockConverter::new();
//! let fetcher = MockFetcher::new();
//!
//! // Configure mock responses
//! fetcher.set_content("https://example.com/a.docx", b"hello".to_vec()).await;
//! converter.set_next_error(ConverterError::Timeout { timeout_secs: 1 }).await;
//! ```

#[cfg(unix)]
pub mod fake_engine;
mod mock_converter;
mod mock_fetcher;

pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::orchestrator::ConversionRequest;

    /// Create a conversion request with a remote-looking source location.
    pub fn request(file_name: &str, input_extension: &str, output_format: &str) -> ConversionRequest {
        ConversionRequest::new(
            format!("https://files.example.com/{}", file_name),
            file_name,
            input_extension,
            output_format,
        )
    }

    /// Create a request for a Word document converted to PDF.
    pub fn docx_to_pdf(file_name: &str) -> ConversionRequest {
        request(file_name, "docx", "pdf")
    }
}
