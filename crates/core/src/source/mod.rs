//! Staging of source documents onto local storage.
//!
//! A [`SourceFetcher`] copies a document from wherever the caller says it lives
//! (an `http(s)` URL, a `file://` URL or a plain path) to a local file the
//! engine can read.

mod traits;
mod url_fetcher;

pub use traits::SourceFetcher;
pub use url_fetcher::UrlFetcher;
