//! Converter module for turning documents into other formats.
//!
//! Conversion is delegated to a headless office engine run as a subprocess. This
//! module decides what to run and runs it:
//!
//! - [`Capabilities`]: which output formats each input extension may produce
//! - [`ResolvedFilters`]: export/import filter tokens for an (input, output) pair
//! - [`InstanceAllocator`]: a private profile directory and accept port per run
//! - [`EngineCommand`]: the engine argument vector
//! - [`ProcessRunner`]: spawn, drain output, wait, release the instance
//! - [`SofficeConverter`]: the [`Converter`] tying them together
//!
//! # Example
//!
//! ```ignore
//! use docbridge_core::converter::{ConversionJob, Converter, ConverterConfig, SofficeConverter};
//!
//! let converter = SofficeConverter::new(ConverterConfig::default());
//! converter.validate().await?;
//!
//! let job = ConversionJob::new("job-1", "/srv/in/report.docx", "docx", "pdf", "alternates");
//! let converted = converter.convert(job).await?;
//! println!("Wrote {}", converted.output_path.display());
//! ```

mod capabilities;
mod command;
mod config;
mod error;
mod filters;
mod instance;
mod runner;
mod soffice;
mod traits;
mod types;

pub use capabilities::{normalize_extension, Capabilities};
pub use command::{shell_quote, CommandSpec, EngineCommand};
pub use config::ConverterConfig;
pub use error::{ConversionErrors, ConverterError, ErrorKind};
pub use filters::{export_filter, import_filter, FilterEntry, ResolvedFilters};
pub use instance::{EngineInstance, EngineInvocationContext, InstanceAllocator, PROFILE_DIR_PREFIX};
pub use runner::{ProcessOutput, ProcessRunner};
pub use soffice::SofficeConverter;
pub use traits::Converter;
pub use types::{engine_output_path, ConversionJob, ConvertedFile};
