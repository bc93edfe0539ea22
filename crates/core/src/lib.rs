pub mod artifact;
pub mod config;
pub mod converter;
pub mod metrics;
pub mod orchestrator;
pub mod source;
pub mod testing;

pub use artifact::{ArtifactStore, TaskId};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, ServerConfig,
};
pub use converter::{
    Capabilities, ConversionErrors, Converter, ConverterConfig, ConverterError, ErrorKind,
    SofficeConverter,
};
pub use orchestrator::{
    ConversionOrchestrator, ConversionRequest, ConversionResponse, ConversionResult,
    ResolvedArtifact, ResponseStatus,
};
pub use source::{SourceFetcher, UrlFetcher};
