//! Conversion orchestrator: the public entry point for conversions.
//!
//! A request moves through `Validating -> Staging -> Converting -> Relocating
//! -> Done`; any stage may end it with errors instead:
//! - **Validating**: input extension and output format are checked against the
//!   capability table, collecting every problem before anything touches disk
//! - **Staging**: the source is fetched into the staging directory under a
//!   name derived from the task id
//! - **Converting**: the engine runs against the staged file
//! - **Relocating**: the artifact is moved to `<output_dir>/<task_id>.<format>`

mod runner;
mod types;

pub use runner::ConversionOrchestrator;
pub use types::{
    ConversionRequest, ConversionResponse, ConversionResult, ResolvedArtifact, ResponseData,
    ResponseStatus, Stage,
};
