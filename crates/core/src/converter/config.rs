//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Configuration for the engine-backed converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the engine binary. A bare name is resolved through `PATH`.
    #[serde(default = "default_engine_path")]
    pub engine_path: PathBuf,

    /// Directory that receives converted artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory where fetched sources are staged. Defaults to `<output_dir>/staging`.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Root under which per-invocation profile directories are created.
    #[serde(default = "default_temp_root")]
    pub temp_root: PathBuf,

    /// First port the allocator may hand out.
    #[serde(default = "default_port_range_start")]
    pub port_range_start: u16,

    /// Last port the allocator may hand out (inclusive).
    #[serde(default = "default_port_range_end")]
    pub port_range_end: u16,

    /// How many candidate ports to sample before giving up.
    #[serde(default = "default_max_allocation_attempts")]
    pub max_allocation_attempts: u32,

    /// Timeout for a single engine run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Keep staged source files after conversion.
    #[serde(default)]
    pub preserve_sources: bool,

    /// Timeout for fetching remote sources in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

fn default_engine_path() -> PathBuf {
    PathBuf::from("soffice")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("alternates")
}

fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
}

fn default_port_range_start() -> u16 {
    8100
}

fn default_port_range_end() -> u16 {
    8999
}

fn default_max_allocation_attempts() -> u32 {
    64
}

fn default_timeout() -> u64 {
    300
}

fn default_fetch_timeout() -> u64 {
    60
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            engine_path: default_engine_path(),
            output_dir: default_output_dir(),
            staging_dir: None,
            temp_root: default_temp_root(),
            port_range_start: default_port_range_start(),
            port_range_end: default_port_range_end(),
            max_allocation_attempts: default_max_allocation_attempts(),
            timeout_secs: default_timeout(),
            preserve_sources: false,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl ConverterConfig {
    /// Creates a config with a custom engine path.
    pub fn with_engine_path(engine_path: impl Into<PathBuf>) -> Self {
        Self {
            engine_path: engine_path.into(),
            ..Default::default()
        }
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the staging directory.
    pub fn with_staging_dir(mut self, staging_dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(staging_dir.into());
        self
    }

    /// Sets the root for per-invocation profile directories.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    /// Sets the engine port range.
    pub fn with_port_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.port_range_start = *range.start();
        self.port_range_end = *range.end();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Keeps staged sources after conversion.
    pub fn with_preserve_sources(mut self, preserve: bool) -> Self {
        self.preserve_sources = preserve;
        self
    }

    /// Ports the allocator samples from.
    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_range_start..=self.port_range_end
    }

    /// Effective staging directory.
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("staging"))
    }
}
