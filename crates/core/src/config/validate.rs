use std::path::{Component, Path, PathBuf};

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Engine path is not empty
/// - Engine port range is non-empty and does not include port 0
/// - Engine and fetch timeouts are positive
/// - Staging directory is not the output directory
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Converter validation
    let converter = &config.converter;
    if converter.engine_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.engine_path cannot be empty".to_string(),
        ));
    }
    if converter.port_range_start == 0 {
        return Err(ConfigError::ValidationError(
            "converter.port_range_start cannot be 0".to_string(),
        ));
    }
    if converter.port_range_start > converter.port_range_end {
        return Err(ConfigError::ValidationError(format!(
            "converter.port_range_start ({}) is greater than converter.port_range_end ({})",
            converter.port_range_start, converter.port_range_end
        )));
    }
    if converter.max_allocation_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "converter.max_allocation_attempts cannot be 0".to_string(),
        ));
    }
    if converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs cannot be 0".to_string(),
        ));
    }
    if converter.fetch_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.fetch_timeout_secs cannot be 0".to_string(),
        ));
    }
    if same_dir(&converter.staging_dir(), &converter.output_dir) {
        return Err(ConfigError::ValidationError(format!(
            "converter.staging_dir cannot be the output directory ({})",
            converter.output_dir.display()
        )));
    }

    Ok(())
}

/// Compares two directories after dropping `.` components and trailing slashes.
fn same_dir(a: &Path, b: &Path) -> bool {
    let normalize = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    normalize(a) == normalize(b)
}
