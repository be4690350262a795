use std::path::Path;

use crate::error::ConfigError;

/// Read the HTTP listen port from a one-line config file.
pub fn load_port(path: &Path) -> Result<u16, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_port(path, &raw)
}

fn parse_port(path: &Path, raw: &str) -> Result<u16, ConfigError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigError::EmptyPort {
            path: path.to_path_buf(),
        });
    }
    value.parse().map_err(|_| ConfigError::InvalidPort {
        value: value.to_string(),
    })
}
