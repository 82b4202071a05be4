//! Match configuration loading for the headless tools.
//!
//! Configurations are RON documents holding a
//! [`MatchConfig`](tactics_core::config::MatchConfig). Missing fields take
//! their defaults:
//!
//! ```ron
//! (
//!     grid_size: 25,
//!     obstacle_percentage: 0.1,
//!     difficulty: Hard,
//!     seed: 42,
//! )
//! ```

use std::path::Path;

use tactics_core::config::MatchConfig;
use tactics_core::error::GameError;
use thiserror::Error;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed, but the values are unusable.
    #[error("Invalid config: {0}")]
    Invalid(#[from] GameError),
}

/// Load and validate a match configuration from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MatchConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config: MatchConfig = ron::from_str(&contents)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), ?config, "Loaded match config");
    Ok(config)
}

/// Config from `path` (or defaults), with an optional seed override.
pub fn resolve_config(path: Option<&Path>, seed: Option<u64>) -> Result<MatchConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => MatchConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_config("definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_resolve_defaults_with_seed() {
        let config = resolve_config(None, Some(9)).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.grid_size, 25);
    }
}
