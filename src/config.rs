use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::services::forecast_engine::DEFAULT_MAX_ITERATIONS;
use crate::services::monte_carlo::DEFAULT_ITERATIONS;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("iterations ({iterations}) must be between 1 and max_iterations ({max_iterations})")]
    InvalidIterations {
        iterations: usize,
        max_iterations: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub iterations: usize,
    pub max_iterations: usize,
    pub scenario_dir: PathBuf,
    pub listen_address: String,
    pub seed: Option<u64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            scenario_dir: PathBuf::from(".forecast/scenarios"),
            listen_address: "127.0.0.1:8080".to_string(),
            seed: None,
        }
    }
}

impl ForecastConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ForecastConfig =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config file when one is given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 || self.iterations > self.max_iterations {
            return Err(ConfigError::InvalidIterations {
                iterations: self.iterations,
                max_iterations: self.max_iterations,
            });
        }
        Ok(())
    }
}
