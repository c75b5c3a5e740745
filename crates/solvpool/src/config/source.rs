use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PoolError, Result};

use super::pool_config::PoolConfig;

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default
    Default,
    /// From a configuration file
    File(PathBuf),
    /// From an environment variable
    Environment(String),
    /// Programmatically set
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> String {
        match self {
            ConfigSource::Default => "default".to_string(),
            ConfigSource::File(path) => path.display().to_string(),
            ConfigSource::Environment(var) => var.clone(),
            ConfigSource::Command => "command".to_string(),
        }
    }
}

/// Loads configuration files and environment overrides
#[derive(Debug)]
pub struct ConfigLoader {
    use_environment: bool,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self { use_environment }
    }

    /// Get a non-empty environment variable, if the environment is consulted at all
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// Environment variable name for a config key: "foo-bar" becomes "SOLVPOOL_FOO_BAR"
    pub fn env_var_name(key: &str) -> String {
        format!("SOLVPOOL_{}", key.replace('-', "_").to_uppercase())
    }

    /// Get a configuration value from its environment variable
    pub fn get_env_config(&self, key: &str) -> Option<String> {
        self.get_env(&Self::env_var_name(key))
    }

    /// Get boolean value from environment variable
    pub fn get_env_bool(&self, key: &str) -> Option<bool> {
        self.get_env_config(key)
            .map(|val| !matches!(val.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
    }

    /// Get a comma separated list from environment variable
    pub fn get_env_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_env_config(key).map(|val| {
            val.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
    }

    /// Load configuration from a JSON file; a missing file yields the defaults
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<PoolConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(PoolConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| PoolError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: PoolConfig = serde_json::from_str(&contents)
            .map_err(|e| PoolError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_as_str() {
        assert_eq!(ConfigSource::Default.as_str(), "default");
        assert_eq!(ConfigSource::Command.as_str(), "command");
        assert_eq!(
            ConfigSource::Environment("SOLVPOOL_DIST_TYPE".to_string()).as_str(),
            "SOLVPOOL_DIST_TYPE"
        );
        assert_eq!(ConfigSource::File(PathBuf::from("/tmp/pool.json")).as_str(), "/tmp/pool.json");
    }

    #[test]
    fn test_config_loader_new() {
        let loader = ConfigLoader::new(true);
        assert!(loader.use_environment);

        let loader = ConfigLoader::new(false);
        assert!(!loader.use_environment);
        assert_eq!(loader.get_env("PATH"), None);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(ConfigLoader::env_var_name("dist-type"), "SOLVPOOL_DIST_TYPE");
        assert_eq!(
            ConfigLoader::env_var_name("add-file-provides-filtered"),
            "SOLVPOOL_ADD_FILE_PROVIDES_FILTERED"
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let loader = ConfigLoader::new(false);
        let config = loader.load_config_file("/nonexistent/solvpool.json").unwrap();
        assert_eq!(config, PoolConfig::default());
    }
}
