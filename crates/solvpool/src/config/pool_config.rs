use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use solvpool_evr::DistComparator;

use crate::error::Result;
use crate::ids::{known, Id};
use crate::repodata::StandardLocations;

use super::source::{ConfigLoader, ConfigSource};

/// Distribution family whose conventions the pool follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DistType {
    #[default]
    Rpm,
    Deb,
    Arch,
    Haiku,
}

impl DistType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rpm" => Some(DistType::Rpm),
            "deb" | "debian" => Some(DistType::Deb),
            "arch" => Some(DistType::Arch),
            "haiku" => Some(DistType::Haiku),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DistType::Rpm => "rpm",
            DistType::Deb => "deb",
            DistType::Arch => "arch",
            DistType::Haiku => "haiku",
        }
    }

    /// Architecture id of architecture independent packages
    pub fn noarch(self) -> Id {
        match self {
            DistType::Rpm => known::ARCH_NOARCH,
            DistType::Deb => known::ARCH_ALL,
            DistType::Arch | DistType::Haiku => known::ARCH_ANY,
        }
    }

    /// Version comparator following the distribution's ordering and dependency matching
    pub fn comparator(self, promote_epoch: bool) -> DistComparator {
        let comparator = match self {
            DistType::Deb => DistComparator::debian(),
            DistType::Rpm | DistType::Arch | DistType::Haiku => DistComparator::rpm(),
        };
        comparator.promote_epoch(promote_epoch)
    }
}

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PoolConfig {
    #[serde(default)]
    pub dist_type: DistType,

    /// A missing epoch on the provider side takes the epoch of the dependency
    #[serde(default)]
    pub promote_epoch: bool,

    /// Skip the per-provider declared id index used to speed up version matching
    #[serde(default)]
    pub no_whatprovides_aux: bool,

    /// File provides discovery keeps only standard location paths
    #[serde(default)]
    pub add_file_provides_filtered: bool,

    /// Architectures considered installable; every architecture when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatible_archs: Option<Vec<String>>,

    /// Patterns of standard file locations; the built-in locations when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filelist_filter: Option<Vec<String>>,

    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl PoolConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config for a distribution family
    pub fn for_dist(dist_type: DistType) -> Self {
        Self {
            dist_type,
            ..Self::default()
        }
    }

    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file; a missing file yields the defaults
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = ConfigLoader::new(false).load_config_file(path)?;
        config.mark_sources(ConfigSource::Default);
        if path.exists() {
            config.mark_file_sources(path);
        }
        Ok(config)
    }

    /// Build configuration from defaults, an optional file and the environment
    pub fn build<P: AsRef<Path>>(path: Option<P>, use_environment: bool) -> Result<Self> {
        let loader = ConfigLoader::new(use_environment);

        let mut config = match &path {
            Some(path) => Self::load_file(path)?,
            None => {
                let mut config = Self::default();
                config.mark_sources(ConfigSource::Default);
                config
            }
        };

        if use_environment {
            config.apply_env_overrides(&loader);
        }

        Ok(config)
    }

    /// Get the source of a configuration value
    pub fn get_source(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    /// Compile the configured standard location filter
    pub fn file_filter(&self) -> Result<StandardLocations> {
        match &self.filelist_filter {
            Some(patterns) => StandardLocations::new(patterns),
            None => Ok(StandardLocations::default()),
        }
    }

    fn config_keys() -> [&'static str; 6] {
        [
            "dist-type",
            "promote-epoch",
            "no-whatprovides-aux",
            "add-file-provides-filtered",
            "compatible-archs",
            "filelist-filter",
        ]
    }

    fn mark_sources(&mut self, source: ConfigSource) {
        for key in Self::config_keys() {
            self.sources.insert(key.to_string(), source.clone());
        }
    }

    fn mark_file_sources(&mut self, path: &Path) {
        // a key counts as coming from the file when it differs from the default
        let defaults = Self::default();
        let source = ConfigSource::File(path.to_path_buf());
        let changed = [
            ("dist-type", self.dist_type != defaults.dist_type),
            ("promote-epoch", self.promote_epoch != defaults.promote_epoch),
            ("no-whatprovides-aux", self.no_whatprovides_aux != defaults.no_whatprovides_aux),
            (
                "add-file-provides-filtered",
                self.add_file_provides_filtered != defaults.add_file_provides_filtered,
            ),
            ("compatible-archs", self.compatible_archs.is_some()),
            ("filelist-filter", self.filelist_filter.is_some()),
        ];
        for (key, changed) in changed {
            if changed {
                self.sources.insert(key.to_string(), source.clone());
            }
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self, loader: &ConfigLoader) {
        if let Some(dist) = loader.get_env_config("dist-type") {
            if let Some(dist_type) = DistType::from_str(&dist) {
                self.dist_type = dist_type;
                self.sources.insert(
                    "dist-type".to_string(),
                    ConfigSource::Environment(ConfigLoader::env_var_name("dist-type")),
                );
            } else {
                log::warn!("Ignoring unknown distribution type {:?}", dist);
            }
        }

        if let Some(promote) = loader.get_env_bool("promote-epoch") {
            self.promote_epoch = promote;
            self.sources.insert(
                "promote-epoch".to_string(),
                ConfigSource::Environment(ConfigLoader::env_var_name("promote-epoch")),
            );
        }

        if let Some(no_aux) = loader.get_env_bool("no-whatprovides-aux") {
            self.no_whatprovides_aux = no_aux;
            self.sources.insert(
                "no-whatprovides-aux".to_string(),
                ConfigSource::Environment(ConfigLoader::env_var_name("no-whatprovides-aux")),
            );
        }

        if let Some(filtered) = loader.get_env_bool("add-file-provides-filtered") {
            self.add_file_provides_filtered = filtered;
            self.sources.insert(
                "add-file-provides-filtered".to_string(),
                ConfigSource::Environment(ConfigLoader::env_var_name("add-file-provides-filtered")),
            );
        }

        if let Some(archs) = loader.get_env_list("compatible-archs") {
            self.compatible_archs = Some(archs);
            self.sources.insert(
                "compatible-archs".to_string(),
                ConfigSource::Environment(ConfigLoader::env_var_name("compatible-archs")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solvpool_evr::{EvrCmpMode, EvrComparator};

    #[test]
    fn test_default_config() {
        let config = PoolConfig::default();
        assert_eq!(config.dist_type, DistType::Rpm);
        assert!(!config.promote_epoch);
        assert!(!config.no_whatprovides_aux);
        assert!(!config.add_file_provides_filtered);
        assert!(config.compatible_archs.is_none());
        assert!(config.filelist_filter.is_none());
    }

    #[test]
    fn test_dist_type_from_str() {
        assert_eq!(DistType::from_str("rpm"), Some(DistType::Rpm));
        assert_eq!(DistType::from_str("DEB"), Some(DistType::Deb));
        assert_eq!(DistType::from_str("debian"), Some(DistType::Deb));
        assert_eq!(DistType::from_str("arch"), Some(DistType::Arch));
        assert_eq!(DistType::from_str("haiku"), Some(DistType::Haiku));
        assert_eq!(DistType::from_str("invalid"), None);
    }

    #[test]
    fn test_dist_type_conventions() {
        assert_eq!(DistType::Rpm.noarch(), known::ARCH_NOARCH);
        assert_eq!(DistType::Deb.noarch(), known::ARCH_ALL);
        assert_eq!(DistType::Arch.noarch(), known::ARCH_ANY);
        assert_eq!(DistType::Rpm.comparator(false).dep_mode(), EvrCmpMode::MatchRelease);
        assert_eq!(DistType::Deb.comparator(false).dep_mode(), EvrCmpMode::Compare);
    }

    #[test]
    fn test_from_json() {
        let config = PoolConfig::from_json(
            r#"{"dist-type": "deb", "promote-epoch": true, "compatible-archs": ["amd64", "all"]}"#,
        )
        .unwrap();
        assert_eq!(config.dist_type, DistType::Deb);
        assert!(config.promote_epoch);
        assert_eq!(config.compatible_archs, Some(vec!["amd64".to_string(), "all".to_string()]));

        assert!(PoolConfig::from_json(r#"{"dist-type": "solaris"}"#).is_err());
    }

    #[test]
    fn test_serialize_skips_unset() {
        let json = serde_json::to_string(&PoolConfig::default()).unwrap();
        assert!(json.contains("\"dist-type\":\"rpm\""));
        assert!(!json.contains("compatible-archs"));
    }

    #[test]
    fn test_file_filter() {
        let mut config = PoolConfig::default();
        assert!(config.file_filter().is_ok());
        config.filelist_filter = Some(vec!["[".to_string()]);
        assert!(config.file_filter().is_err());
    }
}
