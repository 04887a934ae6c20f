//! Trace configuration: YAML schema and file loading.
//!
//! Lookup order for [`TraceConfig::discover`]: `$NETTRACE_CONFIG` if set,
//! then `config.yaml` in the platform config directory, then defaults.

pub mod schema;

use std::path::{Path, PathBuf};

pub use schema::{Algorithm, CacheConfig, LimitsConfig, TraceConfig};

use crate::error::{Result, TraceError};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "NETTRACE_CONFIG";

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

impl TraceConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: TraceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&contents).map_err(|e| match e {
            TraceError::Yaml(err) => {
                TraceError::Config(format!("failed to parse {}: {err}", path.display()))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), algorithm = %config.algorithm, "loaded config");
        Ok(config)
    }

    /// Write this config as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Locate and load the user's config, falling back to defaults.
    pub fn discover() -> Result<Self> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&explicit));
        }
        match default_config_dir() {
            Some(dir) => Self::discover_in(&dir),
            None => {
                tracing::debug!("no platform config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Install the logging subscriber with `log_filter` as the fallback
    /// when `RUST_LOG` is unset.
    pub fn init_logging(&self) {
        crate::observability::init_logging_with(&self.log_filter);
    }

    /// Load `config.yaml` from `dir` if it exists, else defaults.
    pub fn discover_in(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            Ok(Self::default())
        }
    }
}

/// Platform config directory for nettrace, e.g. `~/.config/nettrace` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "nettrace").map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_reads_yaml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trace.yaml");
        std::fs::write(&path, "algorithm: all_paths\nlimits:\n  max_paths: 7\n").unwrap();

        let config = TraceConfig::load(&path).unwrap();
        assert_eq!(config.algorithm, Algorithm::AllPaths);
        assert_eq!(config.limits.max_paths, 7);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = TraceConfig::load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, TraceError::Io(_)));
    }

    #[test]
    fn load_malformed_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "limits: [unclosed").unwrap();

        let err = TraceConfig::load(&path).unwrap_err();
        match err {
            TraceError::Config(msg) => assert!(msg.contains("bad.yaml")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("zero.yaml");
        std::fs::write(&path, "limits:\n  max_paths: 0\n").unwrap();
        assert!(matches!(
            TraceConfig::load(&path),
            Err(TraceError::Config(_))
        ));
    }

    #[test]
    fn save_then_discover_in_roundtrips() {
        let dir = TempDir::new().unwrap();
        let config = TraceConfig {
            algorithm: Algorithm::Endpoints,
            ..TraceConfig::default()
        };
        config
            .save(&dir.path().join("nested").join(CONFIG_FILE_NAME))
            .unwrap();

        let back = TraceConfig::discover_in(&dir.path().join("nested")).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn discover_in_empty_dir_gives_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            TraceConfig::discover_in(dir.path()).unwrap(),
            TraceConfig::default()
        );
    }

    #[test]
    fn init_logging_from_config_is_repeatable() {
        let config = TraceConfig::from_yaml_str("log_filter: \"nettrace=debug\"\n").unwrap();
        config.init_logging();
        config.init_logging();
    }
}
