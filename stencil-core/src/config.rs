//! Engine configuration.
//!
//! Loaded once from `<root>/stencil.yaml` and handed to the resolver and
//! reconciler at construction time. A missing file yields the defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "stencil.yaml";
pub const DEFAULT_GROUP_VERSION: &str = "stencil.dev/v1";
pub const DEFAULT_PARAMS_KIND: &str = "ObjectTemplateParams";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// API group/version of the template and parameter resources.
    pub group_version: String,
    /// Kind used in owner references pointing at parameter records.
    pub params_kind: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_version: DEFAULT_GROUP_VERSION.to_owned(),
            params_kind: DEFAULT_PARAMS_KIND.to_owned(),
        }
    }
}

/// `<root>/stencil.yaml`: pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Load the engine config under `root`, falling back to defaults when absent.
pub fn load_at(root: &Path) -> Result<EngineConfig, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let root = TempDir::new().unwrap();
        let config = load_at(root.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.group_version, "stencil.dev/v1");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let root = TempDir::new().unwrap();
        std::fs::write(config_path_at(root.path()), "groupVersion: template.example.com/v1\n").unwrap();
        let config = load_at(root.path()).unwrap();
        assert_eq!(config.group_version, "template.example.com/v1");
        assert_eq!(config.params_kind, DEFAULT_PARAMS_KIND);
    }

    #[test]
    fn malformed_file_reports_path() {
        let root = TempDir::new().unwrap();
        std::fs::write(config_path_at(root.path()), "groupVersion: [unclosed").unwrap();
        let err = load_at(root.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("stencil.yaml"));
    }
}
