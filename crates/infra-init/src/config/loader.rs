//! Loader for the YAML documents in the init config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::schema::{BackendCatalog, EnvironmentCatalog, Service};
use crate::error::{InitError, Result};

/// Name of the environment catalog document.
pub const ENVIRONMENTS_FILE: &str = "env.yaml";

/// Default location of the config directory inside the init container.
pub const DEFAULT_CONFIG_DIR: &str = "/conf/init";

/// Reads catalog documents from one config directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads `env.yaml`.
    pub fn load_environments(&self) -> Result<EnvironmentCatalog> {
        let path = self.config_dir.join(ENVIRONMENTS_FILE);
        let document = self.read_yaml(&path)?;
        if document.is_null() {
            return Ok(EnvironmentCatalog::default());
        }

        serde_yaml::from_value(document).map_err(|e| InitError::ConfigurationInvalid {
            path,
            message: e.to_string(),
        })
    }

    /// Loads the resource catalog for `service`.
    pub fn load_catalog(&self, service: Service) -> Result<BackendCatalog> {
        let path = self.config_dir.join(service.file_name());
        let document = self.read_yaml(&path)?;
        let catalog = BackendCatalog::from_value(service, document, &path)?;

        log::debug!(
            "Loaded {} {} from {}",
            catalog.resources.len(),
            service.collection_key(),
            path.display()
        );
        Ok(catalog)
    }

    fn read_yaml(&self, path: &Path) -> Result<Value> {
        if !path.exists() {
            return Err(InitError::ConfigurationMissing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| InitError::ConfigurationRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_yaml::from_str(&content).map_err(|e| InitError::ConfigurationInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}
