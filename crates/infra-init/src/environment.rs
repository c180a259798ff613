//! Environment gate: a run may only target a declared environment.

use crate::config::EnvironmentCatalog;
use crate::error::{InitError, Result};

/// Pure membership test against the environment catalog.
pub fn is_valid_environment(environment: &str, catalog: &EnvironmentCatalog) -> bool {
    catalog.contains(environment)
}

/// Like [`is_valid_environment`], but returns the fatal error to abort with.
pub fn validate_environment(environment: &str, catalog: &EnvironmentCatalog) -> Result<()> {
    if is_valid_environment(environment, catalog) {
        Ok(())
    } else {
        Err(InitError::InvalidEnvironment {
            environment: environment.to_string(),
            known: catalog.environments().to_vec(),
        })
    }
}
