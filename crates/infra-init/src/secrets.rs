//! Backend credential resolution.
//!
//! Sources in priority order:
//!
//! 1. **Direct value** - e.g. `COUCHBASE_PASSWORD`
//! 2. **File reference** - Docker/Kubernetes secret mounts, e.g. `COUCHBASE_PASSWORD_FILE`

use secrecy::SecretString;
use std::fs;

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need a direct value or a file path)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves a secret from a direct value, falling back to a file.
///
/// Empty values count as absent. File contents are trimmed so trailing
/// newlines from secret mounts are dropped.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
) -> Result<SecretString, SecretError> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        return fs::read_to_string(path)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|e| SecretError::FileReadError {
                path: path.to_string(),
                source: e,
            });
    }

    Err(SecretError::NoSourceProvided)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_direct_value_wins() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();

        let secret = resolve_secret(Some("direct"), file.path().to_str()).unwrap();
        assert_eq!(secret.expose_secret(), "direct");
    }

    #[test]
    fn test_file_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  from-file  ").unwrap();

        let secret = resolve_secret(Some(""), file.path().to_str()).unwrap();
        assert_eq!(secret.expose_secret(), "from-file");
    }

    #[test]
    fn test_missing_file() {
        let err = resolve_secret(None, Some("/nonexistent/secret")).unwrap_err();
        assert!(matches!(err, SecretError::FileReadError { .. }));
    }

    #[test]
    fn test_no_source() {
        assert!(matches!(
            resolve_secret(None, None),
            Err(SecretError::NoSourceProvided)
        ));
    }
}
