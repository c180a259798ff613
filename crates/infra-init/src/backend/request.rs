//! Translation of effective settings into a backend create request.

use std::collections::BTreeMap;

use serde_yaml::Value;
use thiserror::Error;

use crate::config::EffectiveSettings;

pub const PARTITIONS_KEY: &str = "partitions";
pub const REPLICATION_KEY: &str = "replication";
pub const CONFIG_KEY: &str = "config";

const DEFAULT_PARTITIONS: u32 = 1;
const DEFAULT_REPLICATION: u32 = 1;

/// Settings that cannot be turned into a create request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct InvalidSettings(pub String);

/// Everything a backend needs to create one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub name: String,
    /// Partition (or shard) count.
    pub partitions: u32,
    /// Replication (or durability) factor.
    pub replication: u32,
    /// Backend configuration, already string-typed.
    pub config: BTreeMap<String, String>,
}

impl ResourceRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: DEFAULT_PARTITIONS,
            replication: DEFAULT_REPLICATION,
            config: BTreeMap::new(),
        }
    }

    /// Extracts structural parameters and the config map from `settings`.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &EffectiveSettings,
    ) -> Result<Self, InvalidSettings> {
        let partitions = positive_u32(settings, PARTITIONS_KEY, DEFAULT_PARTITIONS)?;
        let replication = positive_u32(settings, REPLICATION_KEY, DEFAULT_REPLICATION)?;

        let config = match settings.get(CONFIG_KEY) {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Mapping(map)) => map
                .iter()
                .map(|(k, v)| (stringify_value(k), stringify_value(v)))
                .collect(),
            Some(_) => {
                return Err(InvalidSettings(format!(
                    "'{}' must be a mapping of key-value pairs",
                    CONFIG_KEY
                )))
            }
        };

        Ok(Self {
            name: name.into(),
            partitions,
            replication,
            config,
        })
    }
}

fn positive_u32(
    settings: &EffectiveSettings,
    key: &str,
    default: u32,
) -> Result<u32, InvalidSettings> {
    match settings.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n
            .as_u64()
            .filter(|v| *v > 0)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                InvalidSettings(format!("'{}' must be a positive integer, got {}", key, n))
            }),
        Some(other) => Err(InvalidSettings(format!(
            "'{}' must be a positive integer, got '{}'",
            key,
            stringify_value(other)
        ))),
    }
}

/// String form of a settings value, as submitted to string-typed config APIs.
///
/// Scalars use their plain representation, null becomes the empty string,
/// sequences and mappings become compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(_) | Value::Mapping(_) => serde_json::to_string(value)
            .unwrap_or_else(|_| {
                serde_yaml::to_string(value)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default()
            }),
        Value::Tagged(tagged) => stringify_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Mapping;

    fn settings(yaml: &str) -> EffectiveSettings {
        EffectiveSettings::from(serde_yaml::from_str::<Mapping>(yaml).unwrap())
    }

    #[test]
    fn test_numeric_config_value_becomes_string() {
        let request =
            ResourceRequest::from_settings("orders", &settings("{config: {min.insync.replicas: 6}}"))
                .unwrap();
        assert_eq!(request.config.get("min.insync.replicas"), Some(&"6".to_string()));
    }

    #[test]
    fn test_scalar_stringification() {
        let request = ResourceRequest::from_settings(
            "orders",
            &settings(
                "{config: {retention.ms: 604800000, compact: true, policy: delete, ratio: 0.5, empty: null}}",
            ),
        )
        .unwrap();

        assert_eq!(request.config["retention.ms"], "604800000");
        assert_eq!(request.config["compact"], "true");
        assert_eq!(request.config["policy"], "delete");
        assert_eq!(request.config["ratio"], "0.5");
        assert_eq!(request.config["empty"], "");
    }

    #[test]
    fn test_nested_values_become_json() {
        assert_eq!(
            stringify_value(&serde_yaml::from_str("[a, 1]").unwrap()),
            r#"["a",1]"#
        );
        assert_eq!(
            stringify_value(&serde_yaml::from_str("{k: v}").unwrap()),
            r#"{"k":"v"}"#
        );
    }

    #[test]
    fn test_structural_defaults() {
        let request = ResourceRequest::from_settings("orders", &EffectiveSettings::default()).unwrap();
        assert_eq!(request, ResourceRequest::new("orders"));
        assert_eq!(request.partitions, 1);
        assert_eq!(request.replication, 1);
        assert!(request.config.is_empty());
    }

    #[test]
    fn test_structural_values() {
        let request =
            ResourceRequest::from_settings("orders", &settings("{partitions: 6, replication: 3}"))
                .unwrap();
        assert_eq!(request.partitions, 6);
        assert_eq!(request.replication, 3);
    }

    #[test]
    fn test_invalid_structural_values() {
        for yaml in [
            "{partitions: 0}",
            "{partitions: -2}",
            "{partitions: 1.5}",
            "{replication: three}",
            "{config: [a, b]}",
        ] {
            assert!(
                ResourceRequest::from_settings("orders", &settings(yaml)).is_err(),
                "expected {} to be rejected",
                yaml
            );
        }
    }
}
