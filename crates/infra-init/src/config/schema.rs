use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{InitError, Result};

/// A backend the initializer knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Couchbase,
    Redpanda,
}

impl Service {
    /// Run order when several services are requested.
    pub fn all() -> &'static [Service] {
        &[Service::Couchbase, Service::Redpanda]
    }

    /// Name of the catalog document inside the config directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Service::Couchbase => "couchbase.yaml",
            Service::Redpanda => "redpanda.yaml",
        }
    }

    /// Key holding the resource collection inside the catalog document.
    pub fn collection_key(&self) -> &'static str {
        match self {
            Service::Couchbase => "buckets",
            Service::Redpanda => "topics",
        }
    }

    /// Parses a comma-separated service list such as `couchbase,redpanda`.
    ///
    /// Blank entries are skipped. The result is in [`Service::all`] order
    /// with duplicates removed.
    pub fn parse_list(list: &str) -> Result<Vec<Service>> {
        let mut requested = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            requested.push(entry.parse::<Service>()?);
        }

        Ok(Service::all()
            .iter()
            .copied()
            .filter(|s| requested.contains(s))
            .collect())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Couchbase => write!(f, "couchbase"),
            Service::Redpanda => write!(f, "redpanda"),
        }
    }
}

impl FromStr for Service {
    type Err = InitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "couchbase" => Ok(Service::Couchbase),
            "redpanda" => Ok(Service::Redpanda),
            _ => Err(InitError::UnknownService(s.to_string())),
        }
    }
}

/// The set of environments a run may target (`env.yaml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentCatalog {
    #[serde(default, deserialize_with = "nullable")]
    environments: Vec<String>,
}

impl EnvironmentCatalog {
    pub fn new<I, S>(environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            environments: environments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, environment: &str) -> bool {
        self.environments.iter().any(|e| e == environment)
    }

    pub fn environments(&self) -> &[String] {
        &self.environments
    }
}

/// One managed resource and its own settings layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpec {
    #[serde(skip)]
    pub name: String,

    /// Settings specific to this resource.
    #[serde(default, deserialize_with = "nullable")]
    pub defaults: Mapping,

    /// Overrides keyed by environment identifier.
    #[serde(default, deserialize_with = "nullable")]
    pub env_settings: Mapping,
}

impl ResourceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_defaults(mut self, defaults: Mapping) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_env_settings(mut self, environment: &str, settings: Mapping) -> Self {
        self.env_settings
            .insert(Value::from(environment), Value::Mapping(settings));
        self
    }

    /// Overrides for `environment`. A missing or empty entry yields `None`.
    pub fn env_overrides(&self, environment: &str) -> Option<&Mapping> {
        self.env_settings.get(environment).and_then(Value::as_mapping)
    }
}

/// All resources one backend should have, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCatalog {
    pub service: Service,
    /// Backend-wide defaults shared by every resource.
    pub defaults: Mapping,
    pub resources: Vec<ResourceSpec>,
}

impl BackendCatalog {
    pub fn new(service: Service) -> Self {
        Self {
            service,
            defaults: Mapping::new(),
            resources: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Mapping) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_resource(mut self, resource: ResourceSpec) -> Self {
        self.resources.push(resource);
        self
    }

    /// Builds a catalog from an already-parsed document.
    ///
    /// `path` is only used for error messages.
    pub fn from_value(service: Service, document: Value, path: &Path) -> Result<Self> {
        let invalid = |message: String| InitError::ConfigurationInvalid {
            path: path.to_path_buf(),
            message,
        };

        let root = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(m) => m,
            other => {
                return Err(invalid(format!(
                    "expected a mapping at the document root, found {}",
                    value_kind(&other)
                )))
            }
        };

        let defaults = match root.get("defaults") {
            None | Some(Value::Null) => Mapping::new(),
            Some(Value::Mapping(m)) => m.clone(),
            Some(other) => {
                return Err(invalid(format!(
                    "'defaults' must be a mapping, found {}",
                    value_kind(other)
                )))
            }
        };

        let collection = match root.get(service.collection_key()) {
            None | Some(Value::Null) => Mapping::new(),
            Some(Value::Mapping(m)) => m.clone(),
            Some(other) => {
                return Err(invalid(format!(
                    "'{}' must be a mapping, found {}",
                    service.collection_key(),
                    value_kind(other)
                )))
            }
        };

        let mut resources = Vec::with_capacity(collection.len());
        for (key, body) in collection {
            let name = match key {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(invalid(format!(
                        "resource names must be strings, found {}",
                        value_kind(&other)
                    )))
                }
            };

            let mut spec: ResourceSpec = match body {
                Value::Null => ResourceSpec::default(),
                body => serde_yaml::from_value(body)
                    .map_err(|e| invalid(format!("resource '{}': {}", name, e)))?,
            };
            for (environment, overrides) in &spec.env_settings {
                if !matches!(overrides, Value::Mapping(_) | Value::Null) {
                    return Err(invalid(format!(
                        "resource '{}': env_settings for '{}' must be a mapping, found {}",
                        name,
                        stringify_key(environment),
                        value_kind(overrides)
                    )));
                }
            }
            spec.name = name;
            resources.push(spec);
        }

        Ok(Self {
            service,
            defaults,
            resources,
        })
    }
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn stringify_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => value_kind(other).to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
