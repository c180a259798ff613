//! Three-tier settings merge.
//!
//! Precedence, lowest to highest: backend-wide defaults, per-resource defaults,
//! per-environment overrides. The merge is shallow: a value from a later
//! layer replaces the earlier value wholesale, nested mappings included.

use serde_yaml::{Mapping, Value};

/// Flat settings produced for one reconciliation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveSettings(Mapping);

impl EffectiveSettings {
    /// Returns the value for `key`, if any layer set it.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.0
    }
}

impl From<Mapping> for EffectiveSettings {
    fn from(mapping: Mapping) -> Self {
        Self(mapping)
    }
}

/// Merges the three settings layers. Absent layers contribute nothing.
pub fn merge_settings(
    global_defaults: Option<&Mapping>,
    item_defaults: Option<&Mapping>,
    env_settings: Option<&Mapping>,
) -> EffectiveSettings {
    let mut result = Mapping::new();

    for layer in [global_defaults, item_defaults, env_settings]
        .into_iter()
        .flatten()
    {
        for (key, value) in layer {
            result.insert(key.clone(), value.clone());
        }
    }

    EffectiveSettings(result)
}
