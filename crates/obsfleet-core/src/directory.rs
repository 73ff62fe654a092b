// ── Unit directory ──
//
// The static list of configured units, in configuration order. Read-only
// once built.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::CoreError;
use crate::model::Unit;

/// Ordered, name-keyed set of configured units.
#[derive(Debug, Clone, Default)]
pub struct UnitDirectory {
    units: IndexMap<String, Arc<Unit>>,
}

impl UnitDirectory {
    /// Build the directory, rejecting empty or duplicate names and empty hosts.
    pub fn new(units: impl IntoIterator<Item = Unit>) -> Result<Self, CoreError> {
        let mut map = IndexMap::new();
        for unit in units {
            if unit.name.trim().is_empty() {
                return Err(CoreError::Config {
                    message: "unit name must not be empty".into(),
                });
            }
            if unit.host.trim().is_empty() {
                return Err(CoreError::Config {
                    message: format!("unit {} has no host", unit.name),
                });
            }
            if map.contains_key(&unit.name) {
                return Err(CoreError::Config {
                    message: format!("duplicate unit name: {}", unit.name),
                });
            }
            map.insert(unit.name.clone(), Arc::new(unit));
        }
        Ok(Self { units: map })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Unit>> {
        self.units.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Unit>> {
        self.units.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
