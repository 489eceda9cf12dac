//! Keyed access to ingested configuration modules

use crate::domain::{ModuleRecord, ResourceSet};
use serde_json::Value;
use std::collections::HashMap;

/// Lookup of named configuration modules
pub trait ModuleStore {
    /// The module registered under `name`, if any
    fn get_module(&self, name: &str) -> Option<&ModuleRecord>;

    /// A single key of a named module
    fn module_lookup(&self, name: &str, key: &str) -> Option<&Value> {
        self.get_module(name).and_then(|module| module.get(key))
    }
}

/// Module store backed by a hash map; the first module ingested under a name wins
#[derive(Debug, Clone, Default)]
pub struct InMemoryModuleStore {
    modules: HashMap<String, ModuleRecord>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_resources(resources: &ResourceSet) -> Self {
        let mut store = Self::new();
        for module in resources.modules() {
            store.insert(module.clone());
        }
        store
    }

    /// Insert a module; returns false if the name is already taken
    pub fn insert(&mut self, module: ModuleRecord) -> bool {
        let name = module.name.to_string();

        if let Some(existing) = self.modules.get(&name) {
            tracing::warn!(
                module = %name,
                kept = %existing.location,
                ignored = %module.location,
                "Duplicate module ignored"
            );
            return false;
        }

        self.modules.insert(name, module);
        true
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleStore for InMemoryModuleStore {
    fn get_module(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)
    }
}
