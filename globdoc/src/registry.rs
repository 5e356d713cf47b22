use crate::errors::{MappingError, Result};
use crate::types::EntityType;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Name-indexed set of entity types known to a process.
///
/// Types are registered once at schema-definition time; lookups hand out the shared
/// `Arc` so every entity built from a looked-up type groups with the others.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, Arc<EntityType>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity_type`, replacing any type previously registered under its name.
    pub fn register(&self, entity_type: &Arc<EntityType>) {
        self.types
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity_type.name().to_string(), Arc::clone(entity_type));
    }

    pub fn find(&self, name: &str) -> Option<Arc<EntityType>> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Like [`TypeRegistry::find`], but an unknown name is a [`MappingError::MissingType`].
    pub fn require(&self, name: &str) -> Result<Arc<EntityType>> {
        self.find(name).ok_or_else(|| MappingError::MissingType { name: name.to_string() })
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
