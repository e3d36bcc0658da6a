//! Schema-state cache
//!
//! Values derived from the current schema, keyed by [`SchemaStateKey`].
//! Entries are computed on first request and shared afterwards. A creator
//! may itself read the cache, including other keys. Eviction is
//! up to the owner of the cache, typically by calling
//! [`SchemaStateCache::clear`] after a schema change commits.

use crate::operations::SchemaStateOperations;
use crate::statement::KernelStatement;
use dashmap::DashMap;
use graphkern_core::{LockError, SchemaStateKey, SchemaStateValue};

/// Concurrent schema-state cache
#[derive(Default)]
pub struct SchemaStateCache {
    entries: DashMap<SchemaStateKey, SchemaStateValue>,
}

impl SchemaStateCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached value
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cached values
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for SchemaStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaStateCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl SchemaStateOperations for SchemaStateCache {
    fn schema_state_get_or_create(
        &self,
        _statement: &KernelStatement,
        key: &SchemaStateKey,
        creator: &dyn Fn(&SchemaStateKey) -> SchemaStateValue,
    ) -> Result<SchemaStateValue, LockError> {
        if let Some(existing) = self.entries.get(key) {
            return Ok(existing.value().clone());
        }

        // No shard guard may be held while `creator` runs: it is free to
        // read the cache. If two callers race, the first insert wins.
        let created = creator(key);
        let value = self
            .entries
            .entry(key.clone())
            .or_insert(created)
            .value()
            .clone();
        Ok(value)
    }

    fn schema_state_contains(
        &self,
        _statement: &KernelStatement,
        key: &SchemaStateKey,
    ) -> Result<bool, LockError> {
        Ok(self.entries.contains_key(key))
    }
}
