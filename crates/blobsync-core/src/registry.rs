//! Run-scoped mapping from staged local outputs back to their remote URIs

use crate::uri::ObjectUri;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Local path to remote URI table, namespaced per job
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    scopes: HashMap<String, HashMap<PathBuf, ObjectUri>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate a local path with a remote URI; the last write wins
    pub fn record(&mut self, scope: &str, local_path: impl Into<PathBuf>, uri: ObjectUri) {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .insert(local_path.into(), uri);
    }

    pub fn lookup(&self, scope: &str, local_path: &Path) -> Option<&ObjectUri> {
        self.scopes.get(scope)?.get(local_path)
    }

    /// Remove and return a mapping, consuming it
    pub fn take(&mut self, scope: &str, local_path: &Path) -> Option<ObjectUri> {
        let entries = self.scopes.get_mut(scope)?;
        let uri = entries.remove(local_path);
        if entries.is_empty() {
            self.scopes.remove(scope);
        }
        uri
    }

    /// Drop every mapping recorded under a scope
    pub fn clear_scope(&mut self, scope: &str) {
        self.scopes.remove(scope);
    }

    /// Total number of mappings across all scopes
    pub fn len(&self) -> usize {
        self.scopes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// State owned by one pipeline run and passed explicitly to the hooks
///
/// One context per run; dropping it discards everything recorded.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    run_id: String,
    mappings: MappingRegistry,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            mappings: MappingRegistry::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn mappings(&self) -> &MappingRegistry {
        &self.mappings
    }

    pub fn mappings_mut(&mut self) -> &mut MappingRegistry {
        &mut self.mappings
    }
}
