//! Append-only registry of discovered extensions.

use crate::error::{Result, RuntimeError};
use crate::reference::{ExtensionId, ExtensionReference};
use std::collections::BTreeMap;
use tracekiln_sdk::{CookerPath, DataProcessorId, TableId};

/// Map from identifier to [`ExtensionReference`] for every discovered
/// source cooker, composite cooker, data processor, and table.
///
/// Registration happens at discovery time, before resolution begins, and
/// is append-only. A duplicate identifier is a discovery-time error
/// reported to the caller.
#[derive(Debug, Default)]
pub struct ExtensionRepository {
    entries: BTreeMap<ExtensionId, ExtensionReference>,
}

impl ExtensionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a discovered extension.
    pub fn register(&mut self, reference: ExtensionReference) -> Result<()> {
        let id = reference.id().clone();
        if self.entries.contains_key(&id) {
            return Err(RuntimeError::DuplicateExtension(id));
        }
        tracing::debug!(extension = %id, kind = id.kind(), "registered extension");
        self.entries.insert(id, reference);
        Ok(())
    }

    /// Look up any extension by identity.
    pub fn get(&self, id: &ExtensionId) -> Option<&ExtensionReference> {
        self.entries.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &ExtensionId) -> Option<&mut ExtensionReference> {
        self.entries.get_mut(id)
    }

    /// Look up a source cooker by path.
    pub fn source_cooker(&self, path: &CookerPath) -> Option<&ExtensionReference> {
        self.entries.get(&ExtensionId::SourceCooker(path.clone()))
    }

    /// Look up a composite cooker by path.
    pub fn composite_cooker(&self, path: &CookerPath) -> Option<&ExtensionReference> {
        self.entries
            .get(&ExtensionId::CompositeCooker(path.clone()))
    }

    /// Look up a data processor by id.
    pub fn processor(&self, id: &DataProcessorId) -> Option<&ExtensionReference> {
        self.entries.get(&ExtensionId::DataProcessor(id.clone()))
    }

    /// Look up a table by id.
    pub fn table(&self, id: &TableId) -> Option<&ExtensionReference> {
        self.entries.get(&ExtensionId::Table(id.clone()))
    }

    /// Iterate over all references in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionReference> {
        self.entries.values()
    }

    /// All registered identifiers, in order.
    pub fn ids(&self) -> Vec<ExtensionId> {
        self.entries.keys().cloned().collect()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut repo = ExtensionRepository::new();
        let path = CookerPath::source("etw", "process");
        repo.register(ExtensionReference::new(ExtensionId::source_cooker(
            path.clone(),
        )))
        .unwrap();

        assert_eq!(repo.len(), 1);
        assert!(repo.source_cooker(&path).is_some());
        assert!(repo.composite_cooker(&path).is_none());
    }

    #[test]
    fn test_duplicate_registration_is_error() {
        let mut repo = ExtensionRepository::new();
        let id = ExtensionId::processor(DataProcessorId::new("symbols"));
        repo.register(ExtensionReference::new(id.clone())).unwrap();

        let err = repo
            .register(ExtensionReference::new(id.clone()))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::DuplicateExtension(dup) if dup == id));
        assert_eq!(repo.len(), 1);
    }
}
