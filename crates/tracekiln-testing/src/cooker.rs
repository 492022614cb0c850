//! A source cooker that journals everything done to it.

use crate::journal::Journal;
use crate::record::TestRecord;
use std::collections::BTreeSet;
use tracekiln_sdk::{
    CancellationToken, CookerDescriptor, CookerPath, DependencyType, OutputSet, ProcessingResult,
    ProductionStrategy, RecordContext, RequiredKeys, SourceDataCooker,
};

/// A cooker that appends `cook <id> <record>` / `end <id>` events to a
/// shared [`Journal`] and exposes the cooked record ids under the
/// `cooked` output.
pub struct RecordingCooker {
    descriptor: CookerDescriptor<String>,
    journal: Journal,
    corrupt_keys: BTreeSet<String>,
    cooked: Vec<u64>,
}

impl RecordingCooker {
    /// Create a cooker consuming all keys with `AsCooked` production.
    pub fn new(path: CookerPath, journal: Journal) -> Self {
        Self {
            descriptor: CookerDescriptor::new(path)
                .with_required_keys(RequiredKeys::All)
                .with_output("cooked"),
            journal,
            corrupt_keys: BTreeSet::new(),
            cooked: Vec::new(),
        }
    }

    /// Restrict the keys the cooker consumes.
    pub fn with_required_keys(mut self, keys: RequiredKeys<String>) -> Self {
        self.descriptor = self.descriptor.with_required_keys(keys);
        self
    }

    /// Set the production strategy.
    pub fn with_production_strategy(mut self, strategy: ProductionStrategy) -> Self {
        self.descriptor = self.descriptor.with_production_strategy(strategy);
        self
    }

    /// Declare a dependency on another cooker.
    pub fn with_dependency(mut self, on: CookerPath, dependency_type: DependencyType) -> Self {
        self.descriptor = self.descriptor.with_dependency(on, dependency_type);
        self
    }

    /// Flag records with this key as corrupt.
    pub fn with_corrupt_key(mut self, key: impl Into<String>) -> Self {
        self.corrupt_keys.insert(key.into());
        self
    }

    fn label(&self) -> &str {
        self.descriptor.path().cooker_id()
    }
}

impl SourceDataCooker<TestRecord> for RecordingCooker {
    fn descriptor(&self) -> &CookerDescriptor<String> {
        &self.descriptor
    }

    fn cook(
        &mut self,
        record: &TestRecord,
        _context: &RecordContext,
        _cancel: &CancellationToken,
    ) -> ProcessingResult {
        self.journal
            .push(format!("cook {} {}", self.label(), record.id));
        if self.corrupt_keys.contains(&record.key) {
            return ProcessingResult::CorruptData;
        }
        self.cooked.push(record.id);
        ProcessingResult::Processed
    }

    fn end_of_pass(&mut self, _cancel: &CancellationToken) {
        self.journal.push(format!("end {}", self.label()));
    }

    fn outputs(&self) -> OutputSet {
        let mut outputs = OutputSet::new();
        outputs.insert("cooked", self.cooked.clone());
        outputs
    }
}
