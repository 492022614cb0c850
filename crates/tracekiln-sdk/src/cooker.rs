//! Data cooker contracts.
//!
//! A source data cooker consumes keyed records emitted by one source
//! parser, accumulating state across a parsing pass and exposing named
//! outputs. A composite data cooker has no source dependency at all; it
//! is invoked once after source cooking completes and reads only other
//! cookers' outputs.

use crate::output::{DataRetrieval, OutputSet};
use crate::paths::{CookerPath, DataProcessorId};
use crate::record::{KeyedRecord, ProcessingResult, RecordContext, RequiredKeys};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tokio_util::sync::CancellationToken;

/// When a cooker's output becomes observable relative to a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStrategy {
    /// Output is updated incrementally as each record is cooked.
    AsCooked,
    /// Output is only coherent after the cooker's end-of-pass call.
    EndOfPass,
}

/// A consumer's declared ordering requirement toward one required cooker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Follow the producer's production strategy: behaves as `AsConsumed`
    /// when the producer posts incrementally, as `SamePass` otherwise.
    /// This is the default.
    AlignedWithProducer,
    /// The consumer needs the producer's view of every record before it
    /// sees the same record.
    AsConsumed,
    /// The consumer only reads the producer's accumulated output after
    /// the producer finalizes; both may share a pass.
    SamePass,
}

impl Default for DependencyType {
    fn default() -> Self {
        Self::AlignedWithProducer
    }
}

/// Static description of a source data cooker: its identity, record
/// interest, production strategy, and dependency declarations.
#[derive(Debug, Clone)]
pub struct CookerDescriptor<K> {
    path: CookerPath,
    required_keys: RequiredKeys<K>,
    production_strategy: ProductionStrategy,
    dependencies: BTreeMap<CookerPath, DependencyType>,
    output_ids: Vec<String>,
}

impl<K: Ord + Clone> CookerDescriptor<K> {
    /// Create a descriptor with an empty key set, `AsCooked` production,
    /// and no dependencies.
    pub fn new(path: CookerPath) -> Self {
        Self {
            path,
            required_keys: RequiredKeys::default(),
            production_strategy: ProductionStrategy::AsCooked,
            dependencies: BTreeMap::new(),
            output_ids: Vec::new(),
        }
    }

    /// Set the keys this cooker consumes.
    pub fn with_required_keys(mut self, keys: RequiredKeys<K>) -> Self {
        self.required_keys = keys;
        self
    }

    /// Set the production strategy.
    pub fn with_production_strategy(mut self, strategy: ProductionStrategy) -> Self {
        self.production_strategy = strategy;
        self
    }

    /// Declare a required cooker with the given dependency type.
    pub fn with_dependency(mut self, on: CookerPath, dependency_type: DependencyType) -> Self {
        self.dependencies.insert(on, dependency_type);
        self
    }

    /// Declare a named output.
    pub fn with_output(mut self, output_id: impl Into<String>) -> Self {
        self.output_ids.push(output_id.into());
        self
    }

    /// The cooker's path.
    pub fn path(&self) -> &CookerPath {
        &self.path
    }

    /// The keys this cooker consumes.
    pub fn required_keys(&self) -> &RequiredKeys<K> {
        &self.required_keys
    }

    /// The production strategy.
    pub fn production_strategy(&self) -> ProductionStrategy {
        self.production_strategy
    }

    /// The declared dependencies, keyed by required cooker path.
    pub fn dependencies(&self) -> &BTreeMap<CookerPath, DependencyType> {
        &self.dependencies
    }

    /// The declared output ids.
    pub fn output_ids(&self) -> &[String] {
        &self.output_ids
    }
}

/// A stateful transform over one source parser's records.
///
/// Instances live for a single processing session: the scheduler drives
/// `cook` for every delivered record of the cooker's assigned pass, then
/// `end_of_pass` exactly once, after which `outputs` must be coherent.
pub trait SourceDataCooker<R: KeyedRecord>: Send {
    /// The cooker's static description.
    fn descriptor(&self) -> &CookerDescriptor<R::Key>;

    /// Consume one record.
    fn cook(
        &mut self,
        record: &R,
        context: &RecordContext,
        cancel: &CancellationToken,
    ) -> ProcessingResult;

    /// Finalize accumulated state at the end of the cooker's pass.
    fn end_of_pass(&mut self, cancel: &CancellationToken);

    /// The cooker's named outputs.
    fn outputs(&self) -> OutputSet;
}

/// A transform that depends only on other cookers' outputs.
pub trait CompositeDataCooker: Send {
    /// The cooker's composite path.
    fn path(&self) -> CookerPath;

    /// Source cookers whose outputs this cooker reads.
    fn required_source_cookers(&self) -> BTreeSet<CookerPath> {
        BTreeSet::new()
    }

    /// Composite cookers whose outputs this cooker reads.
    fn required_composite_cookers(&self) -> BTreeSet<CookerPath> {
        BTreeSet::new()
    }

    /// Data processors this cooker reads.
    fn required_processors(&self) -> BTreeSet<DataProcessorId> {
        BTreeSet::new()
    }

    /// Invoked once all required data is cooked.
    fn on_data_available(&mut self, data: &dyn DataRetrieval);

    /// The cooker's named outputs.
    fn outputs(&self) -> OutputSet;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let producer = CookerPath::source("etw", "process");
        let descriptor: CookerDescriptor<String> =
            CookerDescriptor::new(CookerPath::source("etw", "image"))
                .with_required_keys(RequiredKeys::keys(["Load".to_string()]))
                .with_production_strategy(ProductionStrategy::EndOfPass)
                .with_dependency(producer.clone(), DependencyType::AsConsumed)
                .with_output("intervals");

        assert_eq!(descriptor.path().cooker_id(), "image");
        assert_eq!(
            descriptor.production_strategy(),
            ProductionStrategy::EndOfPass
        );
        assert_eq!(
            descriptor.dependencies().get(&producer),
            Some(&DependencyType::AsConsumed)
        );
        assert_eq!(descriptor.output_ids(), ["intervals".to_string()]);
    }

    #[test]
    fn test_dependency_type_default() {
        assert_eq!(
            DependencyType::default(),
            DependencyType::AlignedWithProducer
        );
    }
}
