//! Data processor contract.

use crate::error::ProcessorError;
use crate::output::DataRetrieval;
use crate::paths::{CookerPath, DataProcessorId};
use std::collections::BTreeSet;

/// An extension whose output is computed lazily from runtime-supplied
/// inputs rather than being statically known.
///
/// Instances are constructed at discovery time so their identity and
/// requirements can be read cheaply; the data-dependent initialization in
/// `on_data_available` runs at most once per session, driven by the
/// runtime's processor cache.
pub trait DataProcessor: Send + Sync {
    /// Stable identity of the processor.
    fn id(&self) -> DataProcessorId;

    /// Source cookers whose outputs this processor reads.
    fn required_source_cookers(&self) -> BTreeSet<CookerPath> {
        BTreeSet::new()
    }

    /// Composite cookers whose outputs this processor reads.
    fn required_composite_cookers(&self) -> BTreeSet<CookerPath> {
        BTreeSet::new()
    }

    /// Other processors this processor reads.
    fn required_processors(&self) -> BTreeSet<DataProcessorId> {
        BTreeSet::new()
    }

    /// One-shot, data-dependent initialization. Implementations needing
    /// mutable state use interior mutability; the runtime guarantees this
    /// runs at most once per session.
    fn on_data_available(&self, data: &dyn DataRetrieval) -> Result<(), ProcessorError>;
}
