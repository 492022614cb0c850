//! Type-erased output plumbing.
//!
//! Cookers expose their results through an explicit registration table:
//! an [`OutputSet`] mapping output ids to type-erased values. Downstream
//! consumers retrieve outputs by [`OutputPath`] through the
//! [`DataRetrieval`] trait and downcast with [`DataRetrievalExt`].

use crate::paths::OutputPath;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A type-erased, shareable output value.
pub type OutputValue = Arc<dyn Any + Send + Sync>;

/// The named outputs exposed by one cooker, keyed by output id.
#[derive(Default, Clone)]
pub struct OutputSet {
    values: BTreeMap<String, OutputValue>,
}

impl OutputSet {
    /// Create an empty output set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output value under the given id.
    pub fn insert<T: Any + Send + Sync>(&mut self, output_id: impl Into<String>, value: T) {
        self.values.insert(output_id.into(), Arc::new(value));
    }

    /// Register an already-erased output value.
    pub fn insert_value(&mut self, output_id: impl Into<String>, value: OutputValue) {
        self.values.insert(output_id.into(), value);
    }

    /// Look up an output by id.
    pub fn get(&self, output_id: &str) -> Option<&OutputValue> {
        self.values.get(output_id)
    }

    /// Look up and downcast an output by id.
    pub fn get_as<T: Any + Send + Sync>(&self, output_id: &str) -> Option<Arc<T>> {
        self.values
            .get(output_id)
            .and_then(|v| Arc::clone(v).downcast::<T>().ok())
    }

    /// Iterate over (id, value) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered outputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for OutputSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSet")
            .field("output_ids", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Read access to cooked outputs, addressed by [`OutputPath`].
///
/// Implemented by the runtime over the outputs accumulated from completed
/// sessions; handed to composite cookers and data processors.
pub trait DataRetrieval: Send + Sync {
    /// Look up an output value by path.
    fn output(&self, path: &OutputPath) -> Option<OutputValue>;
}

/// Downcasting convenience over [`DataRetrieval`].
pub trait DataRetrievalExt: DataRetrieval {
    /// Look up and downcast an output value by path.
    fn output_of<T: Any + Send + Sync>(&self, path: &OutputPath) -> Option<Arc<T>> {
        self.output(path).and_then(|v| v.downcast::<T>().ok())
    }
}

impl<R: DataRetrieval + ?Sized> DataRetrievalExt for R {}
