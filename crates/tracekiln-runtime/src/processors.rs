//! Per-session cache of data-processor instances.
//!
//! Processor instances are constructed at discovery time so their
//! descriptors can be read cheaply; the data-dependent initialization in
//! `on_data_available` runs at most once per session, the first time the
//! instance is requested. Concurrent first callers block until the
//! initialization completes and then all observe the same instance.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracekiln_sdk::{DataProcessor, DataProcessorId, DataRetrieval, ProcessorError};

struct ProcessorEntry {
    instance: Arc<dyn DataProcessor>,
    init: OnceCell<Result<(), ProcessorError>>,
}

/// Lazily materializes the instance behind each data-processor extension,
/// exactly once per session.
#[derive(Default)]
pub struct ProcessorCache {
    entries: RwLock<HashMap<DataProcessorId, Arc<ProcessorEntry>>>,
}

impl ProcessorCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor instance constructed at discovery time.
    /// Re-registering the same id keeps the first instance.
    pub fn register(&self, instance: Arc<dyn DataProcessor>) {
        let id = instance.id();
        self.entries
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(ProcessorEntry {
                instance,
                init: OnceCell::new(),
            }));
    }

    /// Whether a processor is registered under the given id.
    pub fn contains(&self, id: &DataProcessorId) -> bool {
        self.entries.read().contains_key(id)
    }

    /// Get the initialized instance for `id`, running its
    /// `on_data_available` on the first call.
    ///
    /// Returns `Ok(None)` when no instance exists (construction failed at
    /// discovery time or the id was never registered). An initialization
    /// error is cached and returned to every subsequent caller; repeated
    /// calls after a successful first one are cheap reads with no further
    /// side effects.
    pub fn get_or_create(
        &self,
        id: &DataProcessorId,
        data: &dyn DataRetrieval,
    ) -> Result<Option<Arc<dyn DataProcessor>>, ProcessorError> {
        let entry = match self.entries.read().get(id) {
            Some(entry) => Arc::clone(entry),
            None => return Ok(None),
        };

        let result = entry.init.get_or_init(|| {
            tracing::debug!(processor = %id, "initializing data processor");
            entry.instance.on_data_available(data)
        });

        match result {
            Ok(()) => Ok(Some(Arc::clone(&entry.instance))),
            Err(e) => Err(e.clone()),
        }
    }
}

impl std::fmt::Debug for ProcessorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorCache")
            .field("processors", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracekiln_sdk::{OutputPath, OutputValue};

    struct EmptyRetrieval;

    impl DataRetrieval for EmptyRetrieval {
        fn output(&self, _path: &OutputPath) -> Option<OutputValue> {
            None
        }
    }

    struct CountingProcessor {
        id: DataProcessorId,
        init_calls: AtomicUsize,
        fail: bool,
    }

    impl DataProcessor for CountingProcessor {
        fn id(&self) -> DataProcessorId {
            self.id.clone()
        }

        fn on_data_available(&self, _data: &dyn DataRetrieval) -> Result<(), ProcessorError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ProcessorError::initialization("bad input"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_init_runs_once() {
        let cache = ProcessorCache::new();
        let processor = Arc::new(CountingProcessor {
            id: DataProcessorId::new("symbols"),
            init_calls: AtomicUsize::new(0),
            fail: false,
        });
        cache.register(processor.clone());

        let id = DataProcessorId::new("symbols");
        for _ in 0..3 {
            let got = cache.get_or_create(&id, &EmptyRetrieval).unwrap();
            assert!(got.is_some());
        }
        assert_eq!(processor.init_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_id_is_absent() {
        let cache = ProcessorCache::new();
        let got = cache
            .get_or_create(&DataProcessorId::new("nope"), &EmptyRetrieval)
            .unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_init_failure_is_cached() {
        let cache = ProcessorCache::new();
        let processor = Arc::new(CountingProcessor {
            id: DataProcessorId::new("flaky"),
            init_calls: AtomicUsize::new(0),
            fail: true,
        });
        cache.register(processor.clone());

        let id = DataProcessorId::new("flaky");
        assert!(cache.get_or_create(&id, &EmptyRetrieval).is_err());
        assert!(cache.get_or_create(&id, &EmptyRetrieval).is_err());
        assert_eq!(processor.init_calls.load(Ordering::SeqCst), 1);
    }
}
