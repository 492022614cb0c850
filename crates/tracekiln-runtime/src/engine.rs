//! Orchestration above single-source sessions: accumulating cooked
//! outputs, running composite cookers, and driving independent sources
//! concurrently.

use crate::error::Result;
use crate::reference::ExtensionId;
use crate::resolver::ResolutionReport;
use crate::schedule::topological_order;
use crate::session::SessionResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracekiln_sdk::{
    CompositeDataCooker, CookerPath, DataRetrieval, OutputPath, OutputSet, OutputValue,
};

/// Accumulated cooked outputs from completed sessions and composite
/// cookers, queryable by [`OutputPath`].
#[derive(Default)]
pub struct CookedDataRetrieval {
    outputs: BTreeMap<OutputPath, OutputValue>,
}

impl CookedDataRetrieval {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every output of a completed session.
    pub fn merge_session(&mut self, result: &SessionResult) {
        for (path, value) in result.outputs() {
            self.outputs.insert(path.clone(), Arc::clone(value));
        }
    }

    /// Merge one cooker's output set under its path.
    pub fn merge_outputs(&mut self, cooker: &CookerPath, outputs: &OutputSet) {
        for (output_id, value) in outputs.iter() {
            self.outputs.insert(cooker.output(output_id), Arc::clone(value));
        }
    }

    /// Number of accumulated outputs.
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl DataRetrieval for CookedDataRetrieval {
    fn output(&self, path: &OutputPath) -> Option<OutputValue> {
        self.outputs.get(path).cloned()
    }
}

impl std::fmt::Debug for CookedDataRetrieval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookedDataRetrieval")
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Run composite cookers over the accumulated outputs.
///
/// Composites are ordered topologically by their composite-cooker
/// requirements so a dependent always runs after its producers, and each
/// cooker's outputs are merged into `data` before the next one runs.
/// Composites the resolver did not mark available are skipped with a
/// warning; returns the paths that ran, in execution order.
pub fn run_composites(
    composites: &mut [Box<dyn CompositeDataCooker>],
    resolution: &ResolutionReport,
    data: &mut CookedDataRetrieval,
) -> Result<Vec<CookerPath>> {
    let paths: Vec<CookerPath> = composites.iter().map(|c| c.path()).collect();
    let mut index_by_path: BTreeMap<CookerPath, usize> = BTreeMap::new();
    for (idx, path) in paths.iter().enumerate() {
        index_by_path.insert(path.clone(), idx);
    }

    // Deterministic root order: composites sorted by path.
    let sorted: Vec<usize> = index_by_path.values().copied().collect();
    let order = topological_order(&sorted, |idx| {
        composites[idx]
            .required_composite_cookers()
            .iter()
            .filter_map(|p| index_by_path.get(p).copied())
            .collect()
    })
    .map_err(|cycle| crate::error::RuntimeError::CyclicDependency {
        cycle: cycle
            .into_iter()
            .map(|idx| ExtensionId::composite_cooker(paths[idx].clone()))
            .collect(),
    })?;

    let mut ran = Vec::new();
    for idx in order {
        let path = paths[idx].clone();
        if !resolution.is_available(&ExtensionId::composite_cooker(path.clone())) {
            tracing::warn!(cooker = %path, "skipping unavailable composite cooker");
            continue;
        }
        tracing::debug!(cooker = %path, "running composite cooker");
        composites[idx].on_data_available(&*data);
        let outputs = composites[idx].outputs();
        data.merge_outputs(&path, &outputs);
        ran.push(path);
    }
    Ok(ran)
}

/// Run independent sources' sessions concurrently.
///
/// Each job owns its parser and cookers (sources share no cooker state),
/// so they run on blocking worker threads. Results are returned in job
/// order; a panicked or failed job surfaces as an error in its slot
/// without affecting sibling sources.
pub async fn run_sources(
    jobs: Vec<Box<dyn FnOnce() -> Result<SessionResult> + Send>>,
) -> Vec<Result<SessionResult>> {
    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| tokio::task::spawn_blocking(job))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => results.push(Err(e.into())),
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubComposite {
        path: CookerPath,
        needs: BTreeSet<CookerPath>,
        watch: OutputPath,
        observed: Arc<AtomicBool>,
    }

    impl CompositeDataCooker for StubComposite {
        fn path(&self) -> CookerPath {
            self.path.clone()
        }

        fn required_composite_cookers(&self) -> BTreeSet<CookerPath> {
            self.needs.clone()
        }

        fn on_data_available(&mut self, data: &dyn DataRetrieval) {
            if data.output(&self.watch).is_some() {
                self.observed.store(true, Ordering::SeqCst);
            }
        }

        fn outputs(&self) -> OutputSet {
            let mut outputs = OutputSet::new();
            outputs.insert("done", true);
            outputs
        }
    }

    #[test]
    fn test_composites_run_in_dependency_order() {
        let first = CookerPath::composite("first");
        let second = CookerPath::composite("second");
        let observed = Arc::new(AtomicBool::new(false));

        let mut composites: Vec<Box<dyn CompositeDataCooker>> = vec![
            Box::new(StubComposite {
                path: second.clone(),
                needs: [first.clone()].into_iter().collect(),
                watch: first.output("done"),
                observed: observed.clone(),
            }),
            Box::new(StubComposite {
                path: first.clone(),
                needs: BTreeSet::new(),
                watch: OutputPath::new(CookerPath::composite("nothing"), "none"),
                observed: Arc::new(AtomicBool::new(false)),
            }),
        ];

        let mut repo = crate::repository::ExtensionRepository::new();
        repo.register(crate::reference::ExtensionReference::new(
            ExtensionId::composite_cooker(first.clone()),
        ))
        .unwrap();
        repo.register(
            crate::reference::ExtensionReference::new(ExtensionId::composite_cooker(
                second.clone(),
            ))
            .with_required_composite_cooker(first.clone()),
        )
        .unwrap();
        let resolution = crate::resolver::resolve(&mut repo);

        let mut data = CookedDataRetrieval::new();
        let ran = run_composites(&mut composites, &resolution, &mut data).unwrap();

        assert_eq!(ran, vec![first.clone(), second]);
        assert!(data.output(&first.output("done")).is_some());
        // The dependent observed its producer's output when it ran.
        assert!(observed.load(Ordering::SeqCst));
    }
}
