//! Pass planning for one source parser.
//!
//! Given the enabled cookers' descriptors, the planner assigns each
//! cooker to a parsing pass and fixes two orders per pass: the per-record
//! dispatch order and the end-of-pass finalization order.
//!
//! A dependency edge is *strict* when the consumer declared (effectively)
//! `AsConsumed` on a producer that only posts output at end of pass: the
//! producer's pass must complete strictly before the consumer's pass
//! begins, which is the one situation that forces additional passes. All
//! other edges allow the producer to share the consumer's pass, ordered
//! per record (`AsConsumed` on an incremental producer) or at
//! finalization (`SamePass`).

use crate::error::{Result, RuntimeError};
use crate::reference::ExtensionId;
use std::collections::BTreeMap;
use tracekiln_sdk::{
    CookerDescriptor, CookerPath, DependencyType, ProductionStrategy, RequiredKeys,
};

/// How one dependency edge constrains scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeClass {
    /// Producer must finish its pass strictly before the consumer's pass.
    Strict,
    /// Same pass allowed; producer must see each record first.
    PerRecord,
    /// Same pass allowed; producer must finalize first.
    Finalize,
}

fn classify(declared: DependencyType, producer: ProductionStrategy) -> EdgeClass {
    let effective = match declared {
        DependencyType::AlignedWithProducer => match producer {
            ProductionStrategy::AsCooked => DependencyType::AsConsumed,
            ProductionStrategy::EndOfPass => DependencyType::SamePass,
        },
        other => other,
    };
    match (effective, producer) {
        (DependencyType::AsConsumed, ProductionStrategy::AsCooked) => EdgeClass::PerRecord,
        (DependencyType::AsConsumed, ProductionStrategy::EndOfPass) => EdgeClass::Strict,
        _ => EdgeClass::Finalize,
    }
}

/// One scheduled pass. Orders hold indices into the cooker slice the
/// plan was built from.
#[derive(Debug, Clone)]
pub struct PassSpec<K> {
    dispatch_order: Vec<usize>,
    finalize_order: Vec<usize>,
    keys: RequiredKeys<K>,
}

impl<K> PassSpec<K> {
    /// Cooker indices in per-record dispatch order.
    pub fn dispatch_order(&self) -> &[usize] {
        &self.dispatch_order
    }

    /// Cooker indices in end-of-pass finalization order.
    pub fn finalize_order(&self) -> &[usize] {
        &self.finalize_order
    }

    /// Union of keys requested by this pass's cookers.
    pub fn keys(&self) -> &RequiredKeys<K> {
        &self.keys
    }
}

/// The pass plan for one source.
#[derive(Debug, Clone)]
pub struct PassPlan<K> {
    parser_id: String,
    passes: Vec<PassSpec<K>>,
}

impl<K> PassPlan<K> {
    /// The parser this plan schedules.
    pub fn parser_id(&self) -> &str {
        &self.parser_id
    }

    /// The scheduled passes, in execution order.
    pub fn passes(&self) -> &[PassSpec<K>] {
        &self.passes
    }

    /// Number of passes the plan needs.
    pub fn total_passes(&self) -> usize {
        self.passes.len()
    }
}

/// Compute the pass plan for one source parser.
///
/// `max_passes` of `0` means uncapped. Fails with
/// [`RuntimeError::SchedulingInfeasible`] when the plan would need more
/// passes than the parser allows, and never drops a cooker silently.
pub fn plan_passes<K: Ord + Clone>(
    parser_id: &str,
    max_passes: usize,
    descriptors: &[&CookerDescriptor<K>],
) -> Result<PassPlan<K>> {
    let mut index_by_path: BTreeMap<CookerPath, usize> = BTreeMap::new();
    for (idx, descriptor) in descriptors.iter().enumerate() {
        let path = descriptor.path();
        if path.source_parser_id() != Some(parser_id) {
            return Err(RuntimeError::ForeignCooker {
                cooker: path.clone(),
                parser_id: parser_id.to_string(),
            });
        }
        if index_by_path.insert(path.clone(), idx).is_some() {
            return Err(RuntimeError::DuplicateExtension(ExtensionId::source_cooker(
                path.clone(),
            )));
        }
    }

    // consumer index -> (producer index, edge class). Dependencies on
    // cookers outside this source (other parsers, composites) are
    // satisfied outside the pass pipeline and do not constrain it.
    let mut edges: Vec<Vec<(usize, EdgeClass)>> = vec![Vec::new(); descriptors.len()];
    for (consumer, descriptor) in descriptors.iter().enumerate() {
        for (required, declared) in descriptor.dependencies() {
            let Some(&producer) = index_by_path.get(required) else {
                continue;
            };
            let class = classify(*declared, descriptors[producer].production_strategy());
            edges[consumer].push((producer, class));
        }
    }

    // Deterministic traversal order: cookers sorted by path.
    let sorted: Vec<usize> = index_by_path.values().copied().collect();

    let topo = topological_order(&sorted, |idx| {
        edges[idx].iter().map(|(p, _)| *p).collect()
    })
    .map_err(|cycle| RuntimeError::CyclicDependency {
        cycle: cycle
            .into_iter()
            .map(|idx| ExtensionId::source_cooker(descriptors[idx].path().clone()))
            .collect(),
    })?;

    // Layer cookers into passes: strict edges push the consumer at least
    // one pass past the producer, weak edges only require no earlier.
    let mut pass_of = vec![0usize; descriptors.len()];
    for &idx in &topo {
        for &(producer, class) in &edges[idx] {
            let floor = match class {
                EdgeClass::Strict => pass_of[producer] + 1,
                _ => pass_of[producer],
            };
            pass_of[idx] = pass_of[idx].max(floor);
        }
    }

    let total_passes = pass_of.iter().map(|p| p + 1).max().unwrap_or(1);
    if max_passes != 0 && total_passes > max_passes {
        return Err(RuntimeError::SchedulingInfeasible {
            parser_id: parser_id.to_string(),
            required_passes: total_passes,
            max_passes,
        });
    }

    let mut passes = Vec::with_capacity(total_passes);
    for pass in 0..total_passes {
        let members: Vec<usize> = sorted
            .iter()
            .copied()
            .filter(|&idx| pass_of[idx] == pass)
            .collect();

        // The full graph was already checked acyclic, so a per-pass
        // subgraph cycle cannot occur today; report rather than fall back
        // so a future edge class cannot silently break the ordering.
        let cycle_error = |cycle: Vec<usize>| RuntimeError::CyclicDependency {
            cycle: cycle
                .into_iter()
                .map(|idx| ExtensionId::source_cooker(descriptors[idx].path().clone()))
                .collect(),
        };

        let dispatch_order = topological_order(&members, |idx| {
            edges[idx]
                .iter()
                .filter(|(p, class)| *class == EdgeClass::PerRecord && pass_of[*p] == pass)
                .map(|(p, _)| *p)
                .collect()
        })
        .map_err(cycle_error)?;

        let finalize_order = topological_order(&members, |idx| {
            edges[idx]
                .iter()
                .filter(|(p, _)| pass_of[*p] == pass)
                .map(|(p, _)| *p)
                .collect()
        })
        .map_err(cycle_error)?;

        let mut keys = RequiredKeys::default();
        for &idx in &members {
            keys.merge(descriptors[idx].required_keys());
        }

        passes.push(PassSpec {
            dispatch_order,
            finalize_order,
            keys,
        });
    }

    tracing::debug!(
        parser = parser_id,
        cookers = descriptors.len(),
        passes = total_passes,
        "computed pass plan"
    );

    Ok(PassPlan {
        parser_id: parser_id.to_string(),
        passes,
    })
}

/// Producers-first topological order over the given nodes, visiting them
/// in slice order so ties resolve deterministically. Returns the cycle
/// path on failure.
pub(crate) fn topological_order(
    nodes: &[usize],
    deps: impl Fn(usize) -> Vec<usize>,
) -> std::result::Result<Vec<usize>, Vec<usize>> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut visited = vec![];
    let mut visiting = vec![];

    fn visit(
        node: usize,
        deps: &impl Fn(usize) -> Vec<usize>,
        visited: &mut Vec<usize>,
        visiting: &mut Vec<usize>,
        order: &mut Vec<usize>,
    ) -> std::result::Result<(), Vec<usize>> {
        if visited.contains(&node) {
            return Ok(());
        }
        if let Some(pos) = visiting.iter().position(|&n| n == node) {
            let mut cycle = visiting[pos..].to_vec();
            cycle.push(node);
            return Err(cycle);
        }

        visiting.push(node);
        for dep in deps(node) {
            visit(dep, deps, visited, visiting, order)?;
        }
        visiting.pop();

        visited.push(node);
        order.push(node);
        Ok(())
    }

    for &node in nodes {
        visit(node, &deps, &mut visited, &mut visiting, &mut order)?;
    }
    Ok(order)
}
