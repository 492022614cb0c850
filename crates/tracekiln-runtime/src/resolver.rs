//! Dependency-closure resolution.
//!
//! Walks the extension repository once, assigning a final
//! [`Availability`] to every reference: construction failures and cycle
//! members become `Error`, references to undiscovered identifiers become
//! `MissingRequirement`, and failures propagate to every transitive
//! dependent. Each non-available assignment carries a human-readable
//! reason so a UI or log can explain why a plugin's contribution was
//! disabled.

use crate::reference::{Availability, ExtensionId};
use crate::repository::ExtensionRepository;
use std::collections::BTreeMap;

/// Outcome of resolving one repository.
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    availability: BTreeMap<ExtensionId, Availability>,
    diagnostics: BTreeMap<ExtensionId, Vec<String>>,
    cycles: Vec<Vec<ExtensionId>>,
}

impl ResolutionReport {
    /// Final availability of every registered extension.
    pub fn availability(&self) -> &BTreeMap<ExtensionId, Availability> {
        &self.availability
    }

    /// Whether the given extension resolved as available.
    pub fn is_available(&self, id: &ExtensionId) -> bool {
        self.availability
            .get(id)
            .is_some_and(|a| a.is_available())
    }

    /// Diagnostic messages recorded for one extension.
    pub fn diagnostics_for(&self, id: &ExtensionId) -> &[String] {
        self.diagnostics.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dependency cycles detected during resolution.
    pub fn cycles(&self) -> &[Vec<ExtensionId>] {
        &self.cycles
    }

    /// Number of extensions that resolved as available.
    pub fn available_count(&self) -> usize {
        self.availability
            .values()
            .filter(|a| a.is_available())
            .count()
    }

    /// Format the report as a human-readable message.
    pub fn format_message(&self) -> String {
        let unavailable: Vec<_> = self
            .availability
            .iter()
            .filter(|(_, a)| !a.is_available())
            .collect();

        if unavailable.is_empty() {
            return format!("All {} extensions are available.", self.availability.len());
        }

        let mut msg = format!(
            "{} of {} extensions are available:",
            self.available_count(),
            self.availability.len()
        );
        for (id, availability) in unavailable {
            msg.push_str(&format!("\n  {id}: {availability}"));
            for reason in self.diagnostics_for(id) {
                msg.push_str(&format!("\n    - {reason}"));
            }
        }
        msg
    }
}

/// Assign a final availability to every extension in the repository.
///
/// Runs a depth-first traversal over the union of required-cooker and
/// required-processor edges, memoizing each node the first time it fully
/// resolves and tracking the traversal stack to detect cycles. Roots are
/// visited in identifier order so diagnostics are deterministic. The
/// traversal is O(V+E) and idempotent: already-resolved references keep
/// their assignment.
pub fn resolve(repository: &mut ExtensionRepository) -> ResolutionReport {
    let mut resolver = Resolver {
        repository,
        stack: Vec::new(),
        cycles: Vec::new(),
    };

    for id in resolver.repository.ids() {
        resolver.visit(&id);
    }

    let availability = resolver
        .repository
        .iter()
        .map(|r| (r.id().clone(), r.availability()))
        .collect();
    let diagnostics = resolver
        .repository
        .iter()
        .filter(|r| !r.diagnostics().is_empty())
        .map(|r| (r.id().clone(), r.diagnostics().to_vec()))
        .collect();
    let cycles = resolver.cycles;

    let report = ResolutionReport {
        availability,
        diagnostics,
        cycles,
    };
    tracing::info!(
        total = report.availability().len(),
        available = report.available_count(),
        cycles = report.cycles().len(),
        "extension resolution complete"
    );
    report
}

struct Resolver<'a> {
    repository: &'a mut ExtensionRepository,
    stack: Vec<ExtensionId>,
    cycles: Vec<Vec<ExtensionId>>,
}

impl Resolver<'_> {
    /// Resolve one node, returning its final availability.
    fn visit(&mut self, id: &ExtensionId) -> Availability {
        let (availability, has_construction_errors, requirements) =
            match self.repository.get(id) {
                // Caller handles absent requirements; the root loop only
                // passes registered ids.
                None => return Availability::MissingRequirement,
                Some(reference) => (
                    reference.availability(),
                    reference.has_construction_errors(),
                    reference.requirements(),
                ),
            };

        if availability.is_resolved() {
            return availability;
        }

        if let Some(pos) = self.stack.iter().position(|s| s == id) {
            self.close_cycle(pos);
            return Availability::Error;
        }

        // A locally broken extension never participates further; its
        // declared requirements are not traversed on its behalf.
        if has_construction_errors {
            self.assign(id, Availability::Error, Vec::new());
            return Availability::Error;
        }

        self.stack.push(id.clone());

        let mut missing: Vec<ExtensionId> = Vec::new();
        let mut failed: Vec<ExtensionId> = Vec::new();
        for requirement in &requirements {
            if self.repository.get(requirement).is_none() {
                missing.push(requirement.clone());
                continue;
            }
            match self.visit(requirement) {
                Availability::Available => {}
                _ => failed.push(requirement.clone()),
            }
        }

        self.stack.pop();

        // The node may have been assigned while on the stack as a cycle
        // member; that assignment is terminal.
        if let Some(reference) = self.repository.get(id) {
            if reference.availability().is_resolved() {
                return reference.availability();
            }
        }

        if !missing.is_empty() {
            let reasons = missing
                .iter()
                .map(|r| format!("missing required {} {}", r.kind(), r))
                .collect();
            self.assign(id, Availability::MissingRequirement, reasons);
            return Availability::MissingRequirement;
        }

        if !failed.is_empty() {
            let reasons = failed
                .iter()
                .map(|r| format!("depends on unavailable {} {}", r.kind(), r))
                .collect();
            self.assign(id, Availability::Error, reasons);
            return Availability::Error;
        }

        self.assign(id, Availability::Available, Vec::new());
        Availability::Available
    }

    /// Mark every member of the cycle starting at `pos` on the stack as
    /// `Error`, recording the full cycle path in each member's
    /// diagnostics.
    fn close_cycle(&mut self, pos: usize) {
        let mut cycle: Vec<ExtensionId> = self.stack[pos..].to_vec();
        cycle.push(self.stack[pos].clone());

        let rendered = cycle
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        tracing::warn!(cycle = %rendered, "cyclic extension dependency");

        let members: Vec<ExtensionId> = cycle[..cycle.len() - 1].to_vec();
        for member in &members {
            self.assign(
                member,
                Availability::Error,
                vec![format!("cyclic dependency: {rendered}")],
            );
        }
        self.cycles.push(cycle);
    }

    fn assign(&mut self, id: &ExtensionId, availability: Availability, reasons: Vec<String>) {
        if let Some(reference) = self.repository.get_mut(id) {
            reference.assign_availability(availability, reasons);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ExtensionReference;
    use tracekiln_sdk::CookerPath;

    fn cooker(id: &str) -> ExtensionId {
        ExtensionId::source_cooker(CookerPath::source("etw", id))
    }

    #[test]
    fn test_diamond_resolves_available() {
        let mut repo = ExtensionRepository::new();
        repo.register(ExtensionReference::new(cooker("base"))).unwrap();
        for id in ["left", "right"] {
            repo.register(
                ExtensionReference::new(cooker(id))
                    .with_required_source_cooker(CookerPath::source("etw", "base")),
            )
            .unwrap();
        }
        repo.register(
            ExtensionReference::new(cooker("top"))
                .with_required_source_cooker(CookerPath::source("etw", "left"))
                .with_required_source_cooker(CookerPath::source("etw", "right")),
        )
        .unwrap();

        let report = resolve(&mut repo);
        assert_eq!(report.available_count(), 4);
        assert!(report.is_available(&cooker("top")));
    }

    #[test]
    fn test_construction_error_propagates() {
        let mut repo = ExtensionRepository::new();
        repo.register(
            ExtensionReference::new(cooker("broken"))
                .with_construction_error("factory returned an error"),
        )
        .unwrap();
        repo.register(
            ExtensionReference::new(cooker("dependent"))
                .with_required_source_cooker(CookerPath::source("etw", "broken")),
        )
        .unwrap();

        let report = resolve(&mut repo);
        assert_eq!(
            report.availability()[&cooker("broken")],
            Availability::Error
        );
        assert_eq!(
            report.availability()[&cooker("dependent")],
            Availability::Error
        );
        assert!(report.diagnostics_for(&cooker("dependent"))[0]
            .contains("depends on unavailable"));
    }

    #[test]
    fn test_self_cycle_is_error() {
        let mut repo = ExtensionRepository::new();
        repo.register(
            ExtensionReference::new(cooker("selfish"))
                .with_required_source_cooker(CookerPath::source("etw", "selfish")),
        )
        .unwrap();

        let report = resolve(&mut repo);
        assert_eq!(
            report.availability()[&cooker("selfish")],
            Availability::Error
        );
        assert_eq!(report.cycles().len(), 1);
    }

    #[test]
    fn test_format_message_lists_reasons() {
        let mut repo = ExtensionRepository::new();
        repo.register(
            ExtensionReference::new(cooker("orphan"))
                .with_required_source_cooker(CookerPath::source("etw", "ghost")),
        )
        .unwrap();

        let report = resolve(&mut repo);
        let message = report.format_message();
        assert!(message.contains("etw/orphan: missing_requirement"));
        assert!(message.contains("missing required source cooker etw/ghost"));
    }
}
