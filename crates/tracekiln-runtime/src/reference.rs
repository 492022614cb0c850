//! Extension references and availability.
//!
//! An [`ExtensionReference`] wraps one discovered extension: its declared
//! direct requirements, any construction-time failures, and the final
//! [`Availability`] assigned exactly once by the resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracekiln_sdk::{CookerPath, DataProcessorId, TableId};

/// The resolved usability state of an extension.
///
/// Assigned exactly once by the resolver and terminal afterwards.
/// `Error` subsumes local construction failure, cycle membership, and
/// propagated failure from a required dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Resolution has not run yet.
    Undetermined,
    /// All transitive requirements are available.
    Available,
    /// The extension failed locally or depends on a failed extension.
    Error,
    /// The extension references an identifier that was never discovered.
    MissingRequirement,
}

impl Availability {
    /// Whether the extension can participate in a session.
    pub fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Whether resolution has assigned a final state.
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Undetermined)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Undetermined => "undetermined",
            Self::Available => "available",
            Self::Error => "error",
            Self::MissingRequirement => "missing_requirement",
        };
        f.write_str(s)
    }
}

/// Repository-wide identity of a discovered extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ExtensionId {
    /// A source data cooker.
    SourceCooker(CookerPath),
    /// A composite data cooker.
    CompositeCooker(CookerPath),
    /// A data processor.
    DataProcessor(DataProcessorId),
    /// A table.
    Table(TableId),
}

impl ExtensionId {
    /// Identity of a source cooker.
    pub fn source_cooker(path: CookerPath) -> Self {
        Self::SourceCooker(path)
    }

    /// Identity of a composite cooker.
    pub fn composite_cooker(path: CookerPath) -> Self {
        Self::CompositeCooker(path)
    }

    /// Identity of a data processor.
    pub fn processor(id: DataProcessorId) -> Self {
        Self::DataProcessor(id)
    }

    /// Identity of a table.
    pub fn table(id: TableId) -> Self {
        Self::Table(id)
    }

    /// Short label of the extension kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceCooker(_) => "source cooker",
            Self::CompositeCooker(_) => "composite cooker",
            Self::DataProcessor(_) => "data processor",
            Self::Table(_) => "table",
        }
    }
}

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceCooker(path) | Self::CompositeCooker(path) => write!(f, "{path}"),
            Self::DataProcessor(id) => write!(f, "processor:{id}"),
            Self::Table(id) => write!(f, "table:{id}"),
        }
    }
}

/// One discovered extension: identity, declared requirements,
/// construction health, and resolved availability.
///
/// Cloning produces an independent reference for per-session dependency
/// bookkeeping; the heavyweight processor instance behind a
/// `DataProcessor` reference is shared through the session's processor
/// cache, never through the reference itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionReference {
    id: ExtensionId,
    required_source_cookers: BTreeSet<CookerPath>,
    required_composite_cookers: BTreeSet<CookerPath>,
    required_processors: BTreeSet<DataProcessorId>,
    construction_errors: Vec<String>,
    availability: Availability,
}

impl ExtensionReference {
    /// Create a reference for a discovered extension, validating its
    /// identifier. A malformed identifier is recorded as a construction
    /// error rather than rejected, so the extension still appears in
    /// diagnostics.
    pub fn new(id: ExtensionId) -> Self {
        let mut construction_errors = Vec::new();
        let malformed = match &id {
            ExtensionId::SourceCooker(path) | ExtensionId::CompositeCooker(path) => {
                path.has_empty_segment()
            }
            ExtensionId::DataProcessor(pid) => pid.is_empty(),
            ExtensionId::Table(tid) => tid.is_empty(),
        };
        if malformed {
            construction_errors.push(format!("{} has an empty identifier segment", id.kind()));
        }

        Self {
            id,
            required_source_cookers: BTreeSet::new(),
            required_composite_cookers: BTreeSet::new(),
            required_processors: BTreeSet::new(),
            construction_errors,
            availability: Availability::Undetermined,
        }
    }

    /// Declare a required source cooker.
    pub fn with_required_source_cooker(mut self, path: CookerPath) -> Self {
        self.required_source_cookers.insert(path);
        self
    }

    /// Declare a required composite cooker.
    pub fn with_required_composite_cooker(mut self, path: CookerPath) -> Self {
        self.required_composite_cookers.insert(path);
        self
    }

    /// Declare a required data processor.
    pub fn with_required_processor(mut self, id: DataProcessorId) -> Self {
        self.required_processors.insert(id);
        self
    }

    /// Record a construction-time failure.
    pub fn with_construction_error(mut self, message: impl Into<String>) -> Self {
        self.construction_errors.push(message.into());
        self
    }

    /// The extension's identity.
    pub fn id(&self) -> &ExtensionId {
        &self.id
    }

    /// Declared required source cookers.
    pub fn required_source_cookers(&self) -> &BTreeSet<CookerPath> {
        &self.required_source_cookers
    }

    /// Declared required composite cookers.
    pub fn required_composite_cookers(&self) -> &BTreeSet<CookerPath> {
        &self.required_composite_cookers
    }

    /// Declared required processors.
    pub fn required_processors(&self) -> &BTreeSet<DataProcessorId> {
        &self.required_processors
    }

    /// All direct requirements as repository identities, in deterministic
    /// order.
    pub fn requirements(&self) -> Vec<ExtensionId> {
        let mut ids = Vec::with_capacity(
            self.required_source_cookers.len()
                + self.required_composite_cookers.len()
                + self.required_processors.len(),
        );
        ids.extend(
            self.required_source_cookers
                .iter()
                .cloned()
                .map(ExtensionId::SourceCooker),
        );
        ids.extend(
            self.required_composite_cookers
                .iter()
                .cloned()
                .map(ExtensionId::CompositeCooker),
        );
        ids.extend(
            self.required_processors
                .iter()
                .cloned()
                .map(ExtensionId::DataProcessor),
        );
        ids
    }

    /// Construction-time failures plus resolution diagnostics.
    pub fn diagnostics(&self) -> &[String] {
        &self.construction_errors
    }

    /// Whether construction recorded any failure.
    pub fn has_construction_errors(&self) -> bool {
        !self.construction_errors.is_empty()
    }

    /// The resolved availability.
    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// Assign the final availability with its diagnostic reasons. Only
    /// the first assignment takes effect; availability is terminal once
    /// set.
    pub(crate) fn assign_availability(&mut self, availability: Availability, reasons: Vec<String>) {
        if self.availability.is_resolved() {
            return;
        }
        self.availability = availability;
        self.construction_errors.extend(reasons);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identifier_is_construction_error() {
        let reference = ExtensionReference::new(ExtensionId::source_cooker(CookerPath::source(
            "etw", "",
        )));
        assert!(reference.has_construction_errors());
        assert_eq!(reference.availability(), Availability::Undetermined);
    }

    #[test]
    fn test_availability_is_terminal() {
        let mut reference =
            ExtensionReference::new(ExtensionId::source_cooker(CookerPath::source("etw", "a")));
        reference.assign_availability(Availability::Available, Vec::new());
        reference.assign_availability(Availability::Error, vec!["late".into()]);

        assert_eq!(reference.availability(), Availability::Available);
        assert!(reference.diagnostics().is_empty());
    }

    #[test]
    fn test_requirements_union() {
        let reference =
            ExtensionReference::new(ExtensionId::composite_cooker(CookerPath::composite("sum")))
                .with_required_source_cooker(CookerPath::source("etw", "process"))
                .with_required_processor(DataProcessorId::new("symbols"));

        let requirements = reference.requirements();
        assert_eq!(requirements.len(), 2);
        assert!(requirements
            .contains(&ExtensionId::source_cooker(CookerPath::source("etw", "process"))));
        assert!(requirements
            .contains(&ExtensionId::processor(DataProcessorId::new("symbols"))));
    }
}
