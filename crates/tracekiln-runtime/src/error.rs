//! Runtime error types.
//!
//! Cancellation is deliberately not represented here: a cancelled session
//! is a distinct [`SessionOutcome`](crate::session::SessionOutcome), not
//! an error.

use crate::reference::ExtensionId;
use tracekiln_sdk::{CookerPath, OutputPath, ParseError, ProcessorError};

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by the extension repository, resolver, and scheduler.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// An extension was malformed at discovery time (bad type, empty id).
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),

    /// An extension was registered twice under the same identifier.
    #[error("Duplicate extension registration: {0}")]
    DuplicateExtension(ExtensionId),

    /// An extension references an identifier absent from the repository.
    #[error("Extension {extension} is missing required {requirement}")]
    MissingRequirement {
        /// The extension whose declaration failed.
        extension: ExtensionId,
        /// The absent requirement.
        requirement: ExtensionId,
    },

    /// A dependency cycle was detected.
    #[error("Cyclic dependency: {}", format_cycle(cycle))]
    CyclicDependency {
        /// Members of the cycle, in traversal order, first repeated last.
        cycle: Vec<ExtensionId>,
    },

    /// A source's cookers cannot be ordered within the parser's pass cap.
    #[error(
        "Cooking of source '{parser_id}' needs {required_passes} passes but the parser allows {max_passes}"
    )]
    SchedulingInfeasible {
        /// The affected parser.
        parser_id: String,
        /// Passes the plan would need.
        required_passes: usize,
        /// The parser's declared cap.
        max_passes: usize,
    },

    /// A cooker instance was supplied whose descriptor does not belong to
    /// the scheduled parser.
    #[error("Cooker {cooker} does not belong to source parser '{parser_id}'")]
    ForeignCooker {
        /// The misrouted cooker.
        cooker: CookerPath,
        /// The parser being scheduled.
        parser_id: String,
    },

    /// An output path is unknown to the queried result set.
    #[error("Unknown output: {0}")]
    UnknownOutput(OutputPath),

    /// An output exists but holds a different type than requested.
    #[error("Output {0} holds a different type than requested")]
    OutputTypeMismatch(OutputPath),

    /// The source parser failed while traversing the source.
    #[error("Source parsing failed: {0}")]
    Parse(#[from] ParseError),

    /// A data processor failed to initialize.
    #[error("Processor initialization failed: {0}")]
    Processor(#[from] ProcessorError),

    /// A worker task running a source's session failed.
    #[error("Source task failed: {0}")]
    TaskFailed(String),
}

fn format_cycle(cycle: &[ExtensionId]) -> String {
    cycle
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl From<tokio::task::JoinError> for RuntimeError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_rendering() {
        let a = ExtensionId::source_cooker(CookerPath::source("etw", "a"));
        let b = ExtensionId::source_cooker(CookerPath::source("etw", "b"));
        let err = RuntimeError::CyclicDependency {
            cycle: vec![a.clone(), b, a],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency: etw/a -> etw/b -> etw/a"
        );
    }
}
