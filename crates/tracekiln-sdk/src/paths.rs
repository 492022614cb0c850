//! Identity types for extensions and their outputs.
//!
//! Every extension discovered by the runtime is addressed by one of these
//! immutable value identities. They are hashable, totally ordered by
//! string comparison for deterministic traversal, and serializable so
//! diagnostics can be rendered by a UI or CLI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a data cooker across a whole processing session.
///
/// A cooker attached to a source parser carries that parser's id; a
/// composite cooker (one that depends only on other cookers) has no
/// parser id and displays with a `*` wildcard segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CookerPath {
    source_parser_id: Option<String>,
    cooker_id: String,
}

impl CookerPath {
    /// Create the path of a cooker attached to a source parser.
    pub fn source(parser_id: impl Into<String>, cooker_id: impl Into<String>) -> Self {
        Self {
            source_parser_id: Some(parser_id.into()),
            cooker_id: cooker_id.into(),
        }
    }

    /// Create the path of a composite cooker.
    pub fn composite(cooker_id: impl Into<String>) -> Self {
        Self {
            source_parser_id: None,
            cooker_id: cooker_id.into(),
        }
    }

    /// The source parser segment, if any.
    pub fn source_parser_id(&self) -> Option<&str> {
        self.source_parser_id.as_deref()
    }

    /// The cooker segment.
    pub fn cooker_id(&self) -> &str {
        &self.cooker_id
    }

    /// Whether this path denotes a composite cooker.
    pub fn is_composite(&self) -> bool {
        self.source_parser_id.is_none()
    }

    /// Whether either segment is empty (invalid for registration).
    pub fn has_empty_segment(&self) -> bool {
        self.cooker_id.is_empty()
            || self
                .source_parser_id
                .as_deref()
                .is_some_and(|p| p.is_empty())
    }

    /// The path of one of this cooker's named outputs.
    pub fn output(&self, output_id: impl Into<String>) -> OutputPath {
        OutputPath::new(self.clone(), output_id)
    }
}

impl fmt::Display for CookerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_parser_id {
            Some(parser) => write!(f, "{}/{}", parser, self.cooker_id),
            None => write!(f, "*/{}", self.cooker_id),
        }
    }
}

/// Opaque identity of a data-processor extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DataProcessorId(String);

impl DataProcessorId {
    /// Create a new processor id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (invalid for registration).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DataProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identity of a table extension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableId(String);

impl TableId {
    /// Create a new table id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the id is empty (invalid for registration).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one named output exposed by a cooker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputPath {
    cooker: CookerPath,
    output_id: String,
}

impl OutputPath {
    /// Create a new output path.
    pub fn new(cooker: CookerPath, output_id: impl Into<String>) -> Self {
        Self {
            cooker,
            output_id: output_id.into(),
        }
    }

    /// The producing cooker's path.
    pub fn cooker(&self) -> &CookerPath {
        &self.cooker
    }

    /// The output segment.
    pub fn output_id(&self) -> &str {
        &self.output_id
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cooker, self.output_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_and_composite_display() {
        let source = CookerPath::source("etw", "process");
        assert_eq!(source.to_string(), "etw/process");
        assert!(!source.is_composite());

        let composite = CookerPath::composite("process-summary");
        assert_eq!(composite.to_string(), "*/process-summary");
        assert!(composite.is_composite());
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let mut paths = vec![
            CookerPath::source("etw", "b"),
            CookerPath::composite("a"),
            CookerPath::source("etw", "a"),
        ];
        paths.sort();

        // Composite paths (no parser segment) sort first, then by segments.
        assert_eq!(paths[0], CookerPath::composite("a"));
        assert_eq!(paths[1], CookerPath::source("etw", "a"));
        assert_eq!(paths[2], CookerPath::source("etw", "b"));
    }

    #[test]
    fn test_empty_segment_detection() {
        assert!(CookerPath::source("", "cooker").has_empty_segment());
        assert!(CookerPath::source("parser", "").has_empty_segment());
        assert!(!CookerPath::composite("cooker").has_empty_segment());
        assert!(DataProcessorId::new("").is_empty());
    }

    #[test]
    fn test_output_path_display() {
        let path = CookerPath::source("etw", "process").output("intervals");
        assert_eq!(path.to_string(), "etw/process/intervals");
        assert_eq!(path.output_id(), "intervals");
    }

    #[test]
    fn test_serde_round_trip() {
        let path = CookerPath::source("etw", "process");
        let json = serde_json::to_string(&path).unwrap();
        let back: CookerPath = serde_json::from_str(&json).unwrap();
        assert_eq!(path, back);
    }
}
