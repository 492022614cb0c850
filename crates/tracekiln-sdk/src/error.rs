//! Error types raised by extension implementations.

/// Errors a source parser can raise while traversing a source.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The source could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source is structurally malformed beyond recovery.
    #[error("Malformed source: {0}")]
    MalformedSource(String),

    /// Other parser failure.
    #[error("Parse error: {0}")]
    Other(String),
}

impl ParseError {
    /// Create a malformed-source error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedSource(msg.into())
    }

    /// Create a generic parse error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Errors a data processor can raise during initialization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProcessorError {
    /// A required output was absent from the supplied data.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Initialization failed.
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
}

impl ProcessorError {
    /// Create a missing-input error.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Create an initialization error.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }
}
