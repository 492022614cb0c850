//! The record type used throughout the test suites.

use tracekiln_sdk::KeyedRecord;

/// A minimal keyed record: a numeric id routed by a string key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRecord {
    /// Application-level identity carried by the record.
    pub id: u64,
    /// Routing key.
    pub key: String,
}

impl TestRecord {
    /// Create a new test record.
    pub fn new(id: u64, key: impl Into<String>) -> Self {
        Self {
            id,
            key: key.into(),
        }
    }
}

impl KeyedRecord for TestRecord {
    type Key = String;

    fn key(&self) -> String {
        self.key.clone()
    }
}
