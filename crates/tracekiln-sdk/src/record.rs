//! Record and key contracts shared by parsers and cookers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

/// A source record carrying a routing key.
///
/// Parsers emit records of one concrete type per source; the scheduler
/// routes each record to the cookers whose [`RequiredKeys`] include the
/// record's key.
pub trait KeyedRecord: Send {
    /// Key type used for routing.
    type Key: Eq + Ord + Hash + Clone + fmt::Debug + Send + Sync;

    /// The routing key of this record.
    fn key(&self) -> Self::Key;
}

/// The set of record keys a cooker wants delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredKeys<K> {
    /// The cooker consumes every record regardless of key.
    All,
    /// The cooker consumes only records with one of these keys.
    Keys(BTreeSet<K>),
}

impl<K: Ord + Clone> RequiredKeys<K> {
    /// Build a key set from an iterator of keys.
    pub fn keys(keys: impl IntoIterator<Item = K>) -> Self {
        Self::Keys(keys.into_iter().collect())
    }

    /// Whether a record with the given key should be delivered.
    pub fn wants(&self, key: &K) -> bool {
        match self {
            Self::All => true,
            Self::Keys(keys) => keys.contains(key),
        }
    }

    /// Whether this set consumes all keys.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Fold another key set into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&mut *self, other) {
            (Self::All, _) => {}
            (_, Self::All) => *self = Self::All,
            (Self::Keys(mine), Self::Keys(theirs)) => {
                mine.extend(theirs.iter().cloned());
            }
        }
    }
}

impl<K> Default for RequiredKeys<K> {
    fn default() -> Self {
        Self::Keys(BTreeSet::new())
    }
}

/// Outcome of delivering one record to one cooker.
///
/// `CorruptData` signals a cooker-level data-integrity problem; it is
/// surfaced in the session diagnostics but does not abort the pass.
/// `Ignored` carries no diagnostic weight.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingResult {
    /// The record was consumed.
    Processed,
    /// The record was not relevant to the cooker.
    Ignored,
    /// The record was relevant but its payload was malformed.
    CorruptData,
}

/// Per-record context handed to a cooker alongside the record.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pass_index: usize,
    record_index: u64,
    source_parser_id: String,
}

impl RecordContext {
    /// Create a new record context.
    pub fn new(source_parser_id: impl Into<String>, pass_index: usize, record_index: u64) -> Self {
        Self {
            pass_index,
            record_index,
            source_parser_id: source_parser_id.into(),
        }
    }

    /// Zero-based index of the current parsing pass.
    pub fn pass_index(&self) -> usize {
        self.pass_index
    }

    /// Zero-based index of the record within the current pass.
    pub fn record_index(&self) -> u64 {
        self.record_index
    }

    /// Id of the parser that emitted the record.
    pub fn source_parser_id(&self) -> &str {
        &self.source_parser_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_keys_wants() {
        let keys = RequiredKeys::keys(["Load".to_string(), "Unload".to_string()]);
        assert!(keys.wants(&"Load".to_string()));
        assert!(!keys.wants(&"Open".to_string()));
        assert!(RequiredKeys::<String>::All.wants(&"anything".to_string()));
    }

    #[test]
    fn test_required_keys_merge() {
        let mut union = RequiredKeys::keys(["a".to_string()]);
        union.merge(&RequiredKeys::keys(["b".to_string()]));
        assert!(union.wants(&"a".to_string()));
        assert!(union.wants(&"b".to_string()));

        union.merge(&RequiredKeys::All);
        assert!(union.is_all());
    }
}
