//! Shared journals for asserting call order across test doubles.

use parking_lot::Mutex;
use std::sync::Arc;
use tracekiln_sdk::ProgressReporter;

/// An append-only, clone-shareable event journal.
#[derive(Debug, Default, Clone)]
pub struct Journal {
    events: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one event.
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Snapshot the recorded events.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    /// Position of the first event equal to `event`, if recorded.
    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    /// Assert that `earlier` was recorded before `later`.
    pub fn assert_order(&self, earlier: &str, later: &str) {
        let events = self.events.lock();
        let a = events
            .iter()
            .position(|e| e == earlier)
            .unwrap_or_else(|| panic!("event '{earlier}' not recorded in {events:?}"));
        let b = events
            .iter()
            .position(|e| e == later)
            .unwrap_or_else(|| panic!("event '{later}' not recorded in {events:?}"));
        assert!(
            a < b,
            "expected '{earlier}' (index {a}) before '{later}' (index {b}) in {events:?}"
        );
    }
}

/// A progress sink collecting every reported percentage.
#[derive(Debug, Default, Clone)]
pub struct CollectingProgress {
    reports: Arc<Mutex<Vec<u8>>>,
}

impl CollectingProgress {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the reported percentages, in order.
    pub fn reports(&self) -> Vec<u8> {
        self.reports.lock().clone()
    }

    /// The last reported percentage, if any.
    pub fn last(&self) -> Option<u8> {
        self.reports.lock().last().copied()
    }
}

impl ProgressReporter for CollectingProgress {
    fn report(&self, percent: u8) {
        self.reports.lock().push(percent);
    }
}
