//! A scripted source parser for driving scheduler tests.

use crate::record::TestRecord;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracekiln_sdk::{
    CancellationToken, ParseError, ProgressReporter, RecordDispatcher, SourceParser,
};

/// Arguments of one `prepare` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareCall {
    /// Whether the pass consumes every record.
    pub all_events_consumed: bool,
    /// The requested keys.
    pub requested_keys: BTreeSet<String>,
}

/// A parser that replays a fixed record list on every pass and records
/// how it was driven.
pub struct ScriptedParser {
    id: String,
    max_passes: usize,
    records: Vec<TestRecord>,
    prepare_calls: Arc<Mutex<Vec<PrepareCall>>>,
    passes_processed: Arc<Mutex<usize>>,
}

impl ScriptedParser {
    /// Create a parser with the given id and record script.
    pub fn new(id: impl Into<String>, records: Vec<TestRecord>) -> Self {
        Self {
            id: id.into(),
            max_passes: 0,
            records,
            prepare_calls: Arc::new(Mutex::new(Vec::new())),
            passes_processed: Arc::new(Mutex::new(0)),
        }
    }

    /// Cap the number of passes the parser supports.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Handle observing the recorded `prepare` calls after the parser
    /// has been moved into a scheduler.
    pub fn prepare_calls(&self) -> Arc<Mutex<Vec<PrepareCall>>> {
        self.prepare_calls.clone()
    }

    /// Handle observing how many passes were processed.
    pub fn passes_processed(&self) -> Arc<Mutex<usize>> {
        self.passes_processed.clone()
    }
}

impl SourceParser for ScriptedParser {
    type Record = TestRecord;

    fn id(&self) -> &str {
        &self.id
    }

    fn max_passes(&self) -> usize {
        self.max_passes
    }

    fn prepare(&mut self, all_events_consumed: bool, requested_keys: &BTreeSet<String>) {
        self.prepare_calls.lock().push(PrepareCall {
            all_events_consumed,
            requested_keys: requested_keys.clone(),
        });
    }

    fn process_source(
        &mut self,
        dispatcher: &mut dyn RecordDispatcher<TestRecord>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), ParseError> {
        *self.passes_processed.lock() += 1;

        let total = self.records.len().max(1);
        for (index, record) in self.records.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }
            if dispatcher.process(record.clone()).is_err() {
                break;
            }
            progress.report((((index + 1) * 100) / total) as u8);
        }
        Ok(())
    }
}
