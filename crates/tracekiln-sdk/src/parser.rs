//! Source parser contract and the dispatcher/progress seams the runtime
//! hands to it.

use crate::error::ParseError;
use crate::record::KeyedRecord;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;

/// Signal returned by the dispatcher when the session wants the parser to
/// stop emitting records (cancellation observed mid-pass).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchInterrupted;

/// The record sink a parser feeds during one pass.
pub trait RecordDispatcher<R: KeyedRecord> {
    /// Deliver one record to the interested cookers.
    ///
    /// Returns `Err(DispatchInterrupted)` when the parser must stop the
    /// pass early; the parser should return from `process_source`
    /// promptly without treating this as a failure.
    fn process(&mut self, record: R) -> Result<(), DispatchInterrupted>;
}

/// Within-pass progress sink, 0-100.
pub trait ProgressReporter: Send + Sync {
    /// Report progress through the current pass as a 0-100 percentage.
    fn report(&self, percent: u8);
}

/// A driver that traverses one source and emits keyed records.
///
/// The runtime calls `prepare` before each pass with the union of keys
/// requested by that pass's cookers, then `process_source` once per pass.
pub trait SourceParser: Send {
    /// The record type this parser emits.
    type Record: KeyedRecord;

    /// Stable identity of the parser; forms the parser segment of its
    /// cookers' paths.
    fn id(&self) -> &str;

    /// Maximum number of passes this parser supports; `0` means no cap.
    fn max_passes(&self) -> usize {
        0
    }

    /// Announce the keys the next pass will consume so the parser can
    /// skip irrelevant records cheaply. When `all_events_consumed` is
    /// true the key set is not exhaustive and every record must be
    /// emitted.
    fn prepare(
        &mut self,
        all_events_consumed: bool,
        requested_keys: &BTreeSet<<Self::Record as KeyedRecord>::Key>,
    );

    /// Traverse the source once, feeding every emitted record to the
    /// dispatcher and reporting within-pass progress.
    fn process_source(
        &mut self,
        dispatcher: &mut dyn RecordDispatcher<Self::Record>,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<(), ParseError>;
}

/// A progress sink that discards reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _percent: u8) {}
}
