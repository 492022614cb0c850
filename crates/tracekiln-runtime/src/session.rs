//! Source cooking sessions.
//!
//! A [`SourceCookingScheduler`] drives one source parser through the
//! passes computed by the pass planner, dispatching each record to the
//! interested cookers in dependency order and finalizing every cooker
//! exactly once. Session state is created per session and never reused.

use crate::error::{Result, RuntimeError};
use crate::schedule::{plan_passes, PassPlan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracekiln_sdk::{
    CookerPath, DispatchInterrupted, KeyedRecord, OutputPath, OutputValue, ProcessingResult,
    ProgressReporter, RecordContext, RecordDispatcher, RequiredKeys, SourceDataCooker,
    SourceParser,
};
use uuid::Uuid;

/// How a session ended. Cancellation is an outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every pass ran to completion and every cooker finalized.
    Completed,
    /// Cancellation was observed; dispatch stopped promptly.
    Cancelled,
}

/// Per-cooker tally of processing results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookerStats {
    /// Records the cooker consumed.
    pub processed: u64,
    /// Records delivered but not relevant (plus key-filtered skips carry
    /// no weight and are not counted here).
    pub ignored: u64,
    /// Records the cooker flagged as corrupt.
    pub corrupt: u64,
}

/// One corrupt-record diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptRecord {
    /// The cooker that flagged the record.
    pub cooker: CookerPath,
    /// Pass in which the record was dispatched.
    pub pass_index: usize,
    /// Index of the record within that pass.
    pub record_index: u64,
}

/// The result of one source cooking session.
pub struct SessionResult {
    session_id: Uuid,
    parser_id: String,
    outcome: SessionOutcome,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    passes_run: usize,
    total_passes: usize,
    stats: BTreeMap<CookerPath, CookerStats>,
    corrupt_records: Vec<CorruptRecord>,
    outputs: BTreeMap<OutputPath, OutputValue>,
    finalized: BTreeSet<CookerPath>,
}

impl SessionResult {
    /// Unique id of this session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Id of the parsed source.
    pub fn parser_id(&self) -> &str {
        &self.parser_id
    }

    /// How the session ended.
    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    /// When the session started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the session finished.
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Passes that ran (fully or partially).
    pub fn passes_run(&self) -> usize {
        self.passes_run
    }

    /// Passes the plan scheduled.
    pub fn total_passes(&self) -> usize {
        self.total_passes
    }

    /// Per-cooker processing tallies.
    pub fn stats(&self) -> &BTreeMap<CookerPath, CookerStats> {
        &self.stats
    }

    /// Corrupt-record diagnostics, in dispatch order.
    pub fn corrupt_records(&self) -> &[CorruptRecord] {
        &self.corrupt_records
    }

    /// Cookers that received their end-of-pass call. On a completed
    /// session this covers every cooker; on a cancelled one it tells the
    /// caller which outputs are coherent.
    pub fn finalized_cookers(&self) -> &BTreeSet<CookerPath> {
        &self.finalized
    }

    /// All cooked outputs, keyed by output path.
    pub fn outputs(&self) -> &BTreeMap<OutputPath, OutputValue> {
        &self.outputs
    }

    /// Look up and downcast one output.
    pub fn query_output<T: Send + Sync + 'static>(&self, path: &OutputPath) -> Result<Arc<T>> {
        let value = self
            .outputs
            .get(path)
            .ok_or_else(|| RuntimeError::UnknownOutput(path.clone()))?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| RuntimeError::OutputTypeMismatch(path.clone()))
    }
}

impl std::fmt::Debug for SessionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResult")
            .field("session_id", &self.session_id)
            .field("parser_id", &self.parser_id)
            .field("outcome", &self.outcome)
            .field("passes_run", &self.passes_run)
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// Drives one source parser and its enabled cookers through a session.
pub struct SourceCookingScheduler<P: SourceParser> {
    parser: P,
    cookers: Vec<Box<dyn SourceDataCooker<P::Record>>>,
    progress: Option<Arc<dyn ProgressReporter>>,
    cancel: CancellationToken,
}

impl<P: SourceParser> SourceCookingScheduler<P> {
    /// Create a scheduler for one parser with no cookers attached.
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            cookers: Vec::new(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an enabled cooker.
    pub fn with_cooker(mut self, cooker: Box<dyn SourceDataCooker<P::Record>>) -> Self {
        self.cookers.push(cooker);
        self
    }

    /// Attach several enabled cookers.
    pub fn with_cookers(
        mut self,
        cookers: impl IntoIterator<Item = Box<dyn SourceDataCooker<P::Record>>>,
    ) -> Self {
        self.cookers.extend(cookers);
        self
    }

    /// Attach a progress sink receiving 0-100 aggregated across passes.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attach a cancellation token checked between records and passes.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the session to completion or cancellation.
    pub fn run(mut self) -> Result<SessionResult> {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        let parser_id = self.parser.id().to_string();

        let descriptors: Vec<_> = self.cookers.iter().map(|c| c.descriptor().clone()).collect();
        let descriptor_refs: Vec<_> = descriptors.iter().collect();
        let plan: PassPlan<<P::Record as KeyedRecord>::Key> =
            plan_passes(&parser_id, self.parser.max_passes(), &descriptor_refs)?;

        tracing::info!(
            %session_id,
            parser = %parser_id,
            cookers = self.cookers.len(),
            passes = plan.total_passes(),
            "starting source cooking session"
        );

        let progress = SessionProgress::new(plan.total_passes(), self.progress.clone());
        let mut stats: BTreeMap<CookerPath, CookerStats> = descriptors
            .iter()
            .map(|d| (d.path().clone(), CookerStats::default()))
            .collect();
        let mut corrupt_records = Vec::new();
        let mut finalized = BTreeSet::new();
        let mut passes_run = 0;
        let mut cancelled = false;

        'passes: for (pass_index, pass) in plan.passes().iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            progress.enter_pass(pass_index);
            tracing::debug!(parser = %parser_id, pass = pass_index, "starting pass");

            match pass.keys() {
                RequiredKeys::All => self.parser.prepare(true, &BTreeSet::new()),
                RequiredKeys::Keys(keys) => self.parser.prepare(false, keys),
            }

            {
                let mut dispatcher = PassDispatcher {
                    cookers: &mut self.cookers,
                    dispatch_order: pass.dispatch_order(),
                    parser_id: &parser_id,
                    pass_index,
                    record_index: 0,
                    stats: &mut stats,
                    corrupt_records: &mut corrupt_records,
                    cancel: &self.cancel,
                };
                self.parser
                    .process_source(&mut dispatcher, &progress, &self.cancel)?;
            }

            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            for &idx in pass.finalize_order() {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break 'passes;
                }
                self.cookers[idx].end_of_pass(&self.cancel);
                finalized.insert(descriptors[idx].path().clone());
            }

            passes_run += 1;
        }

        let outcome = if cancelled {
            SessionOutcome::Cancelled
        } else {
            progress.finish();
            SessionOutcome::Completed
        };

        let mut outputs = BTreeMap::new();
        for cooker in &self.cookers {
            let path = cooker.descriptor().path().clone();
            for (output_id, value) in cooker.outputs().iter() {
                outputs.insert(path.output(output_id), Arc::clone(value));
            }
        }

        tracing::info!(
            %session_id,
            parser = %parser_id,
            ?outcome,
            passes_run,
            outputs = outputs.len(),
            corrupt = corrupt_records.len(),
            "source cooking session finished"
        );

        Ok(SessionResult {
            session_id,
            parser_id,
            outcome,
            started_at,
            finished_at: Utc::now(),
            passes_run,
            total_passes: plan.total_passes(),
            stats,
            corrupt_records,
            outputs,
            finalized,
        })
    }
}

/// Routes one pass's records to its cookers in dispatch order.
struct PassDispatcher<'a, R: KeyedRecord> {
    cookers: &'a mut [Box<dyn SourceDataCooker<R>>],
    dispatch_order: &'a [usize],
    parser_id: &'a str,
    pass_index: usize,
    record_index: u64,
    stats: &'a mut BTreeMap<CookerPath, CookerStats>,
    corrupt_records: &'a mut Vec<CorruptRecord>,
    cancel: &'a CancellationToken,
}

impl<R: KeyedRecord> RecordDispatcher<R> for PassDispatcher<'_, R> {
    fn process(&mut self, record: R) -> std::result::Result<(), DispatchInterrupted> {
        if self.cancel.is_cancelled() {
            return Err(DispatchInterrupted);
        }

        let key = record.key();
        let context = RecordContext::new(self.parser_id, self.pass_index, self.record_index);

        for &idx in self.dispatch_order {
            let cooker = &mut self.cookers[idx];
            if !cooker.descriptor().required_keys().wants(&key) {
                continue;
            }
            let path = cooker.descriptor().path().clone();
            let result = cooker.cook(&record, &context, self.cancel);
            let entry = self.stats.entry(path.clone()).or_default();
            match result {
                ProcessingResult::Processed => entry.processed += 1,
                ProcessingResult::Ignored => entry.ignored += 1,
                ProcessingResult::CorruptData => {
                    entry.corrupt += 1;
                    tracing::warn!(
                        cooker = %path,
                        pass = self.pass_index,
                        record = self.record_index,
                        "cooker flagged corrupt record"
                    );
                    self.corrupt_records.push(CorruptRecord {
                        cooker: path,
                        pass_index: self.pass_index,
                        record_index: self.record_index,
                    });
                }
                _ => entry.ignored += 1,
            }
        }

        self.record_index += 1;
        Ok(())
    }
}

/// Maps within-pass progress onto a session-wide 0-100 scale.
struct SessionProgress {
    current_pass: AtomicUsize,
    total_passes: usize,
    inner: Option<Arc<dyn ProgressReporter>>,
}

impl SessionProgress {
    fn new(total_passes: usize, inner: Option<Arc<dyn ProgressReporter>>) -> Self {
        Self {
            current_pass: AtomicUsize::new(0),
            total_passes: total_passes.max(1),
            inner,
        }
    }

    fn enter_pass(&self, pass_index: usize) {
        self.current_pass.store(pass_index, Ordering::Relaxed);
        self.report(0);
    }

    fn finish(&self) {
        if let Some(inner) = &self.inner {
            inner.report(100);
        }
    }
}

impl ProgressReporter for SessionProgress {
    fn report(&self, percent: u8) {
        let Some(inner) = &self.inner else {
            return;
        };
        let pass = self.current_pass.load(Ordering::Relaxed);
        let within = usize::from(percent.min(100));
        let overall = (pass * 100 + within) / self.total_passes;
        inner.report(overall.min(100) as u8);
    }
}
