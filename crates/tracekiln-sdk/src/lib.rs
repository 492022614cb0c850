//! Extension contracts for the TraceKiln trace analysis SDK.
//!
//! This crate defines the narrow interfaces plugin authors implement to
//! contribute analysis extensions to a TraceKiln processing session:
//!
//! - **Source data cookers**: stateful transforms consuming keyed records
//!   emitted by a source parser and exposing named outputs.
//! - **Composite data cookers**: transforms built purely on other cookers'
//!   outputs, with no direct source dependency.
//! - **Data processors**: extensions whose output is computed lazily from
//!   runtime-supplied inputs.
//! - **Source parsers**: drivers that traverse a source and emit records
//!   into the dispatcher handed to them.
//!
//! The runtime (the `tracekiln-runtime` crate) resolves the dependency
//! graph formed by these extensions and schedules parsing passes so every
//! cooker observes records and upstream outputs in the order it declared.

pub mod cooker;
pub mod error;
pub mod output;
pub mod parser;
pub mod paths;
pub mod processor;
pub mod record;

pub use cooker::{
    CompositeDataCooker, CookerDescriptor, DependencyType, ProductionStrategy, SourceDataCooker,
};
pub use error::{ParseError, ProcessorError};
pub use output::{DataRetrieval, DataRetrievalExt, OutputSet, OutputValue};
pub use parser::{DispatchInterrupted, NoProgress, ProgressReporter, RecordDispatcher, SourceParser};
pub use paths::{CookerPath, DataProcessorId, OutputPath, TableId};
pub use processor::DataProcessor;
pub use record::{KeyedRecord, ProcessingResult, RecordContext, RequiredKeys};

// Re-exported so implementors do not need a direct tokio-util dependency.
pub use tokio_util::sync::CancellationToken;

/// SDK version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
