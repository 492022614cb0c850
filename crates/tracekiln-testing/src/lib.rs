//! Testing utilities for TraceKiln
//!
//! This crate provides test doubles shared by the runtime's test suites:
//! - A scripted source parser replaying a fixed record list each pass
//! - A recording cooker journaling cook and finalization order
//! - A collecting progress sink

pub mod cooker;
pub mod journal;
pub mod parser;
pub mod record;

pub use cooker::RecordingCooker;
pub use journal::{CollectingProgress, Journal};
pub use parser::{PrepareCall, ScriptedParser};
pub use record::TestRecord;
