//! TraceKiln runtime: dependency resolution and source cooking.
//!
//! This crate consumes the extension contracts from `tracekiln-sdk` and
//! provides the two subsystems a processing session is built on:
//!
//! - **Dependency-closure resolution**: every discovered extension is
//!   registered in an [`ExtensionRepository`]; [`resolve`] walks the
//!   repository once, assigning each extension a final [`Availability`]
//!   (cycle-aware, memoized, with per-extension diagnostics).
//! - **Source cooking**: a [`SourceCookingScheduler`] plans one or more
//!   parsing passes over a source, dispatches each record to the
//!   interested cookers in dependency order, and finalizes every cooker
//!   exactly once per session.
//!
//! Above those sit the [`ProcessorCache`] (exactly-once lazy processor
//! initialization), [`CookedDataRetrieval`] plus [`run_composites`] for
//! composite cookers, and [`run_sources`] for driving independent
//! sources concurrently.
//!
//! ## Example
//!
//! ```no_run
//! use tracekiln_runtime::{resolve, ExtensionReference, ExtensionRepository, ExtensionId};
//! use tracekiln_sdk::CookerPath;
//!
//! # fn main() -> tracekiln_runtime::Result<()> {
//! let mut repository = ExtensionRepository::new();
//! repository.register(ExtensionReference::new(ExtensionId::source_cooker(
//!     CookerPath::source("etw", "process"),
//! )))?;
//!
//! let report = resolve(&mut repository);
//! println!("{}", report.format_message());
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod processors;
pub mod reference;
pub mod repository;
pub mod resolver;
pub mod schedule;
pub mod session;

pub use engine::{run_composites, run_sources, CookedDataRetrieval};
pub use error::{Result, RuntimeError};
pub use processors::ProcessorCache;
pub use reference::{Availability, ExtensionId, ExtensionReference};
pub use repository::ExtensionRepository;
pub use resolver::{resolve, ResolutionReport};
pub use schedule::{plan_passes, PassPlan, PassSpec};
pub use session::{
    CookerStats, CorruptRecord, SessionOutcome, SessionResult, SourceCookingScheduler,
};

/// Runtime version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
