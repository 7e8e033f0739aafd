//! spears - parallel/serial partitioning runner for Gherkin suites
//!
//! Scenarios annotated `@parallel-ok` are fanned out concurrently, one unit
//! per scenario; everything else runs afterwards, one grouping at a time, in
//! declaration order. Scenarios annotated `@ignore-if-parallel` are left out
//! of a partitioned run. Before the parallel phase a synthetic priming
//! scenario tagged `@first-parallel-scenario` gives hooks a chance to do
//! one-time setup.
//!
//! ## Layout
//!
//! - [`partition`] classifies scenarios and builds execution units
//! - [`executor`] holds the counter, the queue and the orchestrator
//! - [`engine`] parses `.feature` files and runs steps
//! - [`reporter`] turns engine events into per-unit and run-wide reports
//! - [`output`] renders reports

pub mod cli;
pub mod config;
pub mod demo;
pub mod engine;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod partition;
pub mod reporter;
pub mod utils;

pub use engine::{StepEngine, StepLibrary, StepOutcome, TestEngine};
pub use error::{CoordinationError, ParseError, Result, SpearsError, UnitExecutionError};
pub use executor::{ActionQueue, ExecutionCounter, Orchestrator};
pub use partition::{PartitionMode, PartitionVisitor};
pub use reporter::RunReport;
