//! Result reporting
//!
//! Consumes the engine's lifecycle events per unit and merges the unit
//! reports into a single run report.

mod aggregate;
mod event;
mod stats;
mod unit;

pub use aggregate::{RunAggregator, RunReport};
pub use event::{EventKind, Listener, RunEvent, StepStatus};
pub use stats::{scenario_status, OutcomeCounts, StatsJournal};
pub use unit::{snippet, ScenarioRecord, StepRecord, UnitReport, UnitReporter};
