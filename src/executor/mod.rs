//! Test execution
//!
//! Coordination primitives plus the orchestrator that sequences a run:
//! the counter joins the parallel fan-out, the queue drains serial units.

pub mod counter;
mod orchestrator;
pub mod queue;

pub use counter::{CounterCompletion, CounterOutcome, ExecutionCounter};
pub use orchestrator::Orchestrator;
pub use queue::{Action, ActionArity, ActionFuture, ActionQueue, QueueSignal};
