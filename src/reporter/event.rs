//! Lifecycle events emitted by the test engine

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{GroupingInfo, Scenario, Step};

/// Outcome of a single step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Pending,
    Skipped,
    Undefined,
}

impl StepStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            StepStatus::Passed => "✓",
            StepStatus::Failed => "✗",
            StepStatus::Pending => "?",
            StepStatus::Skipped => "-",
            StepStatus::Undefined => "U",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Passed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Passed => write!(f, "passed"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Skipped => write!(f, "skipped"),
            StepStatus::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    BeforeGrouping,
    BeforeScenario,
    StepResult,
    AfterScenario,
    AfterGrouping,
}

#[derive(Clone, Debug)]
pub enum RunEvent<'a> {
    BeforeGrouping(&'a GroupingInfo),
    BeforeScenario(&'a Scenario),
    StepResult {
        step: &'a Step,
        status: StepStatus,
        failure: Option<String>,
    },
    AfterScenario(&'a Scenario),
    AfterGrouping(&'a GroupingInfo),
}

impl RunEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::BeforeGrouping(_) => EventKind::BeforeGrouping,
            RunEvent::BeforeScenario(_) => EventKind::BeforeScenario,
            RunEvent::StepResult { .. } => EventKind::StepResult,
            RunEvent::AfterScenario(_) => EventKind::AfterScenario,
            RunEvent::AfterGrouping(_) => EventKind::AfterGrouping,
        }
    }
}

/// Anything that consumes the engine's event stream
pub trait Listener {
    fn hear(&mut self, event: &RunEvent<'_>);
}
