//! Scenario and step statistics

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use super::event::{Listener, RunEvent, StepStatus};

/// Counts by outcome
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub undefined: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.pending + self.skipped + self.undefined
    }

    pub fn record(&mut self, status: StepStatus) {
        match status {
            StepStatus::Passed => self.passed += 1,
            StepStatus::Failed => self.failed += 1,
            StepStatus::Pending => self.pending += 1,
            StepStatus::Skipped => self.skipped += 1,
            StepStatus::Undefined => self.undefined += 1,
        }
    }

    pub fn get(&self, status: StepStatus) -> usize {
        match status {
            StepStatus::Passed => self.passed,
            StepStatus::Failed => self.failed,
            StepStatus::Pending => self.pending,
            StepStatus::Skipped => self.skipped,
            StepStatus::Undefined => self.undefined,
        }
    }
}

impl AddAssign for OutcomeCounts {
    fn add_assign(&mut self, other: Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.pending += other.pending;
        self.skipped += other.skipped;
        self.undefined += other.undefined;
    }
}

/// Derive a scenario's outcome from its step outcomes.
///
/// Failure wins over undefined, undefined over pending; a scenario whose
/// steps were all skipped is skipped, anything else passed.
pub fn scenario_status(steps: impl IntoIterator<Item = StepStatus>) -> StepStatus {
    let mut counts = OutcomeCounts::default();
    for status in steps {
        counts.record(status);
    }

    if counts.failed > 0 {
        StepStatus::Failed
    } else if counts.undefined > 0 {
        StepStatus::Undefined
    } else if counts.pending > 0 {
        StepStatus::Pending
    } else if counts.total() > 0 && counts.skipped == counts.total() {
        StepStatus::Skipped
    } else {
        StepStatus::Passed
    }
}

/// Running tally fed from the event stream
#[derive(Clone, Debug, Default)]
pub struct StatsJournal {
    scenarios: OutcomeCounts,
    steps: OutcomeCounts,
    current: Vec<StepStatus>,
}

impl StatsJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scenarios(&self) -> OutcomeCounts {
        self.scenarios
    }

    pub fn steps(&self) -> OutcomeCounts {
        self.steps
    }
}

impl Listener for StatsJournal {
    fn hear(&mut self, event: &RunEvent<'_>) {
        match event {
            RunEvent::BeforeScenario(_) => self.current.clear(),
            RunEvent::StepResult { status, .. } => {
                self.steps.record(*status);
                self.current.push(*status);
            }
            RunEvent::AfterScenario(_) => {
                let status = scenario_status(self.current.drain(..));
                self.scenarios.record(status);
            }
            RunEvent::BeforeGrouping(_) | RunEvent::AfterGrouping(_) => {}
        }
    }
}
