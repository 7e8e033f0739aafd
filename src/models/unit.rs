//! Execution units
//!
//! The minimal package of grouping identity plus scenarios handed to the
//! test engine. Units are built once and only read afterwards.

use serde::Serialize;
use std::fmt;

use super::tag::FIRST_PARALLEL_SCENARIO;
use super::tree::{Grouping, GroupingInfo, Scenario, SharedSetup};

/// How a unit was routed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitMode {
    Parallel,
    Serial,
    Priming,
    Direct,
}

impl UnitMode {
    pub fn name(&self) -> &'static str {
        match self {
            UnitMode::Parallel => "parallel",
            UnitMode::Serial => "serial",
            UnitMode::Priming => "priming",
            UnitMode::Direct => "direct",
        }
    }
}

impl fmt::Display for UnitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ExecutionUnit {
    mode: UnitMode,
    grouping_index: usize,
    grouping: GroupingInfo,
    setup: Option<SharedSetup>,
    scenarios: Vec<Scenario>,
}

impl ExecutionUnit {
    /// Single-scenario unit for concurrent execution
    pub fn parallel(
        grouping_index: usize,
        grouping: GroupingInfo,
        setup: Option<SharedSetup>,
        scenario: Scenario,
    ) -> Self {
        Self {
            mode: UnitMode::Parallel,
            grouping_index,
            grouping,
            setup,
            scenarios: vec![scenario],
        }
    }

    /// Ordered residual scenarios of one grouping
    pub fn serial(
        grouping_index: usize,
        grouping: GroupingInfo,
        setup: Option<SharedSetup>,
        scenarios: Vec<Scenario>,
    ) -> Self {
        Self {
            mode: UnitMode::Serial,
            grouping_index,
            grouping,
            setup,
            scenarios,
        }
    }

    /// A grouping passed through untouched
    pub fn direct(grouping_index: usize, grouping: Grouping) -> Self {
        Self {
            mode: UnitMode::Direct,
            grouping_index,
            grouping: grouping.info,
            setup: grouping.setup,
            scenarios: grouping.scenarios,
        }
    }

    /// Synthetic step-less scenario that lets hooks run once before fan-out
    pub fn priming() -> Self {
        let mut grouping = GroupingInfo::new("Parallel priming");
        grouping.uri = "<priming>".to_string();

        let scenario = Scenario::new("Prepare parallel execution")
            .with_annotation(FIRST_PARALLEL_SCENARIO)
            .located("<priming>", 1);

        Self {
            mode: UnitMode::Priming,
            grouping_index: 0,
            grouping,
            setup: None,
            scenarios: vec![scenario],
        }
    }

    pub fn mode(&self) -> UnitMode {
        self.mode
    }

    pub fn grouping_index(&self) -> usize {
        self.grouping_index
    }

    pub fn grouping(&self) -> &GroupingInfo {
        &self.grouping
    }

    pub fn setup(&self) -> Option<&SharedSetup> {
        self.setup.as_ref()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Short human label used in logs and error messages
    pub fn label(&self) -> String {
        match (self.mode, self.scenarios.as_slice()) {
            (UnitMode::Parallel, [scenario]) => {
                format!("{} / {}", self.grouping.title(), scenario.name)
            }
            _ => format!("{} [{}]", self.grouping.title(), self.mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priming_unit_shape() {
        let unit = ExecutionUnit::priming();
        assert_eq!(unit.mode(), UnitMode::Priming);
        assert_eq!(unit.scenarios().len(), 1);
        assert!(unit.scenarios()[0].steps.is_empty());
        assert!(unit.scenarios()[0]
            .annotations
            .contains(FIRST_PARALLEL_SCENARIO));
        assert!(unit.setup().is_none());
    }

    #[test]
    fn test_unit_labels() {
        let info = GroupingInfo::new("Cart");
        let parallel =
            ExecutionUnit::parallel(0, info.clone(), None, Scenario::new("Add item"));
        assert_eq!(parallel.label(), "Feature: Cart / Add item");

        let serial = ExecutionUnit::serial(0, info, None, vec![Scenario::new("a")]);
        assert_eq!(serial.label(), "Feature: Cart [serial]");
    }
}
