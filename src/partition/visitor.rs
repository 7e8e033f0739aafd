//! Scenario partitioning
//!
//! Classifies every scenario of a tree into parallel or serial routing and
//! materializes the execution units. Each grouping is folded independently
//! into an immutable `GroupingPartition`; nothing survives between groupings
//! except what is accumulated into the `PartitionResult`.

use serde::Serialize;
use tracing::debug;

use crate::models::tag::{IGNORE_IF_PARALLEL, PARALLEL_IN_PROGRESS, PARALLEL_OK};
use crate::models::{ExecutionUnit, Grouping, GroupingInfo, SpecTree};

/// Routing policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartitionMode {
    /// Route `parallel-ok` scenarios to their own units
    #[default]
    Split,
    /// Everything runs through the serial path
    SerialOnly,
}

/// Partition of a single grouping
#[derive(Clone, Debug, Serialize)]
pub struct GroupingPartition {
    pub info: GroupingInfo,
    pub parallel_units: Vec<ExecutionUnit>,
    pub serial_unit: Option<ExecutionUnit>,
    pub parallel_count: usize,
    pub serial_count: usize,
    /// Names of `ignore-if-parallel` scenarios left out of both outputs
    pub dropped: Vec<String>,
}

/// Accumulated partitions of a whole tree
#[derive(Clone, Debug, Default, Serialize)]
pub struct PartitionResult {
    pub groupings: Vec<GroupingPartition>,
    pub parallel_total: usize,
    pub serial_total: usize,
}

impl PartitionResult {
    fn accumulate(mut self, partition: GroupingPartition) -> Self {
        self.parallel_total += partition.parallel_count;
        self.serial_total += partition.serial_count;
        self.groupings.push(partition);
        self
    }

    pub fn has_parallel_units(&self) -> bool {
        self.parallel_total > 0
    }

    pub fn dropped_total(&self) -> usize {
        self.groupings.iter().map(|g| g.dropped.len()).sum()
    }

    /// Split into (parallel units, serial units), both in declaration order
    pub fn into_units(self) -> (Vec<ExecutionUnit>, Vec<ExecutionUnit>) {
        let mut parallel = Vec::with_capacity(self.parallel_total);
        let mut serial = Vec::new();

        for grouping in self.groupings {
            parallel.extend(grouping.parallel_units);
            serial.extend(grouping.serial_unit);
        }

        (parallel, serial)
    }
}

/// Stateless tree walker producing partitions
#[derive(Clone, Copy, Debug, Default)]
pub struct PartitionVisitor {
    mode: PartitionMode,
}

impl PartitionVisitor {
    pub fn new(mode: PartitionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> PartitionMode {
        self.mode
    }

    /// Partition every grouping in declaration order
    pub fn visit_tree(&self, tree: SpecTree) -> PartitionResult {
        let result = tree
            .groupings
            .into_iter()
            .enumerate()
            .map(|(index, grouping)| self.visit_grouping(index, grouping))
            .fold(PartitionResult::default(), PartitionResult::accumulate);

        debug!(
            "Partitioned {} groupings: {} parallel, {} serial, {} dropped",
            result.groupings.len(),
            result.parallel_total,
            result.serial_total,
            result.dropped_total()
        );

        result
    }

    pub fn visit_grouping(&self, index: usize, grouping: Grouping) -> GroupingPartition {
        let Grouping {
            info,
            setup,
            scenarios,
        } = grouping;

        let mut parallel_units = Vec::new();
        let mut residual = Vec::new();
        let mut dropped = Vec::new();

        for mut scenario in scenarios {
            let parallel =
                self.mode == PartitionMode::Split && scenario.annotations.contains(PARALLEL_OK);

            if parallel {
                scenario.annotations.insert(PARALLEL_IN_PROGRESS);
                parallel_units.push(ExecutionUnit::parallel(
                    index,
                    info.clone(),
                    setup.clone(),
                    scenario,
                ));
            } else if self.mode == PartitionMode::Split
                && scenario.annotations.contains(IGNORE_IF_PARALLEL)
            {
                debug!("Dropping {} from {}", scenario.title(), info.title());
                dropped.push(scenario.name);
            } else {
                residual.push(scenario);
            }
        }

        let parallel_count = parallel_units.len();
        let serial_count = residual.len();
        let serial_unit = (!residual.is_empty())
            .then(|| ExecutionUnit::serial(index, info.clone(), setup, residual));

        GroupingPartition {
            info,
            parallel_units,
            serial_unit,
            parallel_count,
            serial_count,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Scenario, SharedSetup, Step, UnitMode};

    fn grouping(name: &str, scenarios: Vec<Scenario>) -> Grouping {
        let mut grouping = Grouping::new(GroupingInfo::new(name));
        grouping.scenarios = scenarios;
        grouping
    }

    fn names(unit: &ExecutionUnit) -> Vec<&str> {
        unit.scenarios().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_mixed_grouping() {
        let tree = SpecTree::new(vec![grouping(
            "Cart",
            vec![
                Scenario::new("read only").with_annotation("@parallel-ok"),
                Scenario::new("serial hook").with_annotation("@ignore-if-parallel"),
                Scenario::new("mutates fixtures"),
            ],
        )]);

        let result = PartitionVisitor::default().visit_tree(tree);

        assert_eq!(result.parallel_total, 1);
        assert_eq!(result.serial_total, 1);

        let partition = &result.groupings[0];
        assert_eq!(partition.parallel_units.len(), 1);
        assert_eq!(names(&partition.parallel_units[0]), vec!["read only"]);

        let serial = partition.serial_unit.as_ref().unwrap();
        assert_eq!(serial.mode(), UnitMode::Serial);
        assert_eq!(names(serial), vec!["mutates fixtures"]);
        assert_eq!(partition.dropped, vec!["serial hook".to_string()]);
    }

    #[test]
    fn test_parallel_scenarios_are_marked_in_progress() {
        let partition = PartitionVisitor::default().visit_grouping(
            0,
            grouping(
                "Search",
                vec![Scenario::new("query").with_annotation("parallel-ok")],
            ),
        );

        let scenario = &partition.parallel_units[0].scenarios()[0];
        assert!(scenario.annotations.contains(PARALLEL_IN_PROGRESS));
        assert!(partition.serial_unit.is_none());
    }

    #[test]
    fn test_redundant_parallel_tag_routes_once() {
        let mut scenario = Scenario::new("dup");
        scenario.annotations = crate::models::Annotations::new(["@parallel-ok", "parallel-ok"]);

        let partition = PartitionVisitor::default().visit_grouping(0, grouping("g", vec![scenario]));
        assert_eq!(partition.parallel_units.len(), 1);
        assert_eq!(partition.parallel_count, 1);
    }

    #[test]
    fn test_no_serial_unit_without_residual() {
        let partition = PartitionVisitor::default().visit_grouping(
            0,
            grouping(
                "g",
                vec![
                    Scenario::new("a").with_annotation("parallel-ok"),
                    Scenario::new("b").with_annotation("ignore-if-parallel"),
                ],
            ),
        );
        assert!(partition.serial_unit.is_none());
        assert_eq!(partition.serial_count, 0);
    }

    #[test]
    fn test_ignore_if_parallel_dropped_without_parallel_siblings() {
        let partition = PartitionVisitor::default().visit_grouping(
            0,
            grouping(
                "g",
                vec![
                    Scenario::new("hook").with_annotation("ignore-if-parallel"),
                    Scenario::new("plain"),
                ],
            ),
        );
        assert_eq!(partition.dropped, vec!["hook".to_string()]);
        assert_eq!(names(partition.serial_unit.as_ref().unwrap()), vec!["plain"]);
    }

    #[test]
    fn test_shared_setup_travels_with_every_unit() {
        let setup = SharedSetup::new(vec![Step::new("Given ", "a background step")]);
        let g = grouping(
            "g",
            vec![
                Scenario::new("a").with_annotation("parallel-ok"),
                Scenario::new("b").with_annotation("parallel-ok"),
                Scenario::new("c"),
            ],
        )
        .with_setup(setup.clone());

        let partition = PartitionVisitor::default().visit_grouping(3, g);
        for unit in &partition.parallel_units {
            assert_eq!(unit.setup(), Some(&setup));
            assert_eq!(unit.grouping_index(), 3);
        }
        assert_eq!(partition.serial_unit.unwrap().setup(), Some(&setup));
    }

    #[test]
    fn test_counters_reset_per_grouping() {
        let tree = SpecTree::new(vec![
            grouping(
                "first",
                vec![
                    Scenario::new("a").with_annotation("parallel-ok"),
                    Scenario::new("b").with_annotation("parallel-ok"),
                ],
            ),
            grouping("second", vec![Scenario::new("c"), Scenario::new("d")]),
        ]);

        let result = PartitionVisitor::default().visit_tree(tree);
        assert_eq!(result.groupings[0].parallel_count, 2);
        assert_eq!(result.groupings[0].serial_count, 0);
        assert_eq!(result.groupings[1].parallel_count, 0);
        assert_eq!(result.groupings[1].serial_count, 2);
        assert_eq!(result.parallel_total, 2);
        assert_eq!(result.serial_total, 2);
    }

    #[test]
    fn test_every_scenario_lands_exactly_once() {
        let tags: [&[&str]; 5] = [
            &["parallel-ok"],
            &["ignore-if-parallel"],
            &[],
            &["parallel-ok", "ignore-if-parallel"],
            &["slow"],
        ];

        let mut groupings = Vec::new();
        for g in 0..4 {
            let scenarios = (0..10)
                .map(|i| {
                    let mut s = Scenario::new(format!("g{g}-s{i}"));
                    for tag in tags[(g + i) % tags.len()] {
                        s.annotations.insert(tag);
                    }
                    s
                })
                .collect();
            groupings.push(grouping(&format!("g{g}"), scenarios));
        }
        let tree = SpecTree::new(groupings);

        let expected_dropped: Vec<String> = tree
            .groupings
            .iter()
            .flat_map(|g| g.scenarios.iter())
            .filter(|s| {
                s.annotations.contains(IGNORE_IF_PARALLEL) && !s.annotations.contains(PARALLEL_OK)
            })
            .map(|s| s.name.clone())
            .collect();
        let total = tree.scenario_count();

        let result = PartitionVisitor::default().visit_tree(tree);
        assert_eq!(result.dropped_total(), expected_dropped.len());

        let (parallel, serial) = result.into_units();
        let mut seen: Vec<String> = parallel
            .iter()
            .chain(serial.iter())
            .flat_map(|u| u.scenarios().iter().map(|s| s.name.clone()))
            .collect();

        assert!(parallel.iter().all(|u| u.scenarios().len() == 1));
        assert_eq!(seen.len() + expected_dropped.len(), total);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len() + expected_dropped.len(), total);
        assert!(expected_dropped.iter().all(|name| !seen.contains(name)));
    }

    #[test]
    fn test_serial_only_mode_keeps_everything_serial() {
        let partition = PartitionVisitor::new(PartitionMode::SerialOnly).visit_grouping(
            0,
            grouping(
                "g",
                vec![
                    Scenario::new("a").with_annotation("parallel-ok"),
                    Scenario::new("b").with_annotation("ignore-if-parallel"),
                    Scenario::new("c"),
                ],
            ),
        );

        assert!(partition.parallel_units.is_empty());
        assert!(partition.dropped.is_empty());
        let serial = partition.serial_unit.unwrap();
        assert_eq!(names(&serial), vec!["a", "b", "c"]);
        assert!(!serial.scenarios()[0]
            .annotations
            .contains(PARALLEL_IN_PROGRESS));
    }
}
