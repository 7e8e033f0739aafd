//! Run-wide aggregation of unit reports
//!
//! A fresh aggregator is built for every run and owned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::error::UnitExecutionError;

use super::stats::OutcomeCounts;
use super::unit::UnitReport;

/// Final result of a run
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub parallel_scenarios: usize,
    pub serial_scenarios: usize,
    pub dropped_scenarios: usize,
    pub scenarios: OutcomeCounts,
    pub steps: OutcomeCounts,
    pub parallel_duration_ms: u64,
    pub serial_duration_ms: u64,
    pub units: Vec<UnitReport>,
    pub failed_log: Vec<String>,
    pub snippets: Vec<String>,
    pub unit_errors: Vec<String>,
    pub priming_error: Option<String>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.scenarios.failed == 0
            && self.steps.failed == 0
            && self.unit_errors.is_empty()
            && self.priming_error.is_none()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.parallel_duration_ms + self.serial_duration_ms
    }

    /// Unit reports regrouped by source grouping, merge order kept within one
    pub fn units_by_grouping(&self) -> Vec<&UnitReport> {
        let mut units: Vec<&UnitReport> = self.units.iter().collect();
        units.sort_by_key(|u| u.grouping_index);
        units
    }
}

#[derive(Debug)]
pub struct RunAggregator {
    report: RunReport,
}

impl RunAggregator {
    pub fn new(parallel_scenarios: usize, serial_scenarios: usize, dropped: usize) -> Self {
        Self {
            report: RunReport {
                started_at: Utc::now(),
                parallel_scenarios,
                serial_scenarios,
                dropped_scenarios: dropped,
                scenarios: OutcomeCounts::default(),
                steps: OutcomeCounts::default(),
                parallel_duration_ms: 0,
                serial_duration_ms: 0,
                units: Vec::new(),
                failed_log: Vec::new(),
                snippets: Vec::new(),
                unit_errors: Vec::new(),
                priming_error: None,
            },
        }
    }

    pub fn merge(&mut self, unit: UnitReport) {
        let report = &mut self.report;
        report.scenarios += unit.scenario_counts;
        report.steps += unit.step_counts;
        report.failed_log.extend(unit.failed_log.iter().cloned());
        for snippet in &unit.snippets {
            if !report.snippets.contains(snippet) {
                report.snippets.push(snippet.clone());
            }
        }
        report.units.push(unit);
    }

    pub fn record_unit_error(&mut self, error: &UnitExecutionError) {
        self.report.unit_errors.push(error.to_string());
    }

    pub fn record_priming_error(&mut self, error: impl Into<String>) {
        self.report.priming_error = Some(error.into());
    }

    pub fn set_durations(&mut self, parallel: Duration, serial: Duration) {
        self.report.parallel_duration_ms = parallel.as_millis() as u64;
        self.report.serial_duration_ms = serial.as_millis() as u64;
    }

    pub fn units_merged(&self) -> usize {
        self.report.units.len()
    }

    pub fn finish(self) -> RunReport {
        self.report
    }
}
