//! Per-unit reporter
//!
//! Every execution unit gets its own reporter so concurrently running units
//! never share mutable reporting state. The reporter keeps structured
//! scenario records instead of rendered text; rendering happens once, after
//! all units are merged.

use serde::Serialize;

use crate::models::{ExecutionUnit, Step, UnitMode};

use super::event::{EventKind, Listener, RunEvent, StepStatus};
use super::stats::{scenario_status, OutcomeCounts, StatsJournal};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub text: String,
    pub status: StepStatus,
    pub docstring: Option<String>,
    pub table: Option<Vec<Vec<String>>>,
    pub failure: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScenarioRecord {
    pub title: String,
    pub location: String,
    pub status: StepStatus,
    pub steps: Vec<StepRecord>,
}

/// Everything one unit contributed to the run
#[derive(Clone, Debug, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub mode: UnitMode,
    pub grouping_index: usize,
    pub grouping: String,
    pub scenarios: Vec<ScenarioRecord>,
    pub scenario_counts: OutcomeCounts,
    pub step_counts: OutcomeCounts,
    /// `uri:line # Scenario: name` per failed scenario
    pub failed_log: Vec<String>,
    /// Registration hints for undefined steps
    pub snippets: Vec<String>,
}

impl UnitReport {
    pub fn is_success(&self) -> bool {
        self.scenario_counts.failed == 0
    }
}

type Handler = fn(&mut UnitReporter, &RunEvent<'_>);

#[derive(Debug)]
pub struct UnitReporter {
    unit: String,
    mode: UnitMode,
    grouping_index: usize,
    grouping: String,
    journal: StatsJournal,
    scenarios: Vec<ScenarioRecord>,
    current: Option<ScenarioRecord>,
    failed_log: Vec<String>,
    snippets: Vec<String>,
}

impl UnitReporter {
    pub fn for_unit(unit: &ExecutionUnit) -> Self {
        Self {
            unit: unit.label(),
            mode: unit.mode(),
            grouping_index: unit.grouping_index(),
            grouping: unit.grouping().title(),
            journal: StatsJournal::new(),
            scenarios: Vec::new(),
            current: None,
            failed_log: Vec::new(),
            snippets: Vec::new(),
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn scenario_counts(&self) -> OutcomeCounts {
        self.journal.scenarios()
    }

    pub fn step_counts(&self) -> OutcomeCounts {
        self.journal.steps()
    }

    pub fn into_report(self) -> UnitReport {
        UnitReport {
            scenario_counts: self.journal.scenarios(),
            step_counts: self.journal.steps(),
            unit: self.unit,
            mode: self.mode,
            grouping_index: self.grouping_index,
            grouping: self.grouping,
            scenarios: self.scenarios,
            failed_log: self.failed_log,
            snippets: self.snippets,
        }
    }

    fn handler(kind: EventKind) -> Handler {
        match kind {
            EventKind::BeforeGrouping => Self::handle_before_grouping,
            EventKind::BeforeScenario => Self::handle_before_scenario,
            EventKind::StepResult => Self::handle_step_result,
            EventKind::AfterScenario => Self::handle_after_scenario,
            EventKind::AfterGrouping => Self::handle_after_grouping,
        }
    }

    fn handle_before_grouping(&mut self, event: &RunEvent<'_>) {
        if let RunEvent::BeforeGrouping(info) = event {
            self.grouping = info.title();
        }
    }

    fn handle_before_scenario(&mut self, event: &RunEvent<'_>) {
        if let RunEvent::BeforeScenario(scenario) = event {
            self.current = Some(ScenarioRecord {
                title: scenario.title(),
                location: scenario.location(),
                status: StepStatus::Passed,
                steps: Vec::new(),
            });
        }
    }

    fn handle_step_result(&mut self, event: &RunEvent<'_>) {
        let RunEvent::StepResult {
            step,
            status,
            failure,
        } = event
        else {
            return;
        };

        if *status == StepStatus::Undefined {
            let snippet = snippet(step);
            if !self.snippets.contains(&snippet) {
                self.snippets.push(snippet);
            }
        }

        if let Some(current) = self.current.as_mut() {
            current.steps.push(StepRecord {
                text: step.to_string(),
                status: *status,
                docstring: step.docstring.clone(),
                table: step.table.clone(),
                failure: failure.clone(),
            });
        }
    }

    fn handle_after_scenario(&mut self, _event: &RunEvent<'_>) {
        if let Some(mut record) = self.current.take() {
            record.status = scenario_status(record.steps.iter().map(|s| s.status));
            if record.status == StepStatus::Failed {
                self.failed_log
                    .push(format!("{} # {}", record.location, record.title));
            }
            self.scenarios.push(record);
        }
    }

    fn handle_after_grouping(&mut self, _event: &RunEvent<'_>) {}
}

impl Listener for UnitReporter {
    fn hear(&mut self, event: &RunEvent<'_>) {
        self.journal.hear(event);
        (Self::handler(event.kind()))(self, event);
    }
}

/// Suggest a step registration for an undefined step
pub fn snippet(step: &Step) -> String {
    let method = match step.keyword.trim().to_lowercase().as_str() {
        "given" => "given",
        "when" => "when",
        "then" => "then",
        _ => "step",
    };
    format!(
        "library.{method}(r#\"^{}$\"#, |_ctx| async {{ StepOutcome::Pending }})?;",
        regex::escape(&step.text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GroupingInfo, Scenario};

    fn emit(reporter: &mut UnitReporter, scenario: &Scenario, statuses: &[StepStatus]) {
        reporter.hear(&RunEvent::BeforeScenario(scenario));
        for (step, status) in scenario.steps.iter().zip(statuses) {
            let failure = (*status == StepStatus::Failed).then(|| "Test failure".to_string());
            reporter.hear(&RunEvent::StepResult {
                step,
                status: *status,
                failure,
            });
        }
        reporter.hear(&RunEvent::AfterScenario(scenario));
    }

    #[test]
    fn test_reporter_collects_records_and_logs() {
        let info = GroupingInfo::new("Cart");
        let passing = Scenario::new("ok")
            .located("cart.feature", 3)
            .with_step(Step::new("Given ", "a background step"));
        let failing = Scenario::new("broken")
            .located("cart.feature", 9)
            .with_step(Step::new("When ", "I run a failing step"))
            .with_step(Step::new("Then ", "everything should be ok"));
        let undefined = Scenario::new("missing")
            .located("cart.feature", 14)
            .with_step(Step::new("When ", "I do (something) new"));

        let unit = ExecutionUnit::serial(
            2,
            info.clone(),
            None,
            vec![passing.clone(), failing.clone(), undefined.clone()],
        );
        let mut reporter = UnitReporter::for_unit(&unit);

        reporter.hear(&RunEvent::BeforeGrouping(&info));
        emit(&mut reporter, &passing, &[StepStatus::Passed]);
        emit(
            &mut reporter,
            &failing,
            &[StepStatus::Failed, StepStatus::Skipped],
        );
        emit(&mut reporter, &undefined, &[StepStatus::Undefined]);
        reporter.hear(&RunEvent::AfterGrouping(&info));

        let report = reporter.into_report();
        assert_eq!(report.grouping_index, 2);
        assert_eq!(report.grouping, "Feature: Cart");
        assert_eq!(report.scenario_counts.passed, 1);
        assert_eq!(report.scenario_counts.failed, 1);
        assert_eq!(report.scenario_counts.undefined, 1);
        assert_eq!(report.step_counts.total(), 4);
        assert_eq!(report.failed_log, vec!["cart.feature:9 # Scenario: broken"]);
        assert_eq!(report.scenarios.len(), 3);
        assert_eq!(
            report.scenarios[1].steps[0].failure.as_deref(),
            Some("Test failure")
        );
        assert_eq!(report.snippets.len(), 1);
        assert!(report.snippets[0].starts_with("library.when("));
        assert!(report.snippets[0].contains(r"I do \(something\) new"));
        assert!(!report.is_success());
    }

    #[test]
    fn test_snippet_uses_step_for_conjunctions() {
        let step = Step::new("And ", "it works");
        assert_eq!(
            snippet(&step),
            "library.step(r#\"^it works$\"#, |_ctx| async { StepOutcome::Pending })?;"
        );
    }
}
