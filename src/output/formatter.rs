//! Output formatters for run reports
//!
//! Provides pretty, summary, JSON and CSV renderings of a `RunReport`, plus
//! the partition plan printed by `--dry-run`.

use serde::Serialize;
use std::fmt;

use crate::models::UnitMode;
use crate::partition::PartitionResult;
use crate::reporter::{OutcomeCounts, RunReport, ScenarioRecord, StepStatus, UnitReport};

const CLEAR: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const ORANGE: &str = "\x1b[33m";
const BOLD_RED: &str = "\x1b[1;31m";
const BOLD_GREEN: &str = "\x1b[1;32m";
const BOLD_ORANGE: &str = "\x1b[1;33m";
const BOLD_BLUE: &str = "\x1b[1;34m";
const BOLD_AZURE: &str = "\x1b[1;36m";
const STRIKETHROUGH: &str = "\x1b[9;37m";

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Summary,
    Json,
    JsonPretty,
    Csv,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(OutputFormat::Pretty),
            "summary" => Some(OutputFormat::Summary),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Pretty => "pretty",
            OutputFormat::Summary => "summary",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize)]
struct CsvRow<'r> {
    unit: &'r str,
    mode: UnitMode,
    grouping: &'r str,
    scenarios: usize,
    passed: usize,
    failed: usize,
    undefined: usize,
    pending: usize,
    skipped: usize,
    steps: usize,
    status: &'static str,
}

/// Report formatter
pub struct ReportFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ReportFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render a finished run
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Pretty => self.format_pretty(report),
            OutputFormat::Summary => self.format_summary(report),
            OutputFormat::Json => serde_json::to_string(report).unwrap_or_default(),
            OutputFormat::JsonPretty => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Csv => self.format_csv(report),
        }
    }

    /// Render the partition plan without running anything
    pub fn format_plan(&self, plan: &PartitionResult) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::Csv => {
                serde_json::to_string(plan).unwrap_or_default()
            }
            OutputFormat::JsonPretty => serde_json::to_string_pretty(plan).unwrap_or_default(),
            OutputFormat::Pretty | OutputFormat::Summary => self.format_plan_text(plan),
        }
    }

    fn paint(&self, color: &str, text: impl fmt::Display) -> String {
        if self.colorize {
            format!("{color}{text}{CLEAR}")
        } else {
            text.to_string()
        }
    }

    fn format_pretty(&self, report: &RunReport) -> String {
        let mut out = String::new();

        out.push_str(&format!("\n  {}\n", self.paint(BOLD_BLUE, "Beginning test execution with:")));
        out.push_str(&format!("    - {} parallel scenarios\n", report.parallel_scenarios));
        out.push_str(&format!("    - {} serial scenarios\n", report.serial_scenarios));
        if report.dropped_scenarios > 0 {
            out.push_str(&format!(
                "    - {} scenarios ignored while running in parallel\n",
                report.dropped_scenarios
            ));
        }

        let (parallel, serial): (Vec<&UnitReport>, Vec<&UnitReport>) = report
            .units_by_grouping()
            .into_iter()
            .partition(|u| u.mode == UnitMode::Parallel);

        if !parallel.is_empty() {
            out.push_str(&self.banner(BOLD_GREEN, "Beginning Parallel Scenarios"));
            self.push_groupings(&mut out, &parallel);
        }
        if !serial.is_empty() {
            out.push_str(&self.banner(BOLD_GREEN, "Beginning Serial Scenarios"));
            self.push_groupings(&mut out, &serial);
        }

        out.push_str(&self.banner(BOLD_RED, "Failed Scenarios"));
        for line in &report.failed_log {
            out.push_str(&format!("  {}\n", self.paint(RED, line)));
        }

        if !report.snippets.is_empty() {
            out.push_str(&format!(
                "\n  {}\n",
                self.paint(
                    BOLD_ORANGE,
                    "You can implement step definitions for undefined steps with these snippets:"
                )
            ));
            for snippet in &report.snippets {
                out.push_str(&format!("  {}\n", self.paint(ORANGE, snippet)));
            }
        }

        if let Some(error) = &report.priming_error {
            out.push_str(&format!("\n  {}\n", self.paint(BOLD_RED, format!("Priming failed: {error}"))));
        }

        out.push_str(&self.banner(BOLD_GREEN, "Execution Summary"));
        out.push_str(&format!("  {}\n", self.timing_line(report)));
        out.push_str(&format!("  {}\n", self.scenario_line(report)));
        out.push_str(&format!("  {}\n", self.step_line(&report.steps)));

        out
    }

    fn banner(&self, color: &str, title: &str) -> String {
        format!("\n  {}\n\n", self.paint(color, format!("(::) {title} (::)")))
    }

    /// Units must be sorted by grouping; each grouping gets one header
    fn push_groupings(&self, out: &mut String, units: &[&UnitReport]) {
        let mut current = None;
        for unit in units {
            if current != Some(unit.grouping_index) {
                if current.is_some() {
                    out.push('\n');
                }
                out.push_str(&format!("  {}\n", self.paint(BOLD_AZURE, &unit.grouping)));
                current = Some(unit.grouping_index);
            }
            for scenario in &unit.scenarios {
                self.push_scenario(out, scenario);
            }
        }
        out.push('\n');
    }

    fn push_scenario(&self, out: &mut String, scenario: &ScenarioRecord) {
        out.push_str(&format!(
            "\n    {} {}\n",
            self.paint(BOLD_BLUE, &scenario.title),
            self.paint(STRIKETHROUGH, format!("# {}", scenario.location))
        ));

        for step in &scenario.steps {
            let color = match step.status {
                StepStatus::Passed => GREEN,
                StepStatus::Failed => BOLD_RED,
                StepStatus::Pending => ORANGE,
                StepStatus::Undefined => BOLD_ORANGE,
                StepStatus::Skipped => STRIKETHROUGH,
            };
            out.push_str(&format!(
                "      {} {}\n",
                step.status.symbol(),
                self.paint(color, &step.text)
            ));

            if let Some(docstring) = &step.docstring {
                for line in docstring.lines() {
                    out.push_str(&format!("          {line}\n"));
                }
            }
            if let Some(rows) = &step.table {
                for row in rows {
                    out.push_str(&format!("        | {} |\n", row.join(" | ")));
                }
            }
            if let Some(failure) = &step.failure {
                out.push_str(&format!("        {}\n", self.paint(RED, failure)));
            }
        }
    }

    fn timing_line(&self, report: &RunReport) -> String {
        let secs = |ms: u64| ms as f64 / 1000.0;
        format!(
            "{}{}",
            self.paint(
                BOLD_GREEN,
                format!("All scenarios complete in {} seconds", secs(report.total_duration_ms()))
            ),
            self.paint(
                GREEN,
                format!(
                    "  ({} Parallel, {} Serial)",
                    secs(report.parallel_duration_ms),
                    secs(report.serial_duration_ms)
                )
            )
        )
    }

    fn scenario_line(&self, report: &RunReport) -> String {
        let counts = &report.scenarios;
        let total = self.paint(BOLD_GREEN, plural(counts.total(), "scenario"));
        if counts.total() == 0 {
            return total;
        }

        let details = outcome_details(
            counts,
            &[
                StepStatus::Failed,
                StepStatus::Undefined,
                StepStatus::Pending,
                StepStatus::Skipped,
                StepStatus::Passed,
            ],
        );
        format!(
            "{}{}{}",
            total,
            self.paint(GREEN, format!("  ({details})")),
            self.paint(
                GREEN,
                format!(
                    "::({} Parallel, {} Serial)",
                    report.parallel_scenarios, report.serial_scenarios
                )
            )
        )
    }

    fn step_line(&self, counts: &OutcomeCounts) -> String {
        let total = self.paint(BOLD_GREEN, plural(counts.total(), "step"));
        if counts.total() == 0 {
            return total;
        }

        let details = outcome_details(
            counts,
            &[
                StepStatus::Failed,
                StepStatus::Undefined,
                StepStatus::Pending,
                StepStatus::Skipped,
                StepStatus::Passed,
            ],
        );
        format!("{}{}", total, self.paint(GREEN, format!("  ({details})")))
    }

    fn format_summary(&self, report: &RunReport) -> String {
        let verdict = if report.success() {
            self.paint(BOLD_GREEN, "PASS")
        } else {
            self.paint(BOLD_RED, "FAIL")
        };

        let mut out = format!(
            "{} {} / {} in {}ms ({} parallel, {} serial)\n",
            verdict,
            plural(report.scenarios.total(), "scenario"),
            plural(report.steps.total(), "step"),
            report.total_duration_ms(),
            report.parallel_scenarios,
            report.serial_scenarios
        );
        for line in &report.failed_log {
            out.push_str(&format!("  {} {}\n", StepStatus::Failed.symbol(), line));
        }
        out
    }

    fn format_csv(&self, report: &RunReport) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for unit in report.units_by_grouping() {
            let row = CsvRow {
                unit: &unit.unit,
                mode: unit.mode,
                grouping: &unit.grouping,
                scenarios: unit.scenario_counts.total(),
                passed: unit.scenario_counts.passed,
                failed: unit.scenario_counts.failed,
                undefined: unit.scenario_counts.undefined,
                pending: unit.scenario_counts.pending,
                skipped: unit.scenario_counts.skipped,
                steps: unit.step_counts.total(),
                status: if unit.is_success() { "passed" } else { "failed" },
            };
            if writer.serialize(row).is_err() {
                return String::new();
            }
        }

        writer
            .into_inner()
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }

    fn format_plan_text(&self, plan: &PartitionResult) -> String {
        let mut out = String::new();

        for grouping in &plan.groupings {
            out.push_str(&format!("{}\n", self.paint(BOLD_AZURE, grouping.info.title())));
            for unit in &grouping.parallel_units {
                for scenario in unit.scenarios() {
                    out.push_str(&format!("  {} {}\n", self.paint(GREEN, "[parallel]"), scenario.name));
                }
            }
            if let Some(unit) = &grouping.serial_unit {
                for scenario in unit.scenarios() {
                    out.push_str(&format!("  {} {}\n", self.paint(BOLD_BLUE, "[serial]  "), scenario.name));
                }
            }
            for name in &grouping.dropped {
                out.push_str(&format!("  {} {}\n", self.paint(ORANGE, "[ignored] "), name));
            }
        }

        out.push_str(&format!(
            "\n{} parallel, {} serial, {} ignored\n",
            plan.parallel_total,
            plan.serial_total,
            plan.dropped_total()
        ));
        out
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn outcome_details(counts: &OutcomeCounts, order: &[StepStatus]) -> String {
    order
        .iter()
        .filter(|status| counts.get(**status) > 0)
        .map(|status| format!("{} {}", counts.get(*status), status))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Grouping, GroupingInfo, Scenario, SpecTree};
    use crate::partition::PartitionVisitor;
    use crate::reporter::{RunAggregator, StepRecord};
    use std::time::Duration;

    fn unit(mode: UnitMode, index: usize, status: StepStatus) -> UnitReport {
        let mut scenario_counts = OutcomeCounts::default();
        scenario_counts.record(status);
        let mut step_counts = OutcomeCounts::default();
        step_counts.record(status);

        let failed = status == StepStatus::Failed;
        UnitReport {
            unit: format!("Feature: F{index} [{mode}]"),
            mode,
            grouping_index: index,
            grouping: format!("Feature: F{index}"),
            scenarios: vec![ScenarioRecord {
                title: format!("Scenario: s{index}"),
                location: format!("f{index}.feature:3"),
                status,
                steps: vec![StepRecord {
                    text: "When I run a step".to_string(),
                    status,
                    docstring: None,
                    table: None,
                    failure: failed.then(|| "Test failure".to_string()),
                }],
            }],
            scenario_counts,
            step_counts,
            failed_log: if failed {
                vec![format!("f{index}.feature:3 # Scenario: s{index}")]
            } else {
                Vec::new()
            },
            snippets: Vec::new(),
        }
    }

    fn report() -> RunReport {
        let mut aggregator = RunAggregator::new(1, 1, 0);
        aggregator.merge(unit(UnitMode::Parallel, 1, StepStatus::Passed));
        aggregator.merge(unit(UnitMode::Serial, 0, StepStatus::Failed));
        aggregator.set_durations(Duration::from_millis(1500), Duration::from_millis(500));
        aggregator.finish()
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("PRETTY"), Some(OutputFormat::Pretty));
        assert_eq!(OutputFormat::from_str("json-pretty"), Some(OutputFormat::JsonPretty));
        assert_eq!(OutputFormat::from_str("table"), None);
    }

    #[test]
    fn test_pretty_summary_lines() {
        let output = ReportFormatter::new(OutputFormat::Pretty)
            .no_color()
            .format_report(&report());

        assert!(!output.contains('\x1b'));
        assert!(output.contains("(::) Beginning Parallel Scenarios (::)"));
        assert!(output.contains("(::) Failed Scenarios (::)"));
        assert!(output.contains("f0.feature:3 # Scenario: s0"));
        assert!(output.contains("All scenarios complete in 2 seconds  (1.5 Parallel, 0.5 Serial)"));
        assert!(output.contains("2 scenarios  (1 failed, 1 passed)::(1 Parallel, 1 Serial)"));
        assert!(output.contains("2 steps  (1 failed, 1 passed)"));
        assert!(output.contains("Test failure"));
    }

    #[test]
    fn test_pretty_prints_each_grouping_once() {
        let mut aggregator = RunAggregator::new(3, 1, 0);
        aggregator.merge(unit(UnitMode::Parallel, 1, StepStatus::Passed));
        aggregator.merge(unit(UnitMode::Parallel, 0, StepStatus::Passed));
        aggregator.merge(unit(UnitMode::Parallel, 1, StepStatus::Passed));
        aggregator.merge(unit(UnitMode::Serial, 1, StepStatus::Passed));
        let report = aggregator.finish();

        let output = ReportFormatter::new(OutputFormat::Pretty)
            .no_color()
            .format_report(&report);
        let (parallel, serial) = output
            .split_once("(::) Beginning Serial Scenarios (::)")
            .unwrap();

        assert_eq!(parallel.matches("Feature: F1\n").count(), 1);
        assert_eq!(parallel.matches("Scenario: s1").count(), 2);
        assert!(parallel.find("Feature: F0\n").unwrap() < parallel.find("Feature: F1\n").unwrap());
        assert_eq!(serial.matches("Feature: F1\n").count(), 1);
    }

    #[test]
    fn test_colors_enabled_by_default() {
        let output = ReportFormatter::new(OutputFormat::Summary).format_report(&report());
        assert!(output.contains("\x1b[1;31mFAIL\x1b[0m"));
    }

    #[test]
    fn test_csv_rows_follow_grouping_order() {
        let output = ReportFormatter::new(OutputFormat::Csv).format_report(&report());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("unit,mode,grouping,scenarios"));
        assert!(lines[1].starts_with("Feature: F0 [serial],serial,"));
        assert!(lines[1].ends_with(",failed"));
        assert!(lines[2].ends_with(",passed"));
    }

    #[test]
    fn test_json_report() {
        let output = ReportFormatter::new(OutputFormat::Json).format_report(&report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["scenarios"]["failed"], 1);
        assert_eq!(value["units"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_plan_lists_routing() {
        let mut grouping = Grouping::new(GroupingInfo::new("Cart"));
        grouping.scenarios = vec![
            Scenario::new("read").with_annotation("parallel-ok"),
            Scenario::new("reset").with_annotation("ignore-if-parallel"),
            Scenario::new("write"),
        ];
        let plan = PartitionVisitor::default().visit_tree(SpecTree::new(vec![grouping]));

        let output = ReportFormatter::new(OutputFormat::Pretty)
            .no_color()
            .format_plan(&plan);

        assert!(output.contains("Feature: Cart"));
        assert!(output.contains("[parallel] read"));
        assert!(output.contains("[serial]   write"));
        assert!(output.contains("[ignored]  reset"));
        assert!(output.contains("1 parallel, 1 serial, 1 ignored"));
    }
}
