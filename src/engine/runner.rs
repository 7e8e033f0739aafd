//! Scenario runner
//!
//! Executes the scenarios of a unit against a [`StepLibrary`].

use futures::future::{FutureExt, LocalBoxFuture};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{ParseError, UnitExecutionError};
use crate::models::{ExecutionUnit, Scenario, SpecTree, Step};
use crate::reporter::{scenario_status, Listener, RunEvent, StepStatus, UnitReporter};

use super::steps::{HookContext, StepLibrary, StepMatch, StepOutcome};
use super::{TestEngine, UnitRun};

/// Engine backed by `.feature` files and a regex step library
#[derive(Debug, Default)]
pub struct StepEngine {
    library: StepLibrary,
}

impl StepEngine {
    pub fn new(library: StepLibrary) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &StepLibrary {
        &self.library
    }

    async fn run_unit(&self, unit: &ExecutionUnit, mut reporter: UnitReporter) -> UnitRun {
        info!("Running {}", unit.label());
        reporter.hear(&RunEvent::BeforeGrouping(unit.grouping()));

        let setup = unit.setup().map(|s| s.steps.as_slice()).unwrap_or_default();
        let mut failed = 0;
        for scenario in unit.scenarios() {
            let status = self.run_scenario(scenario, setup, &mut reporter).await;
            debug!("  {} {}", status.symbol(), scenario.title());
            if status == StepStatus::Failed {
                failed += 1;
            }
        }

        reporter.hear(&RunEvent::AfterGrouping(unit.grouping()));

        let error = (failed > 0).then(|| UnitExecutionError::ScenariosFailed {
            unit: unit.label(),
            failed,
            total: unit.scenarios().len(),
        });
        UnitRun { error, reporter }
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        setup: &[Step],
        reporter: &mut UnitReporter,
    ) -> StepStatus {
        reporter.hear(&RunEvent::BeforeScenario(scenario));

        let mut statuses = Vec::new();
        let mut blocked = false;
        let hook_step = Step::new("Hook", "before scenario");

        for hook in self.library.before_hooks(scenario) {
            let outcome = guarded(hook.invoke(hook_context(scenario))).await;
            if let StepOutcome::Failed(message) = outcome {
                warn!("Before hook failed for {}: {}", scenario.title(), message);
                reporter.hear(&RunEvent::StepResult {
                    step: &hook_step,
                    status: StepStatus::Failed,
                    failure: Some(message),
                });
                statuses.push(StepStatus::Failed);
                blocked = true;
                break;
            }
        }

        for step in setup.iter().chain(&scenario.steps) {
            let (status, failure) = if blocked {
                (StepStatus::Skipped, None)
            } else {
                self.run_step(step, scenario).await
            };

            if status != StepStatus::Passed {
                blocked = true;
            }
            statuses.push(status);
            reporter.hear(&RunEvent::StepResult {
                step,
                status,
                failure,
            });
        }

        let hook_step = Step::new("Hook", "after scenario");
        for hook in self.library.after_hooks(scenario) {
            let outcome = guarded(hook.invoke(hook_context(scenario))).await;
            if let StepOutcome::Failed(message) = outcome {
                warn!("After hook failed for {}: {}", scenario.title(), message);
                reporter.hear(&RunEvent::StepResult {
                    step: &hook_step,
                    status: StepStatus::Failed,
                    failure: Some(message),
                });
                statuses.push(StepStatus::Failed);
            }
        }

        reporter.hear(&RunEvent::AfterScenario(scenario));
        scenario_status(statuses)
    }

    async fn run_step(&self, step: &Step, scenario: &Scenario) -> (StepStatus, Option<String>) {
        match self.library.find(&step.text) {
            StepMatch::Found {
                definition,
                captures,
            } => {
                let context = self.library.context_for(step, scenario, captures);
                match guarded(definition.invoke(context)).await {
                    StepOutcome::Passed => (StepStatus::Passed, None),
                    StepOutcome::Pending => (StepStatus::Pending, None),
                    StepOutcome::Failed(message) => (StepStatus::Failed, Some(message)),
                }
            }
            StepMatch::Undefined => {
                debug!("Undefined step: {}", step);
                (StepStatus::Undefined, None)
            }
            StepMatch::Ambiguous(patterns) => (
                StepStatus::Failed,
                Some(format!("Ambiguous step matches: {}", patterns.join(", "))),
            ),
        }
    }
}

impl TestEngine for StepEngine {
    fn parse(&self, paths: &[PathBuf]) -> Result<SpecTree, ParseError> {
        super::gherkin::parse_paths(paths)
    }

    fn execute<'a>(
        &'a self,
        unit: &'a ExecutionUnit,
        reporter: UnitReporter,
    ) -> LocalBoxFuture<'a, UnitRun> {
        self.run_unit(unit, reporter).boxed_local()
    }
}

fn hook_context(scenario: &Scenario) -> HookContext {
    HookContext {
        scenario: scenario.name.clone(),
        annotations: scenario.annotations.clone(),
    }
}

/// Await a handler future, turning a panic into a failed outcome
async fn guarded(future: LocalBoxFuture<'static, StepOutcome>) -> StepOutcome {
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => StepOutcome::Failed(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "step panicked".to_string()
    }
}
