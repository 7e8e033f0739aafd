//! Run orchestration
//!
//! Sequences one run: partition, prime, fan out the parallel units, then
//! drain the serial units. Everything happens on the calling task; parallel
//! units are interleaved by polling them together, never by spawning.

use futures::stream::{FuturesUnordered, StreamExt};
use std::cell::RefCell;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::engine::{TestEngine, UnitRun};
use crate::error::{SpearsError, UnitExecutionError};
use crate::models::{ExecutionUnit, SpecTree};
use crate::partition::{PartitionMode, PartitionResult, PartitionVisitor};
use crate::reporter::{RunAggregator, RunReport, UnitReporter};
use crate::utils::PhaseTimer;

use super::counter::ExecutionCounter;
use super::queue::{Action, ActionQueue, QueueSignal};

const PARALLEL_PHASE: &str = "parallel";
const SERIAL_PHASE: &str = "serial";

pub struct Orchestrator<'e, E> {
    engine: &'e E,
    visitor: PartitionVisitor,
}

impl<'e, E: TestEngine> Orchestrator<'e, E> {
    pub fn new(engine: &'e E, mode: PartitionMode) -> Self {
        Self {
            engine,
            visitor: PartitionVisitor::new(mode),
        }
    }

    pub fn mode(&self) -> PartitionMode {
        self.visitor.mode()
    }

    /// Partition without executing anything
    pub fn plan(&self, tree: SpecTree) -> PartitionResult {
        self.visitor.visit_tree(tree)
    }

    /// Partition `tree` and execute it
    pub async fn run(&self, tree: SpecTree) -> Result<RunReport, SpearsError> {
        let partition = self.plan(tree);
        self.run_partition(partition).await
    }

    pub async fn run_partition(&self, partition: PartitionResult) -> Result<RunReport, SpearsError> {
        let needs_priming = partition.has_parallel_units();
        let mut aggregator = RunAggregator::new(
            partition.parallel_total,
            partition.serial_total,
            partition.dropped_total(),
        );
        let (parallel, serial) = partition.into_units();

        info!(
            "Beginning test execution with: {} parallel / {} serial",
            parallel.len(),
            serial.iter().map(|u| u.scenarios().len()).sum::<usize>()
        );

        let mut timer = PhaseTimer::new();

        if needs_priming {
            self.prime(&mut aggregator).await;
        }
        self.run_parallel(&parallel, &mut aggregator).await?;
        timer.lap(PARALLEL_PHASE);

        self.run_serial(&serial, &mut aggregator).await?;
        timer.lap(SERIAL_PHASE);

        aggregator.set_durations(timer.phase(PARALLEL_PHASE), timer.phase(SERIAL_PHASE));
        debug!("{}", timer.format());

        Ok(self.finish(aggregator))
    }

    /// Run every grouping untouched, one after another
    pub async fn run_direct(&self, tree: SpecTree) -> Result<RunReport, SpearsError> {
        let units: Vec<ExecutionUnit> = tree
            .groupings
            .into_iter()
            .enumerate()
            .map(|(index, grouping)| ExecutionUnit::direct(index, grouping))
            .collect();

        let total = units.iter().map(|u| u.scenarios().len()).sum();
        let mut aggregator = RunAggregator::new(0, total, 0);
        info!("Running {} grouping(s) without partitioning", units.len());

        let mut timer = PhaseTimer::new();
        self.run_serial(&units, &mut aggregator).await?;
        timer.lap(SERIAL_PHASE);
        aggregator.set_durations(Duration::ZERO, timer.phase(SERIAL_PHASE));

        Ok(self.finish(aggregator))
    }

    /// Give `first-parallel-scenario` hooks a chance to run before fan-out
    async fn prime(&self, aggregator: &mut RunAggregator) {
        let unit = ExecutionUnit::priming();
        debug!("Priming parallel execution");

        let run = self.run_unit(&unit).await;
        let Some(error) = run.error else {
            return;
        };

        let report = run.reporter.into_report();
        let details: Vec<&str> = report
            .scenarios
            .iter()
            .flat_map(|s| &s.steps)
            .filter_map(|s| s.failure.as_deref())
            .collect();

        let message = if details.is_empty() {
            error.to_string()
        } else {
            format!("{}: {}", error, details.join("; "))
        };
        warn!("Priming failed: {}", message);
        aggregator.record_priming_error(message);
    }

    async fn run_parallel(
        &self,
        units: &[ExecutionUnit],
        aggregator: &mut RunAggregator,
    ) -> Result<(), SpearsError> {
        let (mut counter, completion) = ExecutionCounter::<String, UnitExecutionError>::new();
        let mut running = FuturesUnordered::new();

        for unit in units {
            counter.start_action()?;
            running.push(self.run_unit(unit));
        }
        counter.finalize()?;

        while let Some(run) = running.next().await {
            let outcome = match &run.error {
                Some(error) => {
                    aggregator.record_unit_error(error);
                    Err(error.clone())
                }
                None => Ok(run.reporter.unit().to_string()),
            };
            aggregator.merge(run.reporter.into_report());
            counter.finish_action(outcome)?;
        }

        let outcome = completion.await?;
        match outcome.errors {
            Some(errors) => info!(
                "Parallel phase done: {} passed, {} failed",
                outcome.results.len(),
                errors.len()
            ),
            None => info!("Parallel phase done: {} passed", outcome.results.len()),
        }

        Ok(())
    }

    async fn run_serial(
        &self,
        units: &[ExecutionUnit],
        aggregator: &mut RunAggregator,
    ) -> Result<(), SpearsError> {
        let sink = RefCell::new(aggregator);
        let mut queue = ActionQueue::new().continue_on_error(true);

        for unit in units {
            let sink = &sink;
            queue.add_action(Action::bare(move || async move {
                let run = self.run_unit(unit).await;
                let mut aggregator = sink.borrow_mut();
                if let Some(error) = &run.error {
                    aggregator.record_unit_error(error);
                }
                aggregator.merge(run.reporter.into_report());

                match run.error {
                    Some(error) => Err(error),
                    None => Ok(unit.label()),
                }
            }))?;
        }

        match queue.execute().await? {
            QueueSignal::Finish {
                completed, errors, ..
            } => info!(
                "Serial phase done: {} unit(s), {} failed",
                completed,
                errors.len()
            ),
            QueueSignal::Error { index, error } => {
                warn!("Serial phase stopped at unit {}: {}", index, error)
            }
        }

        Ok(())
    }

    async fn run_unit(&self, unit: &ExecutionUnit) -> UnitRun {
        self.engine
            .execute(unit, UnitReporter::for_unit(unit))
            .await
    }

    fn finish(&self, aggregator: RunAggregator) -> RunReport {
        let report = aggregator.finish();
        info!(
            "All scenarios complete in {}ms ({}ms parallel, {}ms serial)",
            report.total_duration_ms(),
            report.parallel_duration_ms,
            report.serial_duration_ms
        );
        report
    }
}
