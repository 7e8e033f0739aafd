//! Test engine
//!
//! The orchestrator only talks to the engine through [`TestEngine`]: parse
//! the suite once, then execute units one at a time or concurrently. Each
//! execution owns the reporter it was handed and gives it back when done.

pub mod gherkin;
mod runner;
pub mod steps;

use futures::future::LocalBoxFuture;
use std::path::PathBuf;

use crate::error::{ParseError, UnitExecutionError};
use crate::models::{ExecutionUnit, SpecTree};
use crate::reporter::UnitReporter;

pub use runner::StepEngine;
pub use steps::{HookContext, StepContext, StepLibrary, StepMatch, StepOutcome};

/// What one unit execution produced
#[derive(Debug)]
pub struct UnitRun {
    /// Set when at least one scenario of the unit failed
    pub error: Option<UnitExecutionError>,
    pub reporter: UnitReporter,
}

impl UnitRun {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

pub trait TestEngine {
    /// Parse suite files or directories into a specification tree
    fn parse(&self, paths: &[PathBuf]) -> Result<SpecTree, ParseError>;

    /// Run every scenario of `unit`, feeding lifecycle events to `reporter`
    fn execute<'a>(
        &'a self,
        unit: &'a ExecutionUnit,
        reporter: UnitReporter,
    ) -> LocalBoxFuture<'a, UnitRun>;
}
