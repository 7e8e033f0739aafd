//! Demo step library
//!
//! Step handlers for the bundled suites under `demos/features`. The
//! `first-parallel-scenario` hook stands in for expensive one-time setup
//! that must finish before scenarios fan out.

use std::time::Duration;
use tracing::info;

use crate::engine::{StepContext, StepLibrary, StepOutcome};
use crate::models::tag::FIRST_PARALLEL_SCENARIO;

const SLOW_STEP: Duration = Duration::from_secs(1);

pub fn library() -> Result<StepLibrary, regex::Error> {
    let mut library = StepLibrary::new();

    library
        .given("^a background step$", |_| async { StepOutcome::Passed })?
        .when("^I run a (passing|failing|pending) step$", |ctx| async move {
            outcome_for(&ctx)
        })?
        .when("^I run a slow step$", |_| async {
            tokio::time::sleep(SLOW_STEP).await;
            StepOutcome::Passed
        })?
        .when(
            "^I run a (passing|failing|pending) step with a (hash table|doc string):$",
            |ctx| async move {
                if ctx.table.is_none() && ctx.docstring.is_none() {
                    return StepOutcome::failed("expected a hash table or doc string argument");
                }
                outcome_for(&ctx)
            },
        )?
        .then("^everything should be ok$", |_| async { StepOutcome::Passed })?
        .then("^the following step should be skipped$", |_| async {
            StepOutcome::Passed
        })?;

    library.before(Some(FIRST_PARALLEL_SCENARIO), |ctx| async move {
        info!("Preparing shared fixtures before '{}'", ctx.scenario);
        StepOutcome::Passed
    });

    Ok(library)
}

fn outcome_for(ctx: &StepContext) -> StepOutcome {
    match ctx.capture(0) {
        Some("passing") => StepOutcome::Passed,
        Some("pending") => StepOutcome::Pending,
        _ => StepOutcome::failed("Test failure"),
    }
}
