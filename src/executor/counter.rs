//! Fan-out/fan-in execution counter
//!
//! Tracks an unbounded set of unordered concurrent actions and signals
//! completion once every started action has finished and the caller has
//! declared that nothing more will be started. Unlike the action queue,
//! this gives no ordering among the actions themselves.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::CoordinationError;

/// What the counter reports once it completes
#[derive(Debug, PartialEq, Eq)]
pub struct CounterOutcome<T, E> {
    /// `None` when no action failed
    pub errors: Option<Vec<E>>,
    /// Successful results, in completion order
    pub results: Vec<T>,
}

impl<T, E> CounterOutcome<T, E> {
    pub fn is_success(&self) -> bool {
        self.errors.is_none()
    }
}

/// Resolves once the counter fires
#[derive(Debug)]
pub struct CounterCompletion<T, E> {
    rx: oneshot::Receiver<CounterOutcome<T, E>>,
}

impl<T, E> CounterCompletion<T, E> {
    /// Non-blocking check; `None` while the counter has not fired yet
    pub fn try_outcome(&mut self) -> Option<CounterOutcome<T, E>> {
        self.rx.try_recv().ok()
    }
}

impl<T, E> Future for CounterCompletion<T, E> {
    type Output = Result<CounterOutcome<T, E>, CoordinationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|outcome| {
            outcome.map_err(|_| CoordinationError::InvalidState("counter dropped before completion"))
        })
    }
}

#[derive(Debug)]
pub struct ExecutionCounter<T, E> {
    pending: usize,
    finalized: bool,
    errors: Vec<E>,
    results: Vec<T>,
    completion: Option<oneshot::Sender<CounterOutcome<T, E>>>,
}

impl<T, E> ExecutionCounter<T, E> {
    pub fn new() -> (Self, CounterCompletion<T, E>) {
        let (tx, rx) = oneshot::channel();
        let counter = Self {
            pending: 0,
            finalized: false,
            errors: Vec::new(),
            results: Vec::new(),
            completion: Some(tx),
        };
        (counter, CounterCompletion { rx })
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// True once the completion signal has been sent
    pub fn is_complete(&self) -> bool {
        self.completion.is_none()
    }

    pub fn start_action(&mut self) -> Result<(), CoordinationError> {
        if self.finalized {
            return Err(CoordinationError::InvalidOperation(
                "start_action called after finalize",
            ));
        }
        self.pending += 1;
        Ok(())
    }

    /// Record one finished action; errors and results are kept apart
    pub fn finish_action(&mut self, outcome: Result<T, E>) -> Result<(), CoordinationError> {
        if self.pending == 0 {
            return Err(CoordinationError::InvalidOperation(
                "finish_action called with no pending actions",
            ));
        }
        self.pending -= 1;

        match outcome {
            Ok(result) => self.results.push(result),
            Err(error) => self.errors.push(error),
        }

        self.try_complete();
        Ok(())
    }

    /// Declare that every action has been started
    pub fn finalize(&mut self) -> Result<(), CoordinationError> {
        self.finalized = true;
        self.try_complete();
        Ok(())
    }

    /// Rearm a completed counter for another phase
    pub fn reset(&mut self) -> Result<CounterCompletion<T, E>, CoordinationError> {
        if self.pending != 0 || !self.finalized {
            return Err(CoordinationError::InvalidState(
                "cannot reset counter while actions are pending",
            ));
        }

        let (tx, rx) = oneshot::channel();
        self.finalized = false;
        self.errors.clear();
        self.results.clear();
        self.completion = Some(tx);
        Ok(CounterCompletion { rx })
    }

    fn try_complete(&mut self) {
        if self.pending != 0 || !self.finalized {
            return;
        }

        if let Some(tx) = self.completion.take() {
            let errors = mem::take(&mut self.errors);
            let outcome = CounterOutcome {
                errors: (!errors.is_empty()).then_some(errors),
                results: mem::take(&mut self.results),
            };
            debug!(
                "Execution counter finished with {} result(s)",
                outcome.results.len()
            );
            // receiver may be gone; completion still counts as fired
            let _ = tx.send(outcome);
        }
    }
}
