//! Serial action queue
//!
//! Runs a finite list of asynchronous actions strictly one at a time in the
//! order they were added. Each action's future is its continuation: the next
//! action never starts before the previous future has resolved.

use futures::future::{FutureExt, LocalBoxFuture};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::CoordinationError;

pub type ActionFuture<'a, T, E> = LocalBoxFuture<'a, Result<T, E>>;

/// How many leading arguments an action takes from its predecessor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionArity {
    /// Only the continuation
    Bare,
    /// The previous action's error
    WithError,
    /// The previous action's error and result
    WithErrorAndResult,
}

pub enum Action<'a, T, E> {
    Bare(Box<dyn FnOnce() -> ActionFuture<'a, T, E> + 'a>),
    WithError(Box<dyn FnOnce(Option<E>) -> ActionFuture<'a, T, E> + 'a>),
    WithErrorAndResult(Box<dyn FnOnce(Option<E>, Option<T>) -> ActionFuture<'a, T, E> + 'a>),
}

impl<'a, T: 'a, E: 'a> Action<'a, T, E> {
    pub fn bare<F, Fut>(action: F) -> Self
    where
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        Action::Bare(Box::new(move || action().boxed_local()))
    }

    pub fn with_error<F, Fut>(action: F) -> Self
    where
        F: FnOnce(Option<E>) -> Fut + 'a,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        Action::WithError(Box::new(move |error| action(error).boxed_local()))
    }

    pub fn with_error_and_result<F, Fut>(action: F) -> Self
    where
        F: FnOnce(Option<E>, Option<T>) -> Fut + 'a,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        Action::WithErrorAndResult(Box::new(move |error, result| {
            action(error, result).boxed_local()
        }))
    }

    pub fn arity(&self) -> ActionArity {
        match self {
            Action::Bare(_) => ActionArity::Bare,
            Action::WithError(_) => ActionArity::WithError,
            Action::WithErrorAndResult(_) => ActionArity::WithErrorAndResult,
        }
    }
}

impl<T, E> fmt::Debug for Action<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arity = match self {
            Action::Bare(_) => "Bare",
            Action::WithError(_) => "WithError",
            Action::WithErrorAndResult(_) => "WithErrorAndResult",
        };
        write!(f, "Action::{arity}")
    }
}

/// Terminal signal of a queue run
#[derive(Debug, PartialEq, Eq)]
pub enum QueueSignal<T, E> {
    /// Every action ran
    Finish {
        completed: usize,
        /// Errors swallowed under continue-on-error, with the action index
        errors: Vec<(usize, E)>,
        last: Option<T>,
    },
    /// An action failed and the queue stopped
    Error { index: usize, error: E },
}

impl<T, E> QueueSignal<T, E> {
    pub fn is_finish(&self) -> bool {
        matches!(self, QueueSignal::Finish { .. })
    }
}

#[derive(Debug)]
pub struct ActionQueue<'a, T, E> {
    actions: VecDeque<Action<'a, T, E>>,
    started: bool,
    continue_on_error: bool,
}

impl<'a, T: 'a, E: Clone + fmt::Display + 'a> ActionQueue<'a, T, E> {
    pub fn new() -> Self {
        Self {
            actions: VecDeque::new(),
            started: false,
            continue_on_error: false,
        }
    }

    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn add_action(&mut self, action: Action<'a, T, E>) -> Result<(), CoordinationError> {
        if self.started {
            return Err(CoordinationError::InvalidOperation(
                "actions cannot be added once execution has begun",
            ));
        }
        self.actions.push_back(action);
        Ok(())
    }

    /// Drain the queue in FIFO order
    pub async fn execute(&mut self) -> Result<QueueSignal<T, E>, CoordinationError> {
        if self.started {
            return Err(CoordinationError::InvalidOperation(
                "queue has already been executed",
            ));
        }
        self.started = true;

        let mut previous_error: Option<E> = None;
        let mut previous_result: Option<T> = None;
        let mut errors = Vec::new();
        let mut completed = 0;

        while let Some(action) = self.actions.pop_front() {
            let index = completed;
            debug!("Running queued action {} ({:?})", index, action.arity());

            let outcome = match action {
                Action::Bare(run) => run().await,
                Action::WithError(run) => run(previous_error.take()).await,
                Action::WithErrorAndResult(run) => {
                    run(previous_error.take(), previous_result.take()).await
                }
            };
            completed += 1;

            match outcome {
                Ok(result) => {
                    previous_error = None;
                    previous_result = Some(result);
                }
                Err(error) if !self.continue_on_error => {
                    warn!("Queued action {} failed, aborting queue: {}", index, error);
                    self.actions.clear();
                    return Ok(QueueSignal::Error { index, error });
                }
                Err(error) => {
                    warn!("Queued action {} failed, continuing: {}", index, error);
                    errors.push((index, error.clone()));
                    previous_error = Some(error);
                    previous_result = None;
                }
            }
        }

        Ok(QueueSignal::Finish {
            completed,
            errors,
            last: previous_result,
        })
    }
}

impl<'a, T: 'a, E: Clone + fmt::Display + 'a> Default for ActionQueue<'a, T, E> {
    fn default() -> Self {
        Self::new()
    }
}
