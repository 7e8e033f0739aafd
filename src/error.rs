//! Error types
//!
//! Parse failures and coordination misuse are fatal; unit failures are
//! recorded in the report and never abort sibling units.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or unreadable specification input
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("suite path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    #[error("invalid tag expression '{0}'")]
    TagExpression(String),
}

/// A unit ran to completion but at least one of its scenarios failed
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UnitExecutionError {
    #[error("{unit}: {failed} of {total} scenario(s) failed")]
    ScenariosFailed {
        unit: String,
        failed: usize,
        total: usize,
    },

    #[error("{unit}: {message}")]
    Engine { unit: String, message: String },
}

impl UnitExecutionError {
    pub fn unit(&self) -> &str {
        match self {
            UnitExecutionError::ScenariosFailed { unit, .. } => unit,
            UnitExecutionError::Engine { unit, .. } => unit,
        }
    }
}

/// Misuse of an `ExecutionCounter` or `ActionQueue`
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordinationError {
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("invalid state: {0}")]
    InvalidState(&'static str),
}

/// Failures that abort a whole run
#[derive(Debug, Error)]
pub enum SpearsError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

pub type Result<T, E = SpearsError> = std::result::Result<T, E>;
