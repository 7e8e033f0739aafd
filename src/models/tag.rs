//! Annotation labels and tag filtering
//!
//! Filter expressions follow the classic cucumber form: every `--tags`
//! occurrence is an OR list separated by commas, occurrences are ANDed,
//! and a leading `~` negates a term.

use crate::error::ParseError;

use super::tree::Annotations;

/// Scenario has no shared-fixture dependency
pub const PARALLEL_OK: &str = "parallel-ok";

/// Scenario only makes sense under serial execution
pub const IGNORE_IF_PARALLEL: &str = "ignore-if-parallel";

/// Added to every scenario routed to a parallel unit
pub const PARALLEL_IN_PROGRESS: &str = "parallel-in-progress";

/// Carried only by the synthetic priming scenario
pub const FIRST_PARALLEL_SCENARIO: &str = "first-parallel-scenario";

/// Strip whitespace and a leading `@`
pub fn normalize(label: &str) -> &str {
    let label = label.trim();
    label.strip_prefix('@').unwrap_or(label)
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct TagTerm {
    label: String,
    negated: bool,
}

impl TagTerm {
    fn matches(&self, annotations: &Annotations) -> bool {
        annotations.contains(&self.label) != self.negated
    }
}

/// Conjunction of OR-lists of tag terms
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagFilter {
    clauses: Vec<Vec<TagTerm>>,
}

impl TagFilter {
    pub fn parse(expressions: &[String]) -> Result<Self, ParseError> {
        let mut clauses = Vec::with_capacity(expressions.len());

        for expression in expressions {
            let mut clause = Vec::new();
            for raw in expression.split(',') {
                let raw = raw.trim();
                let (negated, rest) = match raw.strip_prefix('~') {
                    Some(rest) => (true, rest),
                    None => (false, raw),
                };
                let label = normalize(rest);
                if label.is_empty() {
                    return Err(ParseError::TagExpression(expression.clone()));
                }
                clause.push(TagTerm {
                    label: label.to_string(),
                    negated,
                });
            }
            clauses.push(clause);
        }

        Ok(Self { clauses })
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches(&self, annotations: &Annotations) -> bool {
        self.clauses
            .iter()
            .all(|clause| clause.iter().any(|term| term.matches(annotations)))
    }
}
