//! Step handler library
//!
//! Handlers are matched against step text with regular expressions; the
//! keyword a handler was registered with does not restrict matching.

use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use std::fmt;
use std::future::Future;

use crate::models::{Annotations, Scenario, Step};

/// What a step or hook handler reports
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(String),
    Pending,
}

impl StepOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        StepOutcome::Failed(message.into())
    }
}

/// Input handed to a step handler
#[derive(Clone, Debug, Default)]
pub struct StepContext {
    /// Capture groups of the matching pattern; unmatched optional groups are empty
    pub captures: Vec<String>,
    pub annotations: Annotations,
    pub docstring: Option<String>,
    pub table: Option<Vec<Vec<String>>>,
}

impl StepContext {
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index).map(String::as_str)
    }

    pub fn has_annotation(&self, label: &str) -> bool {
        self.annotations.contains(label)
    }
}

/// Input handed to a scenario hook
#[derive(Clone, Debug)]
pub struct HookContext {
    pub scenario: String,
    pub annotations: Annotations,
}

type StepFn = Box<dyn Fn(StepContext) -> LocalBoxFuture<'static, StepOutcome>>;
type HookFn = Box<dyn Fn(HookContext) -> LocalBoxFuture<'static, StepOutcome>>;

pub struct StepDefinition {
    pattern: Regex,
    handler: StepFn,
}

impl StepDefinition {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn invoke(&self, context: StepContext) -> LocalBoxFuture<'static, StepOutcome> {
        (self.handler)(context)
    }
}

pub struct Hook {
    annotation: Option<String>,
    handler: HookFn,
}

impl Hook {
    /// Untagged hooks apply to every scenario
    pub fn applies_to(&self, annotations: &Annotations) -> bool {
        self.annotation
            .as_deref()
            .map_or(true, |label| annotations.contains(label))
    }

    pub fn invoke(&self, context: HookContext) -> LocalBoxFuture<'static, StepOutcome> {
        (self.handler)(context)
    }
}

/// Result of looking up a step
pub enum StepMatch<'l> {
    Found {
        definition: &'l StepDefinition,
        captures: Vec<String>,
    },
    Undefined,
    Ambiguous(Vec<&'l str>),
}

#[derive(Default)]
pub struct StepLibrary {
    steps: Vec<StepDefinition>,
    before: Vec<Hook>,
    after: Vec<Hook>,
}

impl StepLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn given<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, regex::Error>
    where
        F: Fn(StepContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.step(pattern, handler)
    }

    pub fn when<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, regex::Error>
    where
        F: Fn(StepContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.step(pattern, handler)
    }

    pub fn then<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, regex::Error>
    where
        F: Fn(StepContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.step(pattern, handler)
    }

    pub fn step<F, Fut>(&mut self, pattern: &str, handler: F) -> Result<&mut Self, regex::Error>
    where
        F: Fn(StepContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.steps.push(StepDefinition {
            pattern: Regex::new(pattern)?,
            handler: Box::new(move |ctx| handler(ctx).boxed_local()),
        });
        Ok(self)
    }

    /// Run before every scenario carrying `annotation` (or every scenario)
    pub fn before<F, Fut>(&mut self, annotation: Option<&str>, handler: F) -> &mut Self
    where
        F: Fn(HookContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.before.push(hook(annotation, handler));
        self
    }

    pub fn after<F, Fut>(&mut self, annotation: Option<&str>, handler: F) -> &mut Self
    where
        F: Fn(HookContext) -> Fut + 'static,
        Fut: Future<Output = StepOutcome> + 'static,
    {
        self.after.push(hook(annotation, handler));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn find(&self, text: &str) -> StepMatch<'_> {
        let mut matches = self
            .steps
            .iter()
            .filter_map(|def| def.pattern.captures(text).map(|caps| (def, caps)));

        let Some((definition, caps)) = matches.next() else {
            return StepMatch::Undefined;
        };

        let others: Vec<&str> = matches.map(|(def, _)| def.pattern()).collect();
        if !others.is_empty() {
            let mut patterns = vec![definition.pattern()];
            patterns.extend(others);
            return StepMatch::Ambiguous(patterns);
        }

        let captures = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect();

        StepMatch::Found {
            definition,
            captures,
        }
    }

    pub fn before_hooks<'l>(&'l self, scenario: &'l Scenario) -> impl Iterator<Item = &'l Hook> {
        self.before
            .iter()
            .filter(|hook| hook.applies_to(&scenario.annotations))
    }

    pub fn after_hooks<'l>(&'l self, scenario: &'l Scenario) -> impl Iterator<Item = &'l Hook> {
        self.after
            .iter()
            .filter(|hook| hook.applies_to(&scenario.annotations))
    }

    pub fn context_for(&self, step: &Step, scenario: &Scenario, captures: Vec<String>) -> StepContext {
        StepContext {
            captures,
            annotations: scenario.annotations.clone(),
            docstring: step.docstring.clone(),
            table: step.table.clone(),
        }
    }
}

impl fmt::Debug for StepLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepLibrary")
            .field(
                "steps",
                &self.steps.iter().map(StepDefinition::pattern).collect::<Vec<_>>(),
            )
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

fn hook<F, Fut>(annotation: Option<&str>, handler: F) -> Hook
where
    F: Fn(HookContext) -> Fut + 'static,
    Fut: Future<Output = StepOutcome> + 'static,
{
    Hook {
        annotation: annotation.map(|label| crate::models::tag::normalize(label).to_string()),
        handler: Box::new(move |ctx| handler(ctx).boxed_local()),
    }
}
