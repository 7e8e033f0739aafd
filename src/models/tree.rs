//! Specification tree models
//!
//! Groupings (features) own ordered scenarios and an optional shared setup
//! (background) that runs before each of their scenarios.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::tag::{self, TagFilter};

/// Set of scenario annotations (tags), stored without the leading `@`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations(BTreeSet<String>);

impl Annotations {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut annotations = Self::default();
        for label in labels {
            annotations.insert(label.as_ref());
        }
        annotations
    }

    /// Add a label; returns false if it was already present
    pub fn insert(&mut self, label: &str) -> bool {
        let label = tag::normalize(label);
        if label.is_empty() {
            return false;
        }
        self.0.insert(label.to_string())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(tag::normalize(label))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: &Annotations) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl fmt::Display for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.iter().map(|l| format!("@{l}")).collect();
        write!(f, "{}", labels.join(" "))
    }
}

/// A single Given/When/Then line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub keyword: String,
    pub text: String,
    pub docstring: Option<String>,
    pub table: Option<Vec<Vec<String>>>,
    pub line: usize,
}

impl Step {
    pub fn new(keyword: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            docstring: None,
            table: None,
            line: 0,
        }
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }

    pub fn with_table(mut self, rows: Vec<Vec<String>>) -> Self {
        self.table = Some(rows);
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keyword.trim(), self.text)
    }
}

/// Setup steps run before every scenario of a grouping
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedSetup {
    pub keyword: String,
    pub name: String,
    pub steps: Vec<Step>,
}

impl SharedSetup {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            keyword: "Background".to_string(),
            name: String::new(),
            steps,
        }
    }
}

/// One executable test case
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub keyword: String,
    pub name: String,
    pub uri: String,
    pub line: usize,
    pub steps: Vec<Step>,
    pub annotations: Annotations,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            keyword: "Scenario".to_string(),
            name: name.into(),
            uri: String::new(),
            line: 0,
            steps: Vec::new(),
            annotations: Annotations::default(),
        }
    }

    pub fn with_annotation(mut self, label: &str) -> Self {
        self.annotations.insert(label);
        self
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn located(mut self, uri: impl Into<String>, line: usize) -> Self {
        self.uri = uri.into();
        self.line = line;
        self
    }

    pub fn title(&self) -> String {
        format!("{}: {}", self.keyword, self.name)
    }

    pub fn location(&self) -> String {
        format!("{}:{}", self.uri, self.line)
    }
}

/// Identity metadata of a grouping
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingInfo {
    pub keyword: String,
    pub name: String,
    pub description: String,
    pub uri: String,
    pub line: usize,
}

impl GroupingInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            keyword: "Feature".to_string(),
            name: name.into(),
            description: String::new(),
            uri: String::new(),
            line: 0,
        }
    }

    pub fn title(&self) -> String {
        format!("{}: {}", self.keyword, self.name)
    }
}

/// A named collection of scenarios sharing optional setup
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub info: GroupingInfo,
    pub setup: Option<SharedSetup>,
    pub scenarios: Vec<Scenario>,
}

impl Grouping {
    pub fn new(info: GroupingInfo) -> Self {
        Self {
            info,
            setup: None,
            scenarios: Vec::new(),
        }
    }

    pub fn with_setup(mut self, setup: SharedSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }
}

/// Ordered groupings parsed from one or more suite paths
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecTree {
    pub groupings: Vec<Grouping>,
}

impl SpecTree {
    pub fn new(groupings: Vec<Grouping>) -> Self {
        Self { groupings }
    }

    pub fn scenario_count(&self) -> usize {
        self.groupings.iter().map(|g| g.scenarios.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scenario_count() == 0
    }

    /// Keep only scenarios accepted by the filter; groupings left empty are removed
    pub fn filter(self, filter: &TagFilter) -> Self {
        if filter.is_empty() {
            return self;
        }

        let groupings = self
            .groupings
            .into_iter()
            .filter_map(|mut grouping| {
                grouping
                    .scenarios
                    .retain(|scenario| filter.matches(&scenario.annotations));
                (!grouping.scenarios.is_empty()).then_some(grouping)
            })
            .collect();

        Self { groupings }
    }
}
