//! Gherkin parsing adapter
//!
//! Reads `.feature` files with the `gherkin` crate and converts them into the
//! crate's specification tree. Rules are flattened into their feature; tags
//! of the feature and rule are inherited by each scenario.

use gherkin::GherkinEnv;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ParseError;
use crate::models::{Annotations, Grouping, GroupingInfo, Scenario, SharedSetup, SpecTree, Step};

const FEATURE_EXTENSION: &str = "feature";

/// Parse every feature file reachable from `paths`, in a stable order
pub fn parse_paths(paths: &[PathBuf]) -> Result<SpecTree, ParseError> {
    let mut files = Vec::new();
    for path in paths {
        collect_feature_files(path, &mut files)?;
    }

    let groupings = files
        .iter()
        .map(|file| parse_file(file))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Parsed {} feature file(s)", groupings.len());
    Ok(SpecTree::new(groupings))
}

pub fn parse_file(path: &Path) -> Result<Grouping, ParseError> {
    let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&source, path)
}

pub fn parse_source(source: &str, path: &Path) -> Result<Grouping, ParseError> {
    let feature =
        gherkin::Feature::parse(source, GherkinEnv::default()).map_err(|e| ParseError::Syntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(convert_feature(feature, &path.display().to_string()))
}

fn collect_feature_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<(), ParseError> {
    if !path.exists() {
        return Err(ParseError::NotFound(path.to_path_buf()));
    }

    if !path.is_dir() {
        files.push(path.to_path_buf());
        return Ok(());
    }

    let io_error = |source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(path)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_feature_files(&entry, files)?;
        } else if entry.extension().is_some_and(|ext| ext == FEATURE_EXTENSION) {
            files.push(entry);
        }
    }

    Ok(())
}

fn convert_feature(feature: gherkin::Feature, uri: &str) -> Grouping {
    let info = GroupingInfo {
        keyword: feature.keyword,
        name: feature.name,
        description: feature.description.unwrap_or_default(),
        uri: uri.to_string(),
        line: feature.position.line,
    };

    let setup = feature.background.map(|background| SharedSetup {
        keyword: background.keyword,
        name: String::new(),
        steps: convert_steps(background.steps),
    });

    let inherited = Annotations::new(&feature.tags);
    let mut scenarios: Vec<Scenario> = feature
        .scenarios
        .into_iter()
        .flat_map(|scenario| convert_scenario(scenario, uri, &inherited, &[]))
        .collect();

    for rule in feature.rules {
        let mut rule_tags = inherited.clone();
        rule_tags.extend(&Annotations::new(&rule.tags));
        let rule_setup = rule
            .background
            .map(|background| convert_steps(background.steps))
            .unwrap_or_default();

        scenarios.extend(
            rule.scenarios
                .into_iter()
                .flat_map(|scenario| convert_scenario(scenario, uri, &rule_tags, &rule_setup)),
        );
    }

    Grouping {
        info,
        setup,
        scenarios,
    }
}

fn convert_scenario(
    scenario: gherkin::Scenario,
    uri: &str,
    inherited: &Annotations,
    prefix: &[Step],
) -> Vec<Scenario> {
    let mut annotations = Annotations::new(&scenario.tags);
    annotations.extend(inherited);

    let mut steps = prefix.to_vec();
    steps.extend(convert_steps(scenario.steps));

    let template = Scenario {
        keyword: scenario.keyword,
        name: scenario.name,
        uri: uri.to_string(),
        line: scenario.position.line,
        steps,
        annotations,
    };

    if scenario.examples.is_empty() {
        return vec![template];
    }

    scenario
        .examples
        .iter()
        .flat_map(|examples| expand_examples(&template, examples))
        .collect()
}

/// One scenario per examples row, with `<column>` placeholders filled in
fn expand_examples(template: &Scenario, examples: &gherkin::Examples) -> Vec<Scenario> {
    let Some(table) = &examples.table else {
        return Vec::new();
    };
    let Some((header, rows)) = table.rows.split_first() else {
        return Vec::new();
    };
    let tags = Annotations::new(&examples.tags);

    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let values: Vec<(String, &str)> = header
                .iter()
                .zip(row)
                .map(|(column, value)| (format!("<{column}>"), value.as_str()))
                .collect();
            let fill = |text: &str| {
                values
                    .iter()
                    .fold(text.to_string(), |acc, (key, value)| acc.replace(key.as_str(), value))
            };

            let steps = template
                .steps
                .iter()
                .map(|step| Step {
                    keyword: step.keyword.clone(),
                    text: fill(&step.text),
                    docstring: step.docstring.as_deref().map(|d| fill(d)),
                    table: step.table.as_ref().map(|rows| {
                        rows.iter()
                            .map(|cells| cells.iter().map(|c| fill(c.as_str())).collect())
                            .collect()
                    }),
                    line: step.line,
                })
                .collect();

            let mut annotations = template.annotations.clone();
            annotations.extend(&tags);

            Scenario {
                keyword: template.keyword.clone(),
                name: fill(&template.name),
                uri: template.uri.clone(),
                line: table.position.line + index + 1,
                steps,
                annotations,
            }
        })
        .collect()
}

fn convert_steps(steps: Vec<gherkin::Step>) -> Vec<Step> {
    steps
        .into_iter()
        .map(|step| Step {
            keyword: step.keyword,
            text: step.value,
            docstring: step.docstring.map(trim_docstring),
            table: step.table.map(|table| table.rows),
            line: step.position.line,
        })
        .collect()
}

/// Drop the line breaks that follow the opening and precede the closing delimiter
fn trim_docstring(raw: String) -> String {
    let text = raw.strip_prefix('\n').unwrap_or(&raw);
    let text = text.trim_end_matches([' ', '\t']);
    text.strip_suffix('\n').unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CART: &str = r#"@checkout
Feature: Cart
  Shopping cart behaviour

  Background:
    Given a background step

  @parallel-ok
  Scenario: Read the cart
    When I run a passing step
    Then everything should be ok

  @ignore-if-parallel
  Scenario: Reset fixtures
    When I run a passing step

  Scenario: Mutate the cart
    When I run a passing step with a doc string:
      """
      payload
      """
"#;

    #[test]
    fn test_parse_source_builds_grouping() {
        let grouping = parse_source(CART, Path::new("features/cart.feature")).unwrap();

        assert_eq!(grouping.info.name, "Cart");
        assert_eq!(grouping.info.uri, "features/cart.feature");
        assert_eq!(grouping.scenarios.len(), 3);

        let setup = grouping.setup.as_ref().unwrap();
        assert_eq!(setup.steps.len(), 1);
        assert_eq!(setup.steps[0].text, "a background step");

        let first = &grouping.scenarios[0];
        assert_eq!(first.name, "Read the cart");
        assert!(first.annotations.contains("parallel-ok"));
        assert!(first.annotations.contains("checkout"));
        assert_eq!(first.steps.len(), 2);

        let last = &grouping.scenarios[2];
        assert_eq!(last.steps[0].docstring.as_deref(), Some("payload"));
    }

    #[test]
    fn test_docstring_keeps_relative_indentation() {
        let source = "Feature: Docs\n  Scenario: s\n    Given a step with a doc string:\n      \"\"\"\n      first\n        second\n      \"\"\"\n";
        let grouping = parse_source(source, Path::new("docs.feature")).unwrap();

        assert_eq!(
            grouping.scenarios[0].steps[0].docstring.as_deref(),
            Some("first\n  second")
        );
    }

    #[test]
    fn test_outline_expands_one_scenario_per_row() {
        let source = r#"Feature: Outlines
  Scenario Outline: Run a <status> step
    When I run a <status> step
    Then everything should be ok

    @parallel-ok
    Examples:
      | status  |
      | passing |
      | pending |
"#;
        let grouping = parse_source(source, Path::new("outlines.feature")).unwrap();

        let names: Vec<&str> = grouping.scenarios.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Run a passing step", "Run a pending step"]);

        let texts: Vec<&str> = grouping
            .scenarios
            .iter()
            .map(|s| s.steps[0].text.as_str())
            .collect();
        assert_eq!(texts, vec!["I run a passing step", "I run a pending step"]);
        assert!(grouping.scenarios.iter().all(|s| s.annotations.contains("parallel-ok")));
        assert!(grouping.scenarios[0].line < grouping.scenarios[1].line);
        assert!(!grouping.scenarios[1].steps[1].text.contains('<'));
    }

    #[test]
    fn test_syntax_errors_are_reported() {
        let err = parse_source("Scenario without a feature", Path::new("bad.feature")).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_parse_paths_walks_directories_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();

        for (path, name) in [
            (dir.path().join("b.feature"), "B"),
            (nested.join("a.feature"), "Nested"),
            (dir.path().join("a.feature"), "A"),
        ] {
            let mut file = fs::File::create(path).unwrap();
            writeln!(file, "Feature: {name}\n  Scenario: s\n    Given a background step").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let tree = parse_paths(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<&str> = tree
            .groupings
            .iter()
            .map(|g| g.info.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "Nested"]);
    }

    #[test]
    fn test_missing_path() {
        let err = parse_paths(&[PathBuf::from("/definitely/not/here")]).unwrap_err();
        assert!(matches!(err, ParseError::NotFound(_)));
    }
}
