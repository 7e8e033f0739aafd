//! Configuration module
//!
//! Resolves run settings from defaults, a config file, `SPEARS_*`
//! environment variables and the command line, in increasing precedence.

pub mod env;
pub mod file;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::Args;
use crate::error::ParseError;
use crate::models::TagFilter;
use crate::output::OutputFormat;
use crate::partition::PartitionMode;
use crate::utils::LogLevel;

pub use env::{EnvBuilder, EnvConfig, EnvGuard};

/// Settings for one run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Feature files or directories
    pub paths: Vec<PathBuf>,
    /// Tag expressions, ANDed
    pub tags: Vec<String>,
    /// Ignore parallel annotations
    pub serial: bool,
    pub format: OutputFormat,
    pub color: bool,
    pub log_level: LogLevel,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            paths: vec![PathBuf::from("features")],
            tags: Vec::new(),
            serial: false,
            format: OutputFormat::Pretty,
            color: true,
            log_level: LogLevel::Warn,
        }
    }
}

impl RunConfig {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        file::read(path.as_ref())
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        file::write(self, path.as_ref())
    }

    /// Load from the first standard location, or fall back to defaults
    pub fn load_default() -> Result<Self> {
        match file::find() {
            Some(path) => {
                debug!("Using config file {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Build the effective configuration: CLI > env > file > defaults
    pub fn resolve(args: &Args, env: &EnvConfig) -> Result<Self> {
        let explicit = args.config.as_deref().or(env.config_file.as_deref());

        let mut config = match explicit {
            Some(path) => Self::load(file::expand_path(path))?,
            None => Self::load_default()?,
        };
        config.apply_env(env)?;
        config.apply_args(args)?;
        Ok(config)
    }

    pub fn apply_env(&mut self, env: &EnvConfig) -> Result<()> {
        if let Some(paths) = &env.paths {
            self.paths = paths.clone();
        }
        if let Some(tags) = &env.tags {
            self.tags = tags.clone();
        }
        if let Some(serial) = env.serial {
            self.serial = serial;
        }
        if let Some(format) = &env.format {
            self.format = parse_format(format)?;
        }
        if let Some(no_color) = env.no_color {
            self.color = !no_color;
        }
        if let Some(level) = &env.log_level {
            self.log_level = match LogLevel::from_str(level) {
                Some(level) => level,
                None => bail!("Unknown log level: {}", level),
            };
        }
        Ok(())
    }

    pub fn apply_args(&mut self, args: &Args) -> Result<()> {
        if !args.paths.is_empty() {
            self.paths = args.paths.clone();
        }
        if !args.tags.is_empty() {
            self.tags = args.tags.clone();
        }
        if args.serial {
            self.serial = true;
        }
        if let Some(format) = &args.format {
            self.format = parse_format(format)?;
        }
        if args.no_color {
            self.color = false;
        }
        self.log_level = LogLevel::from_verbosity(self.log_level, args.verbose);
        Ok(())
    }

    pub fn partition_mode(&self) -> PartitionMode {
        if self.serial {
            PartitionMode::SerialOnly
        } else {
            PartitionMode::Split
        }
    }

    pub fn tag_filter(&self) -> Result<TagFilter, ParseError> {
        TagFilter::parse(&self.tags)
    }
}

fn parse_format(raw: &str) -> Result<OutputFormat> {
    match OutputFormat::from_str(raw) {
        Some(format) => Ok(format),
        None => bail!(
            "Unknown output format '{}' (expected pretty, summary, json, json-pretty or csv)",
            raw
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.paths, vec![PathBuf::from("features")]);
        assert!(config.color);
        assert_eq!(config.partition_mode(), PartitionMode::Split);
        assert!(config.tag_filter().unwrap().is_empty());
    }

    #[test]
    fn test_load_yaml_with_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spears.yaml");
        std::fs::write(&path, "paths: [suites]\nformat: json-pretty\nlog_level: info\n").unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.paths, vec![PathBuf::from("suites")]);
        assert_eq!(config.format, OutputFormat::JsonPretty);
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.color);
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("spears.json");
        let config = RunConfig {
            tags: vec!["@fast".to_string()],
            serial: true,
            ..Default::default()
        };

        config.save(&path).unwrap();
        assert_eq!(RunConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spears.yaml");
        std::fs::write(&path, "format: [not, a, format]\n").unwrap();

        let err = RunConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spears.yaml");
        std::fs::write(
            &path,
            "paths: [from-file]\ntags: ['@file']\nformat: csv\nlog_level: error\n",
        )
        .unwrap();

        let env = EnvConfig {
            tags: Some(vec!["@env".to_string()]),
            format: Some("summary".to_string()),
            no_color: Some(true),
            ..Default::default()
        };
        let config_arg = path.to_string_lossy().to_string();
        let args = Args::parse_from(["spears", "-c", config_arg.as_str(), "--format", "json", "-v"]);

        let config = RunConfig::resolve(&args, &env).unwrap();
        assert_eq!(config.paths, vec![PathBuf::from("from-file")]);
        assert_eq!(config.tags, vec!["@env"]);
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.color);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let mut config = RunConfig::default();
        let env = EnvConfig {
            format: Some("table".to_string()),
            ..Default::default()
        };
        assert!(config.apply_env(&env).is_err());
    }

    #[test]
    fn test_serial_flag_selects_mode() {
        let mut config = RunConfig::default();
        config
            .apply_args(&Args::parse_from(["spears", "--serial"]))
            .unwrap();
        assert_eq!(config.partition_mode(), PartitionMode::SerialOnly);
    }
}
