//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SPEARS";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Suite paths from SPEARS_PATHS, split like `PATH`
    pub paths: Option<Vec<PathBuf>>,
    /// Tag expressions from SPEARS_TAGS, separated by whitespace
    pub tags: Option<Vec<String>>,
    /// Serial-only mode from SPEARS_SERIAL
    pub serial: Option<bool>,
    /// Output format from SPEARS_FORMAT
    pub format: Option<String>,
    /// Disable colors from SPEARS_NO_COLOR
    pub no_color: Option<bool>,
    /// Log level from SPEARS_LOG
    pub log_level: Option<String>,
    /// Config file from SPEARS_CONFIG
    pub config_file: Option<String>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self {
            paths: env::var_os(format!("{ENV_PREFIX}_PATHS"))
                .map(|raw| env::split_paths(&raw).collect()),
            tags: get_env("TAGS").map(|raw| raw.split_whitespace().map(String::from).collect()),
            serial: get_env_bool("SERIAL"),
            format: get_env("FORMAT"),
            no_color: get_env_bool("NO_COLOR"),
            log_level: get_env("LOG"),
            config_file: get_env("CONFIG"),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.paths.is_some()
            || self.tags.is_some()
            || self.serial.is_some()
            || self.format.is_some()
            || self.no_color.is_some()
            || self.log_level.is_some()
            || self.config_file.is_some()
    }
}

/// Get environment variable with prefix
fn get_env(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}_{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Get environment variable as boolean
fn get_env_bool(name: &str) -> Option<bool> {
    get_env(name).map(|v| {
        matches!(
            v.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on" | "enabled"
        )
    })
}

/// Builder for setting environment variables (useful for testing)
#[derive(Debug, Default)]
pub struct EnvBuilder {
    vars: Vec<(String, String)>,
}

impl EnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.push((format!("{ENV_PREFIX}_{name}"), value.into()));
        self
    }

    pub fn paths(self, paths: impl Into<String>) -> Self {
        self.var("PATHS", paths)
    }

    pub fn tags(self, tags: impl Into<String>) -> Self {
        self.var("TAGS", tags)
    }

    pub fn serial(self, serial: bool) -> Self {
        self.var("SERIAL", serial.to_string())
    }

    pub fn format(self, format: impl Into<String>) -> Self {
        self.var("FORMAT", format)
    }

    pub fn no_color(self, no_color: bool) -> Self {
        self.var("NO_COLOR", no_color.to_string())
    }

    pub fn log_level(self, level: impl Into<String>) -> Self {
        self.var("LOG", level)
    }

    pub fn config_file(self, path: impl Into<String>) -> Self {
        self.var("CONFIG", path)
    }

    /// Apply environment variables
    pub fn apply(self) {
        for (key, value) in self.vars {
            env::set_var(key, value);
        }
    }

    /// Apply and return guard that restores on drop
    pub fn apply_scoped(self) -> EnvGuard {
        let previous: Vec<_> = self
            .vars
            .iter()
            .map(|(k, _)| (k.clone(), env::var(k).ok()))
            .collect();

        self.apply();

        EnvGuard { previous }
    }
}

/// Guard that restores environment variables on drop
pub struct EnvGuard {
    previous: Vec<(String, Option<String>)>,
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

/// Help text listing every SPEARS_* variable
pub fn env_help() -> String {
    let vars = [
        ("PATHS", "Suite paths, separated like PATH"),
        ("TAGS", "Tag expressions, separated by whitespace"),
        ("SERIAL", "Run every scenario serially (true/false)"),
        ("FORMAT", "Output format (pretty, summary, json, json-pretty, csv)"),
        ("NO_COLOR", "Disable ANSI colors (true/false)"),
        ("LOG", "Log level (trace, debug, info, warn, error)"),
        ("CONFIG", "Path to configuration file"),
    ];

    let mut out = String::from("Environment Variables:\n");
    for (name, description) in vars {
        out.push_str(&format!("  {:<18} {}\n", format!("{ENV_PREFIX}_{name}"), description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_config_default() {
        let config = EnvConfig::default();
        assert!(config.paths.is_none());
        assert!(!config.has_any());
    }

    // The only test in the crate that touches the process environment.
    #[test]
    fn test_env_builder_round_trip() {
        let joined = env::join_paths(["features/a", "features/b"]).unwrap();
        let guard = EnvBuilder::new()
            .paths(joined.to_string_lossy())
            .tags("@fast,@smoke ~@wip")
            .serial(true)
            .format("json")
            .no_color(false)
            .log_level("debug")
            .config_file("ci/spears.yaml")
            .apply_scoped();

        let config = EnvConfig::load();
        assert_eq!(
            config.paths,
            Some(vec![PathBuf::from("features/a"), PathBuf::from("features/b")])
        );
        assert_eq!(
            config.tags,
            Some(vec!["@fast,@smoke".to_string(), "~@wip".to_string()])
        );
        assert_eq!(config.serial, Some(true));
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.no_color, Some(false));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.config_file.as_deref(), Some("ci/spears.yaml"));

        drop(guard);
        assert_eq!(EnvConfig::load().serial, None);
    }

    #[test]
    fn test_env_help_lists_prefix() {
        let help = env_help();
        assert!(help.contains("SPEARS_PATHS"));
        assert!(help.contains("SPEARS_CONFIG"));
    }
}
