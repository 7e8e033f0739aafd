//! Configuration file management
//!
//! Handles finding, reading and writing configuration files. The format is
//! picked from the extension: `.yaml`/`.yml` is YAML, anything else JSON.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &["./spears.yaml", "./spears.yml", "./.spears.yaml"];

/// Per-user file under the platform config directory
const USER_CONFIG: &str = "spears/config.yaml";

/// Find a configuration file in the standard locations
pub fn find() -> Option<PathBuf> {
    candidates().into_iter().find(|path| path.is_file())
}

fn candidates() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = CONFIG_LOCATIONS.iter().map(PathBuf::from).collect();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(USER_CONFIG));
    }
    paths
}

pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if is_yaml_file(path) {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
    }
}

pub fn write<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = if is_yaml_file(path) {
        serde_yaml::to_string(value).context("Failed to serialize config")?
    } else {
        serde_json::to_string_pretty(value).context("Failed to serialize config")?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Expand ~ to home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
