//! Viewer configuration.
//!
//! Settings come either from a flat key/value store (`font`, `plugins`,
//! `uppercase`, ...) or from a JSON document with the same field names.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{HexViewError, Result};
use crate::reader::progress::DEFAULT_PROGRESS_INTERVAL;
use crate::reader::DEFAULT_CHUNK_SIZE;

/// Largest accepted read buffer.
pub const MAX_CHUNK_SIZE: usize = 1 << 20;

/// Main configuration for a document session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Font name handed to the view layer
    pub font: Option<String>,
    /// Plugins loaded when the session is built, in order
    pub plugins: Vec<String>,
    /// Render hex digits in uppercase
    pub uppercase: bool,
    /// Read buffer capacity in bytes
    pub chunk_size: usize,
    /// Minimum delay between progress updates
    pub progress_interval_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            font: None,
            plugins: Vec::new(),
            uppercase: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL.as_millis() as u64,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(HexViewError::Config(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HexViewError::Config(format!("{key}: expected a number, got {value:?}")))
}

/// Splits a comma-separated plugin list, dropping blanks and duplicates.
fn parse_plugin_list(value: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

impl ViewerConfig {
    /// Applies one setting. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.trim() {
            "font" => {
                let font = value.trim();
                self.font = (!font.is_empty()).then(|| font.to_string());
            }
            "plugins" => self.plugins = parse_plugin_list(value),
            "uppercase" => self.uppercase = parse_bool(key, value)?,
            "chunk_size" => self.chunk_size = parse_number(key, value)?,
            "progress_interval_ms" => self.progress_interval_ms = parse_number(key, value)?,
            other => debug!(key = other, "Ignoring unknown configuration key"),
        }
        Ok(())
    }

    /// Builds a configuration from key/value pairs, starting from the defaults.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            config.set(key.as_ref(), value.as_ref())?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a `key=value` file. `[section]` headers are skipped, as are
    /// blank lines and lines starting with `#` or `;`.
    pub fn from_key_value_str(text: &str) -> Result<Self> {
        let mut pairs = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                HexViewError::Config(format!("line {}: expected key=value, got {:?}", idx + 1, line))
            })?;
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }
        Self::from_pairs(pairs)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file; `.json` files are parsed as JSON, anything
    /// else as `key=value` lines.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        debug!(path = %path.display(), json = is_json, "Loading configuration");
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_key_value_str(&text)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(HexViewError::Config(format!(
                "chunk_size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
