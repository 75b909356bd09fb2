use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{ConfigError, Result};

/// Default driver tick interval (one 60 Hz frame).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;

/// Run loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunLoopConfig {
	/// Interval between ticks when driven by [`crate::RunLoop::spawn_driver`].
	pub tick_interval_ms: u64,
}

impl Default for RunLoopConfig {
	fn default() -> Self {
		Self {
			tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
		}
	}
}

impl RunLoopConfig {
	/// Driver tick interval. Zero is clamped to one millisecond.
	pub fn tick_interval(&self) -> Duration {
		Duration::from_millis(self.tick_interval_ms.max(1))
	}

	/// Parses configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		parse_toml(text)
	}

	/// Reads configuration from a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		load_toml(path)
	}
}

/// Parses any deserialisable config section from TOML text.
pub fn parse_toml<T: DeserializeOwned>(text: &str) -> Result<T> {
	Ok(toml::from_str(text)?)
}

/// Reads and parses a TOML file.
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
	let path = path.as_ref();
	let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	parse_toml(&text)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_uses_defaults() {
		let config = RunLoopConfig::from_toml_str("").unwrap();
		assert_eq!(config, RunLoopConfig::default());
		assert_eq!(config.tick_interval(), Duration::from_millis(16));
	}

	#[test]
	fn overrides_interval() {
		let config = RunLoopConfig::from_toml_str("tick-interval-ms = 5").unwrap();
		assert_eq!(config.tick_interval_ms, 5);
	}

	#[test]
	fn zero_interval_is_clamped() {
		let config = RunLoopConfig { tick_interval_ms: 0 };
		assert_eq!(config.tick_interval(), Duration::from_millis(1));
	}

	#[test]
	fn rejects_unknown_keys() {
		let err = RunLoopConfig::from_toml_str("tick-rate = 5").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)), "got {err}");
	}

	#[test]
	fn missing_file_reports_path() {
		let err = RunLoopConfig::load("/nonexistent/batchfind/runloop.toml").unwrap_err();
		match err {
			ConfigError::Io { path, .. } => assert!(path.ends_with("runloop.toml")),
			other => panic!("expected Io error, got {other}"),
		}
	}
}
