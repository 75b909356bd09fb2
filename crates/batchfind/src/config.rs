use std::path::Path;

use batchfind_runloop::{Phase, load_toml, parse_toml};
use serde::Deserialize;

use crate::ConfigError;

/// What happens to queued lookups when their type's bulk fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
	/// Settle every affected handle with [`crate::LookupError::Fetch`].
	#[default]
	Reject,
	/// Leave affected handles pending for the lifetime of the finder.
	///
	/// Callers cannot tell failure from slowness under this policy. Parked
	/// completions are never released, so the finder's stalled set grows with
	/// every failed fetch until the finder is dropped.
	Stall,
}

/// Finder settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BatchConfig {
	/// Phase in which the flush hook drains queued lookups.
	pub flush_phase: Phase,
	/// Phase in which cache hits are delivered.
	pub cache_hit_phase: Phase,
	/// Bulk fetch failure handling.
	pub on_fetch_error: FailurePolicy,
}

impl Default for BatchConfig {
	fn default() -> Self {
		Self {
			flush_phase: Phase::AfterRender,
			cache_hit_phase: Phase::AfterRender,
			on_fetch_error: FailurePolicy::Reject,
		}
	}
}

impl BatchConfig {
	/// Parses configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		parse_toml(text)
	}

	/// Reads configuration from a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		load_toml(path)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn defaults_flush_after_render_and_reject() {
		assert_eq!(BatchConfig::from_toml_str("").unwrap(), BatchConfig::default());
	}

	#[test]
	fn parses_all_fields() {
		let config = BatchConfig::from_toml_str(
			r#"
			flush-phase = "render"
			cache-hit-phase = "actions"
			on-fetch-error = "stall"
			"#,
		)
		.unwrap();
		assert_eq!(
			config,
			BatchConfig {
				flush_phase: Phase::Render,
				cache_hit_phase: Phase::Actions,
				on_fetch_error: FailurePolicy::Stall,
			}
		);
	}

	#[test]
	fn rejects_unknown_phase() {
		assert!(BatchConfig::from_toml_str(r#"flush-phase = "later""#).is_err());
	}
}
