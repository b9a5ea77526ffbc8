//! Registry configuration.
//!
//! The struct is format-neutral; [`RegistryConfig::from_toml_str`] and
//! [`RegistryConfig::load`] read it from TOML. Omitted fields take their
//! defaults and unknown fields are rejected.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Construction-time settings for a [`crate::FactoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	/// Whether missing factories may be synthesized for declared types.
	pub auto_generate: bool,
	/// Initial capacity of the factory store.
	pub initial_capacity: usize,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			auto_generate: true,
			initial_capacity: 16,
		}
	}
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),
}

impl RegistryConfig {
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(content)?)
	}

	/// Reads and parses a TOML config file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&content)
	}

	#[must_use]
	pub fn with_auto_generate(mut self, auto_generate: bool) -> Self {
		self.auto_generate = auto_generate;
		self
	}

	#[must_use]
	pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
		self.initial_capacity = initial_capacity;
		self
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		let config = RegistryConfig::from_toml_str("").expect("empty config");
		assert_eq!(config, RegistryConfig::default());
		assert!(config.auto_generate);
	}

	#[test]
	fn parses_every_field() {
		let config = RegistryConfig::from_toml_str("auto_generate = false\ninitial_capacity = 64\n").expect("config");
		assert_eq!(config, RegistryConfig::default().with_auto_generate(false).with_initial_capacity(64));
	}

	#[test]
	fn omitted_fields_keep_defaults() {
		let config = RegistryConfig::from_toml_str("initial_capacity = 2").expect("config");
		assert!(config.auto_generate);
		assert_eq!(config.initial_capacity, 2);
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let err = RegistryConfig::from_toml_str("auto_generat = true").expect_err("typo should fail");
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[test]
	fn load_reads_file() {
		let mut file = tempfile::NamedTempFile::new().expect("temp file");
		writeln!(file, "auto_generate = false").expect("write config");

		let config = RegistryConfig::load(file.path()).expect("load");
		assert!(!config.auto_generate);
	}

	#[test]
	fn load_reports_missing_file() {
		let dir = tempfile::tempdir().expect("temp dir");
		let path = dir.path().join("registry.toml");
		match RegistryConfig::load(&path) {
			Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
			other => panic!("expected Io error, got {other:?}"),
		}
	}
}
