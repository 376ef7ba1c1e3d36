//! `livepane.toml` loading.

use std::path::{Path, PathBuf};

use livepane_bridge::{RelayConfig, Retention};
use livepane_host::HostLimits;
use serde::Deserialize;
use thiserror::Error;

/// File name looked up in the platform config directory.
pub const CONFIG_FILE: &str = "livepane.toml";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// The file is not valid TOML or has unknown keys.
	#[error("failed to parse {path}: {error}")]
	Parse {
		/// Path to the offending file.
		path: PathBuf,
		/// The underlying parse error.
		error: toml::de::Error,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	pub relay: RelayOptions,
	pub host: HostLimits,
	pub execute: ExecuteOptions,
}

/// `[relay]`: log retention and reload behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayOptions {
	/// Console entries kept; `0` keeps everything.
	pub max_console_entries: usize,
	/// Error entries kept; `0` keeps everything.
	pub max_error_entries: usize,
	pub clear_on_reload: bool,
}

impl Default for RelayOptions {
	fn default() -> Self {
		Self {
			max_console_entries: Retention::DEFAULT_CAP,
			max_error_entries: Retention::DEFAULT_CAP,
			clear_on_reload: false,
		}
	}
}

impl RelayOptions {
	pub fn relay_config(&self) -> RelayConfig {
		let retention = |max: usize| Retention::from_max((max != 0).then_some(max));
		RelayConfig {
			console: retention(self.max_console_entries),
			errors: retention(self.max_error_entries),
			clear_on_reload: self.clear_on_reload,
		}
	}
}

/// `[execute]`: explicit execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecuteOptions {
	pub timeout_ms: u64,
}

impl Default for ExecuteOptions {
	fn default() -> Self {
		Self { timeout_ms: 2000 }
	}
}

impl ExecuteOptions {
	pub fn timeout(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.timeout_ms)
	}
}

impl Config {
	pub fn from_toml(path: &Path, text: &str) -> Result<Self> {
		toml::from_str(text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})
	}

	/// Reads `path`. A missing file yields the defaults.
	pub fn load(path: &Path) -> Result<Self> {
		match std::fs::read_to_string(path) {
			Ok(text) => {
				tracing::debug!(path = %path.display(), "config.load");
				Self::from_toml(path, &text)
			}
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "config.missing_using_defaults");
				Ok(Self::default())
			}
			Err(error) => Err(ConfigError::Io {
				path: path.to_path_buf(),
				error,
			}),
		}
	}

	/// Loads `path` if given, else the default location if there is one.
	pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
		match path.map(Path::to_path_buf).or_else(default_path) {
			Some(path) => Self::load(&path),
			None => Ok(Self::default()),
		}
	}
}

/// `<config dir>/livepane/livepane.toml`, when the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("livepane").join(CONFIG_FILE))
}
