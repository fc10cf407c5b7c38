//! Configuration module for the eatery ordering agent.
//!
//! This module provides the configuration structures for the service and
//! utilities to load them from TOML files. Values may reference environment
//! variables, and the configuration can be split across several files.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["menu.toml", "storage.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ordering agent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this service instance.
	pub service: ServiceConfig,
	/// In-memory session lifecycle settings.
	#[serde(default)]
	pub sessions: SessionConfig,
	/// Configuration for the order storage backend.
	pub storage: StorageConfig,
	/// Configuration for the HTTP webhook server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance, used in logs.
	pub id: String,
}

/// Settings for in-flight order sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
	/// Seconds a session may sit idle before it is abandoned.
	/// Zero keeps sessions until they are completed.
	#[serde(default = "default_idle_timeout_seconds")]
	pub idle_timeout_seconds: u64,
	/// Interval in seconds between sweeps for idle sessions.
	#[serde(default = "default_cleanup_interval_seconds")]
	pub cleanup_interval_seconds: u64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			idle_timeout_seconds: default_idle_timeout_seconds(),
			cleanup_interval_seconds: default_cleanup_interval_seconds(),
		}
	}
}

fn default_idle_timeout_seconds() -> u64 {
	1800 // 30 minutes
}

fn default_cleanup_interval_seconds() -> u64 {
	60
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl StorageConfig {
	/// Returns the configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Configuration for the HTTP webhook server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Path the platform posts fulfillment requests to.
	#[serde(default = "default_webhook_path")]
	pub webhook_path: String,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	8000
}

fn default_webhook_path() -> String {
	"/webhook".to_string()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if self.storage.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate session sweeping
		if self.sessions.cleanup_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Session cleanup_interval_seconds must be greater than 0".into(),
			));
		}
		if self.sessions.cleanup_interval_seconds > 86400 {
			return Err(ConfigError::Validation(
				"Session cleanup_interval_seconds cannot exceed 86400 (24 hours)".into(),
			));
		}

		// Validate API config if enabled
		if let Some(ref api) = self.api {
			if api.enabled && !api.webhook_path.starts_with('/') {
				return Err(ConfigError::Validation(format!(
					"API webhook_path '{}' must start with '/'",
					api.webhook_path
				)));
			}
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[service]
id = "pandeyji-eatery"

[storage]
primary = "memory"
[storage.implementations.memory]
menu = { pizza = 8, samosa = 5 }
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("EATERY_TEST_HOST", "localhost");
		std::env::set_var("EATERY_TEST_PORT", "8080");

		let input = "host = \"${EATERY_TEST_HOST}:${EATERY_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:8080\"");

		std::env::remove_var("EATERY_TEST_HOST");
		std::env::remove_var("EATERY_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${EATERY_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${EATERY_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("EATERY_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config: Config = MINIMAL.parse().unwrap();

		assert_eq!(config.service.id, "pandeyji-eatery");
		assert_eq!(config.sessions.idle_timeout_seconds, 1800);
		assert_eq!(config.sessions.cleanup_interval_seconds, 60);
		assert!(config.api.is_none());
		assert!(config.storage.primary_config().is_some());
	}

	#[test]
	fn test_api_defaults() {
		let input = format!("{}\n[api]\nenabled = true\n", MINIMAL);
		let config: Config = input.parse().unwrap();
		let api = config.api.unwrap();

		assert!(api.enabled);
		assert_eq!(api.host, "127.0.0.1");
		assert_eq!(api.port, 8000);
		assert_eq!(api.webhook_path, "/webhook");
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("EATERY_TEST_SERVICE_ID", "eatery-from-env");

		let input = MINIMAL.replace("pandeyji-eatery", "${EATERY_TEST_SERVICE_ID}");
		let config: Config = input.parse().unwrap();
		assert_eq!(config.service.id, "eatery-from-env");

		std::env::remove_var("EATERY_TEST_SERVICE_ID");
	}

	#[test]
	fn test_empty_service_id_rejected() {
		let input = MINIMAL.replace("pandeyji-eatery", "");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Service ID"));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let input = MINIMAL.replace("primary = \"memory\"", "primary = \"file\"");
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[test]
	fn test_cleanup_interval_bounds() {
		let zero = format!("{}\n[sessions]\ncleanup_interval_seconds = 0\n", MINIMAL);
		assert!(zero.parse::<Config>().is_err());

		let huge = format!("{}\n[sessions]\ncleanup_interval_seconds = 90000\n", MINIMAL);
		assert!(huge.parse::<Config>().is_err());
	}

	#[test]
	fn test_webhook_path_must_be_absolute() {
		let input = format!(
			"{}\n[api]\nenabled = true\nwebhook_path = \"webhook\"\n",
			MINIMAL
		);
		let err = input.parse::<Config>().unwrap_err();
		assert!(err.to_string().contains("webhook_path"));
	}

	#[test]
	fn test_parse_error_is_reported() {
		let err = "[service\nid = 1".parse::<Config>().unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}
}
