//! Builder pattern for constructing ordering agents.
//!
//! Composes an OrderAgent from the configured storage backend using factory
//! functions keyed by implementation name.

use crate::engine::OrderAgent;
use crate::state::SessionStore;
use eatery_config::Config;
use eatery_storage::{OrderStoreInterface, OrderStoreService, StorageError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during agent construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions needed to build an OrderAgent.
///
/// Each factory takes the backend's TOML table and returns the implementation.
pub struct AgentFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing an OrderAgent with a pluggable storage backend.
pub struct AgentBuilder {
	config: Config,
}

impl AgentBuilder {
	/// Creates a new AgentBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the OrderAgent around the primary storage implementation.
	///
	/// Every configured implementation with a known factory is constructed, so
	/// configuration mistakes in secondary backends are caught at startup.
	pub fn build<SF>(self, factories: AgentFactories<SF>) -> Result<OrderAgent, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let Some(factory) = factories.storage_factories.get(name) else {
				tracing::warn!(
					component = "storage",
					implementation = %name,
					"No factory registered, skipping"
				);
				continue;
			};

			match factory(config) {
				Ok(implementation) => {
					// Validate the configuration using the backend's schema
					if let Err(e) = implementation.config_schema().validate(config) {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Invalid configuration for storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Invalid configuration for storage implementation '{}': {}",
							name, e
						)));
					}
					storage_impls.insert(name.clone(), implementation);
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		if storage_impls.is_empty() {
			return Err(BuilderError::Config(
				"No valid storage implementations available".into(),
			));
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary storage '{}' has no registered implementation",
				primary_storage
			))
		})?;

		let storage = Arc::new(OrderStoreService::new(storage_backend));
		let sessions = Arc::new(SessionStore::new());

		tracing::info!(
			service = %self.config.service.id,
			idle_timeout_seconds = self.config.sessions.idle_timeout_seconds,
			"Agent ready"
		);

		Ok(OrderAgent::new(self.config, sessions, storage))
	}
}
