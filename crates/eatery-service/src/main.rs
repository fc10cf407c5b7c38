//! Main entry point for the eatery ordering service.
//!
//! This binary serves the fulfillment webhook of a conversational food
//! ordering assistant. Orders are built up per conversation, committed to the
//! configured storage backend on completion and can be tracked afterwards.

use clap::Parser;
use eatery_config::Config;
use eatery_core::{AgentBuilder, AgentFactories, OrderAgent};
use std::path::PathBuf;
use std::sync::Arc;

mod apis;
mod server;

use eatery_storage::implementations::file::create_storage as create_file_storage;
use eatery_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the eatery service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "EATERY_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the eatery service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the ordering agent with the configured storage
/// 5. Serves the webhook and sweeps idle sessions until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started eatery service");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let agent = Arc::new(build_agent(config.clone())?);

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			let api_agent = Arc::clone(&agent);

			tokio::select! {
				result = agent.run() => {
					tracing::info!("Agent finished");
					result?;
				}
				result = server::start_server(api_config, api_agent) => {
					tracing::info!("API server finished");
					result?;
				}
			}
		},
		None => {
			tracing::warn!("API disabled, no webhook will be served");
			agent.run().await?;
		},
	}

	tracing::info!("Stopped eatery service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the ordering agent with the storage implementations this binary ships.
fn build_agent(config: Config) -> Result<OrderAgent, Box<dyn std::error::Error>> {
	let builder = AgentBuilder::new(config);

	let storage_factories = create_factory_map!(
		eatery_storage::OrderStoreInterface,
		eatery_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	Ok(builder.build(AgentFactories { storage_factories })?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn memory_config() -> Config {
		r#"
			[service]
			id = "test-eatery"

			[storage]
			primary = "memory"

			[storage.implementations.memory]
		"#
		.parse()
		.unwrap()
	}

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["eatery"]);

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["eatery", "--config", "custom.toml", "-l", "debug"]);

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_create_factory_map_macro() {
		let factories = create_factory_map!(
			eatery_storage::OrderStoreInterface,
			eatery_storage::StorageError,
			"memory" => create_memory_storage,
		);

		assert_eq!(factories.len(), 1);
		assert!(factories.contains_key("memory"));
	}

	#[test]
	fn test_build_agent_with_minimal_config() {
		let agent = build_agent(memory_config()).unwrap();
		assert_eq!(agent.config().service.id, "test-eatery");
	}

	#[tokio::test]
	async fn test_build_agent_with_file_config() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("config.toml");
		let orders_path = temp_dir.path().join("orders.json");

		let config_content = format!(
			r#"
[service]
id = "file-eatery"

[sessions]
idle_timeout_seconds = 600

[storage]
primary = "file"

[storage.implementations.file]
storage_path = "{}"
menu = {{ pizza = 8 }}

[api]
enabled = true
port = 8081
"#,
			orders_path.display()
		);
		std::fs::write(&config_path, config_content).unwrap();

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.sessions.idle_timeout_seconds, 600);
		assert_eq!(config.api.as_ref().map(|api| api.port), Some(8081));

		let agent = build_agent(config).unwrap();
		agent
			.handle(
				"order.add - context: ongoing-order",
				Some("s-1"),
				&serde_json::from_str(r#"{"food-item": ["pizza"], "number": [3]}"#).unwrap(),
			)
			.await;
		let reply = agent
			.handle(
				"order.complete - context: ongoing-order",
				Some("s-1"),
				&Default::default(),
			)
			.await;

		assert!(reply.contains("Total Amount: 24."), "{}", reply);
		assert!(orders_path.exists());
	}
}
