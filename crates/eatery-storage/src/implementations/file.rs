//! File-based storage backend implementation.
//!
//! Orders and tracking rows are kept in a single JSON document. Every
//! operation loads the document, applies its change and writes it back
//! atomically, so the file is always a complete snapshot.

use crate::{Menu, OrderLedger, OrderStoreInterface, StorageError, StorageFactory, StorageRegistry};
use async_trait::async_trait;
use eatery_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderId, Schema, ValidationError,
};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

const DEFAULT_STORAGE_PATH: &str = "./data/orders.json";

/// File-based storage implementation.
pub struct FileStorage {
	/// Path of the JSON document holding the ledger.
	path: PathBuf,
	menu: Menu,
	/// Serializes read-modify-write cycles within this process.
	lock: Mutex<()>,
}

impl FileStorage {
	pub fn new(path: PathBuf, menu: Menu) -> Self {
		Self {
			path,
			menu,
			lock: Mutex::new(()),
		}
	}

	/// Reads the ledger. A missing file is an empty ledger.
	async fn load(&self) -> Result<OrderLedger, StorageError> {
		let data = match fs::read(&self.path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Ok(OrderLedger::default())
			},
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		serde_json::from_slice(&data).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Writes the ledger by writing a temp file and renaming it into place.
	async fn save(&self, ledger: &OrderLedger) -> Result<(), StorageError> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent)
					.await
					.map_err(|e| StorageError::Backend(e.to_string()))?;
			}
		}

		let bytes = serde_json::to_vec_pretty(ledger)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;

		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, bytes)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl OrderStoreInterface for FileStorage {
	async fn next_order_id(&self) -> Result<OrderId, StorageError> {
		let _guard = self.lock.lock().await;
		let mut ledger = self.load().await?;
		let order_id = ledger.allocate_order_id();
		self.save(&ledger).await?;
		Ok(order_id)
	}

	async fn insert_order_line(
		&self,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut ledger = self.load().await?;
		ledger.insert_line(&self.menu, food_item, quantity, order_id)?;
		self.save(&ledger).await
	}

	async fn insert_tracking_row(
		&self,
		order_id: OrderId,
		status: &str,
	) -> Result<(), StorageError> {
		let _guard = self.lock.lock().await;
		let mut ledger = self.load().await?;
		ledger.insert_tracking(order_id, status);
		self.save(&ledger).await
	}

	async fn order_total(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
		let _guard = self.lock.lock().await;
		self.load().await?.total(order_id)
	}

	async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, StorageError> {
		let _guard = self.lock.lock().await;
		Ok(self.load().await?.status(order_id).map(str::to_string))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path cannot be empty".into()),
					}
				}),
				Field::new(
					"menu",
					FieldType::Map(Box::new(FieldType::NonNegativeNumber)),
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: JSON document to keep orders in (default: "./data/orders.json")
/// - `menu`: table of item name to unit price (default: the house menu)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);
	let menu = Menu::from_config(config)?;

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path), menu)))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
