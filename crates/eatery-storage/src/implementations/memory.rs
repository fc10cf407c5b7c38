//! In-memory storage backend implementation.
//!
//! This module provides a memory-based implementation of the OrderStoreInterface
//! trait, useful for development and tests where persistence is not required.

use crate::{Menu, OrderLedger, OrderStoreInterface, StorageError, StorageFactory, StorageRegistry};
use async_trait::async_trait;
use eatery_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, OrderId, Schema, ValidationError,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory storage implementation.
///
/// Orders live in a ledger behind a read-write lock and are lost on restart.
pub struct MemoryStorage {
	menu: Menu,
	ledger: Arc<RwLock<OrderLedger>>,
}

impl MemoryStorage {
	pub fn new(menu: Menu) -> Self {
		Self {
			menu,
			ledger: Arc::new(RwLock::new(OrderLedger::default())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new(Menu::default())
	}
}

#[async_trait]
impl OrderStoreInterface for MemoryStorage {
	async fn next_order_id(&self) -> Result<OrderId, StorageError> {
		Ok(self.ledger.write().await.allocate_order_id())
	}

	async fn insert_order_line(
		&self,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError> {
		self.ledger
			.write()
			.await
			.insert_line(&self.menu, food_item, quantity, order_id)
	}

	async fn insert_tracking_row(
		&self,
		order_id: OrderId,
		status: &str,
	) -> Result<(), StorageError> {
		self.ledger.write().await.insert_tracking(order_id, status);
		Ok(())
	}

	async fn order_total(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
		self.ledger.read().await.total(order_id)
	}

	async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, StorageError> {
		Ok(self.ledger.read().await.status(order_id).map(str::to_string))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new(
				"menu",
				FieldType::Map(Box::new(FieldType::NonNegativeNumber)),
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - `menu`: table of item name to unit price (default: the house menu)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let menu = Menu::from_config(config)?;
	Ok(Box::new(MemoryStorage::new(menu)))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
