//! Storage module for the eatery ordering agent.
//!
//! This module provides the abstraction the order pipeline persists through:
//! order id allocation, line item and tracking row inserts, and the reads used
//! to report totals and statuses. Backends are pluggable and selected by name
//! from configuration.

use async_trait::async_trait;
use eatery_types::{ConfigSchema, ImplementationRegistry, OrderId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

pub mod ledger;
pub mod menu;

pub use ledger::{OrderLedger, OrderLineRow, TrackingRow};
pub use menu::Menu;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested order is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when an order line names an item that is not on the menu.
	#[error("Unknown food item: {0}")]
	UnknownItem(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for order storage backends.
///
/// Every call is an independent, fallible operation with no retry. The core
/// does not lock around order id allocation, so each backend serializes it
/// and never hands out the same id twice, even to commits that have not yet
/// written any lines.
#[async_trait]
pub trait OrderStoreInterface: Send + Sync {
	/// Reserves a fresh order id: one past the highest id persisted or
	/// previously reserved, or 1 for an empty store.
	async fn next_order_id(&self) -> Result<OrderId, StorageError>;

	/// Persists one line item of an order.
	async fn insert_order_line(
		&self,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError>;

	/// Appends a status row to the order's tracking history.
	async fn insert_tracking_row(&self, order_id: OrderId, status: &str)
		-> Result<(), StorageError>;

	/// Computes the total price of all persisted lines of an order.
	async fn order_total(&self, order_id: OrderId) -> Result<Decimal, StorageError>;

	/// Returns the most recently recorded status of an order, if any.
	async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn OrderStoreInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service used by the order pipeline.
///
/// Wraps a backend and records every storage call in the trace log.
pub struct OrderStoreService {
	/// The underlying storage backend implementation.
	backend: Box<dyn OrderStoreInterface>,
}

impl OrderStoreService {
	pub fn new(backend: Box<dyn OrderStoreInterface>) -> Self {
		Self { backend }
	}

	pub async fn next_order_id(&self) -> Result<OrderId, StorageError> {
		let order_id = self.backend.next_order_id().await?;
		tracing::debug!(order_id = %order_id, "Allocated order id");
		Ok(order_id)
	}

	pub async fn insert_order_line(
		&self,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError> {
		self.backend
			.insert_order_line(food_item, quantity, order_id)
			.await
			.inspect_err(|e| {
				tracing::warn!(order_id = %order_id, food_item, error = %e, "Order line insert failed")
			})
	}

	pub async fn insert_tracking_row(
		&self,
		order_id: OrderId,
		status: &str,
	) -> Result<(), StorageError> {
		self.backend.insert_tracking_row(order_id, status).await?;
		tracing::debug!(order_id = %order_id, status, "Recorded tracking status");
		Ok(())
	}

	pub async fn order_total(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
		self.backend.order_total(order_id).await
	}

	pub async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, StorageError> {
		self.backend.order_status(order_id).await
	}
}
