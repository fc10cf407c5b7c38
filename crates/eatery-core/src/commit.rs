//! Order commit pipeline.
//!
//! Persists a finished order line set: allocates an order id, writes one row
//! per line item and records the initial tracking status. Storage calls are
//! the only suspension points and are never retried.

use chrono::Utc;
use eatery_storage::{OrderStoreService, StorageError};
use eatery_types::{OrderId, OrderLines, INITIAL_TRACKING_STATUS};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Modulus applied to the unix time when order id allocation fails.
const FALLBACK_ID_MODULUS: i64 = 100_000;

/// Errors that can occur while committing an order.
#[derive(Debug, Error)]
pub enum CommitError {
	#[error("Cannot commit an empty order")]
	EmptyOrder,
	/// A line insert failed. Lines inserted before it are not rolled back.
	#[error("Failed to insert '{food_item}' for order {order_id}: {source}")]
	LineInsert {
		order_id: OrderId,
		food_item: String,
		#[source]
		source: StorageError,
	},
}

/// Writes completed orders to storage.
pub struct CommitPipeline {
	storage: Arc<OrderStoreService>,
}

impl CommitPipeline {
	pub fn new(storage: Arc<OrderStoreService>) -> Self {
		Self { storage }
	}

	/// Commits the order and returns its id.
	///
	/// Lines are inserted in the set's iteration order and the first failure
	/// aborts the rest. The tracking row is only written after every line
	/// succeeded, and a failure to write it is logged rather than returned.
	#[instrument(skip_all, fields(lines = lines.len()))]
	pub async fn commit(&self, lines: OrderLines) -> Result<OrderId, CommitError> {
		if lines.is_empty() {
			return Err(CommitError::EmptyOrder);
		}

		let order_id = self.allocate_order_id().await;

		for (food_item, quantity) in lines {
			if let Err(source) = self
				.storage
				.insert_order_line(&food_item, quantity, order_id)
				.await
			{
				tracing::error!(
					order_id = %order_id,
					food_item = %food_item,
					error = %source,
					"Order commit aborted"
				);
				return Err(CommitError::LineInsert {
					order_id,
					food_item,
					source,
				});
			}
		}

		if let Err(e) = self
			.storage
			.insert_tracking_row(order_id, INITIAL_TRACKING_STATUS)
			.await
		{
			tracing::warn!(order_id = %order_id, error = %e, "Failed to record tracking status");
		}

		tracing::info!(order_id = %order_id, "Order committed");
		Ok(order_id)
	}

	/// Total price of a committed order, as computed by storage.
	pub async fn order_total(
		&self,
		order_id: OrderId,
	) -> Result<rust_decimal::Decimal, StorageError> {
		self.storage.order_total(order_id).await
	}

	async fn allocate_order_id(&self) -> OrderId {
		match self.storage.next_order_id().await {
			Ok(order_id) => order_id,
			Err(e) => {
				let fallback = fallback_order_id(Utc::now().timestamp());
				tracing::warn!(
					error = %e,
					fallback = %fallback,
					"Order id allocation failed, using time-derived id"
				);
				fallback
			},
		}
	}
}

/// Time-derived order id used when storage cannot allocate one.
fn fallback_order_id(unix_seconds: i64) -> OrderId {
	let id = unix_seconds.rem_euclid(FALLBACK_ID_MODULUS).max(1);
	OrderId(id as u64)
}
