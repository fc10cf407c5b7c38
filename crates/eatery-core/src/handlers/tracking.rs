//! Tracking handler for order status lookups.

use crate::error::AgentError;
use eatery_storage::OrderStoreService;
use eatery_types::{Intent, Parameters};
use std::sync::Arc;
use tracing::instrument;

/// Answers status questions about persisted orders.
///
/// Reads storage only and never touches the session store.
pub struct TrackingHandler {
	storage: Arc<OrderStoreService>,
}

impl TrackingHandler {
	pub fn new(storage: Arc<OrderStoreService>) -> Self {
		Self { storage }
	}

	#[instrument(skip_all)]
	pub async fn track(&self, parameters: &Parameters) -> Result<String, AgentError> {
		let order_id = parameters
			.order_id()
			.map_err(|e| AgentError::malformed(Intent::TrackOrder, e))?;

		let status = self
			.storage
			.order_status(order_id)
			.await
			.map_err(AgentError::StorageUnavailable)?;

		tracing::debug!(order_id = %order_id, found = status.is_some(), "Looked up order status");
		Ok(match status {
			Some(status) => format!(
				"The order status for order id: {} is: {}",
				order_id, status
			),
			None => format!("No order found with order id: {}", order_id),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::ScriptedStore;
	use eatery_storage::OrderStoreInterface;
	use eatery_types::OrderId;
	use serde_json::json;

	fn params(value: serde_json::Value) -> Parameters {
		serde_json::from_value(value).unwrap()
	}

	#[tokio::test]
	async fn test_track_known_order() {
		let store = ScriptedStore::new();
		store
			.insert_tracking_row(OrderId(41), "in progress")
			.await
			.unwrap();
		let handler = TrackingHandler::new(store.service());

		let reply = handler.track(&params(json!({"order_id": 41.0}))).await.unwrap();
		assert_eq!(reply, "The order status for order id: 41 is: in progress");
	}

	#[tokio::test]
	async fn test_track_unknown_order_by_number() {
		let handler = TrackingHandler::new(ScriptedStore::new().service());

		let reply = handler.track(&params(json!({"number": "7"}))).await.unwrap();
		assert_eq!(reply, "No order found with order id: 7");
	}

	#[tokio::test]
	async fn test_track_rejects_non_numeric_id() {
		let handler = TrackingHandler::new(ScriptedStore::new().service());

		let err = handler
			.track(&params(json!({"order_id": "seven"})))
			.await
			.unwrap_err();
		assert_eq!(err.user_message(), "Please provide a valid order id.");

		let err = handler.track(&params(json!({}))).await.unwrap_err();
		assert!(matches!(
			err,
			AgentError::MalformedParameters {
				intent: Intent::TrackOrder,
				..
			}
		));
	}

	#[tokio::test]
	async fn test_track_storage_failure() {
		let handler = TrackingHandler::new(ScriptedStore::new().fail_reads().service());

		let err = handler.track(&params(json!({"order_id": 1}))).await.unwrap_err();
		assert!(matches!(err, AgentError::StorageUnavailable(_)));
	}
}
