//! Order handler for building and completing a session's order.
//!
//! Covers the start, add, remove and complete intents. Building intents only
//! touch the session store; completion takes the order out of the store and
//! hands it to the commit pipeline.

use crate::commit::CommitPipeline;
use crate::error::AgentError;
use crate::state::{Removal, SessionError, SessionStore};
use eatery_types::{join_names, truncate_id, Intent, Parameters, SessionId};
use std::sync::Arc;
use tracing::instrument;

const NEW_ORDER_PROMPT: &str = "Starting a new order. Specify food items and quantities. \
                                For example, you can say, \"I would like to order two pizzas \
                                and one mango lassi\".";

/// Handler for the intents that build and complete an order.
pub struct OrderHandler {
	sessions: Arc<SessionStore>,
	pipeline: Arc<CommitPipeline>,
}

impl OrderHandler {
	pub fn new(sessions: Arc<SessionStore>, pipeline: Arc<CommitPipeline>) -> Self {
		Self { sessions, pipeline }
	}

	/// Starts an empty order, discarding anything the session had.
	#[instrument(skip_all, fields(session = %truncate_id(session_id.as_str())))]
	pub async fn start(&self, session_id: &SessionId) -> Result<String, AgentError> {
		self.sessions.start(session_id).await;
		tracing::info!("Started new order");
		Ok(NEW_ORDER_PROMPT.to_string())
	}

	/// Adds the requested items, replacing quantities of items already ordered.
	#[instrument(skip_all, fields(session = %truncate_id(session_id.as_str())))]
	pub async fn add(
		&self,
		session_id: &SessionId,
		parameters: &Parameters,
	) -> Result<String, AgentError> {
		let items = parameters
			.food_items()
			.map_err(|e| AgentError::malformed(Intent::AddToOrder, e))?;
		let quantities = parameters
			.quantities()
			.map_err(|e| AgentError::malformed(Intent::AddToOrder, e))?;

		let lines = self
			.sessions
			.add_items(session_id, &items, &quantities)
			.await
			.map_err(|e| match e {
				SessionError::InvalidItems(e) => AgentError::malformed(Intent::AddToOrder, e),
				SessionError::NoActiveOrder => AgentError::SessionNotFound,
			})?;

		tracing::debug!(items = lines.len(), "Updated order");
		if lines.is_empty() {
			return Ok("Your order is empty. What would you like to order?".to_string());
		}
		Ok(format!(
			"So far you ordered: {}. Do you want anything else?",
			lines
		))
	}

	/// Removes the named items from the order.
	#[instrument(skip_all, fields(session = %truncate_id(session_id.as_str())))]
	pub async fn remove(
		&self,
		session_id: &SessionId,
		parameters: &Parameters,
	) -> Result<String, AgentError> {
		let items = parameters
			.food_items()
			.map_err(|e| AgentError::malformed(Intent::RemoveFromOrder, e))?;

		let removal = self
			.sessions
			.remove_items(session_id, &items)
			.await
			.map_err(|e| match e {
				SessionError::NoActiveOrder => AgentError::SessionNotFound,
				SessionError::InvalidItems(e) => AgentError::malformed(Intent::RemoveFromOrder, e),
			})?;

		tracing::debug!(
			removed = removal.removed.len(),
			not_found = removal.not_found.len(),
			"Removed items"
		);
		Ok(removal_summary(&removal))
	}

	/// Commits the order and reports its id and total.
	///
	/// The session is cleared before the commit is attempted, so a failed
	/// commit is never retried with the same order.
	#[instrument(skip_all, fields(session = %truncate_id(session_id.as_str())))]
	pub async fn complete(&self, session_id: &SessionId) -> Result<String, AgentError> {
		let lines = self
			.sessions
			.take(session_id)
			.await
			.ok_or(AgentError::SessionNotFound)?;

		if lines.is_empty() {
			tracing::info!("Completion requested for empty order");
			return Ok(
				"Your order is empty, so nothing was placed. Please place a new order."
					.to_string(),
			);
		}

		let order_id = self.pipeline.commit(lines).await?;

		match self.pipeline.order_total(order_id).await {
			Ok(total) => Ok(format!(
				"Awesome! Your order has been placed successfully. Order ID: {}. \
				 Total Amount: {}. You can pay at delivery.",
				order_id, total
			)),
			Err(e) => {
				tracing::warn!(order_id = %order_id, error = %e, "Failed to compute order total");
				Ok(format!(
					"Awesome! Your order has been placed successfully. Order ID: {}. \
					 The total will be confirmed at delivery.",
					order_id
				))
			},
		}
	}
}

fn removal_summary(removal: &Removal) -> String {
	let mut text = String::new();
	if !removal.removed.is_empty() {
		text.push_str(&format!("Removed: {}. ", join_names(&removal.removed)));
	}
	if !removal.not_found.is_empty() {
		text.push_str(&format!(
			"{} not found in your order. ",
			join_names(&removal.not_found)
		));
	}
	if removal.remaining.is_empty() {
		text.push_str("Your order is now empty.");
	} else {
		text.push_str(&format!("Remaining items: {}", removal.remaining));
	}
	text
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::commit::CommitError;
	use crate::testing::ScriptedStore;
	use rust_decimal::Decimal;
	use serde_json::json;

	fn handler(store: &ScriptedStore) -> (OrderHandler, Arc<SessionStore>) {
		let sessions = Arc::new(SessionStore::new());
		let pipeline = Arc::new(CommitPipeline::new(store.service()));
		(OrderHandler::new(Arc::clone(&sessions), pipeline), sessions)
	}

	fn params(value: serde_json::Value) -> Parameters {
		serde_json::from_value(value).unwrap()
	}

	fn session() -> SessionId {
		SessionId::parse("abc123").unwrap()
	}

	#[tokio::test]
	async fn test_add_reports_running_summary() {
		let (handler, _) = handler(&ScriptedStore::new());

		handler
			.add(&session(), &params(json!({"food-item": ["pizza"], "number": [2.0]})))
			.await
			.unwrap();
		let reply = handler
			.add(&session(), &params(json!({"food-item": ["coke"], "number": [1]})))
			.await
			.unwrap();

		assert_eq!(
			reply,
			"So far you ordered: 1 coke, 2 pizza. Do you want anything else?"
		);
	}

	#[tokio::test]
	async fn test_add_with_mismatched_lists() {
		let (handler, sessions) = handler(&ScriptedStore::new());

		let err = handler
			.add(
				&session(),
				&params(json!({"food-item": ["pizza", "coke"], "number": [2]})),
			)
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			AgentError::MalformedParameters {
				intent: Intent::AddToOrder,
				..
			}
		));
		assert!(!sessions.contains(&session()).await);
	}

	#[tokio::test]
	async fn test_add_rejects_fractional_quantity() {
		let (handler, _) = handler(&ScriptedStore::new());

		let err = handler
			.add(&session(), &params(json!({"food-item": ["pizza"], "number": [1.5]})))
			.await
			.unwrap_err();
		assert!(matches!(err, AgentError::MalformedParameters { .. }));
	}

	#[tokio::test]
	async fn test_remove_summary() {
		let (handler, _) = handler(&ScriptedStore::new());
		handler
			.add(
				&session(),
				&params(json!({"food-item": ["pizza", "burger"], "number": [2, 1]})),
			)
			.await
			.unwrap();

		let reply = handler
			.remove(&session(), &params(json!({"food-item": ["pizza", "taco"]})))
			.await
			.unwrap();
		assert_eq!(
			reply,
			"Removed: pizza. taco not found in your order. Remaining items: 1 burger"
		);

		let reply = handler
			.remove(&session(), &params(json!({"food-item": ["burger"]})))
			.await
			.unwrap();
		assert_eq!(reply, "Removed: burger. Your order is now empty.");
	}

	#[tokio::test]
	async fn test_remove_without_order() {
		let (handler, sessions) = handler(&ScriptedStore::new());

		let err = handler
			.remove(&session(), &params(json!({"food-item": ["pizza"]})))
			.await
			.unwrap_err();
		assert!(matches!(err, AgentError::SessionNotFound));
		assert!(sessions.is_empty().await);
	}

	#[tokio::test]
	async fn test_start_resets_order() {
		let (handler, sessions) = handler(&ScriptedStore::new());
		handler
			.add(&session(), &params(json!({"food-item": "pizza", "number": 2})))
			.await
			.unwrap();

		let reply = handler.start(&session()).await.unwrap();
		assert!(reply.starts_with("Starting a new order."));
		assert_eq!(sessions.peek(&session()).await.map(|l| l.len()), Some(0));
	}

	#[tokio::test]
	async fn test_complete_reports_id_and_total() {
		let store = ScriptedStore::new().with_total(Decimal::from(450));
		let (handler, sessions) = handler(&store);
		handler
			.add(
				&session(),
				&params(json!({"food-item": ["pizza", "coke"], "number": [2, 1]})),
			)
			.await
			.unwrap();

		let reply = handler.complete(&session()).await.unwrap();
		assert_eq!(
			reply,
			"Awesome! Your order has been placed successfully. Order ID: 1. \
			 Total Amount: 450. You can pay at delivery."
		);
		assert!(!sessions.contains(&session()).await);
	}

	#[tokio::test]
	async fn test_complete_without_total() {
		let store = ScriptedStore::new().fail_reads();
		let (handler, _) = handler(&store);
		handler
			.add(&session(), &params(json!({"food-item": ["pizza"], "number": [1]})))
			.await
			.unwrap();

		let reply = handler.complete(&session()).await.unwrap();
		assert!(reply.contains("Order ID: 1."));
		assert!(reply.contains("The total will be confirmed at delivery."));
	}

	#[tokio::test]
	async fn test_failed_commit_clears_session() {
		let store = ScriptedStore::new().fail_insert_at(1);
		let (handler, sessions) = handler(&store);
		handler
			.add(
				&session(),
				&params(json!({"food-item": ["pizza", "coke"], "number": [2, 1]})),
			)
			.await
			.unwrap();

		let err = handler.complete(&session()).await.unwrap_err();
		assert!(matches!(
			err,
			AgentError::CommitFailed(CommitError::LineInsert { .. })
		));
		assert!(!sessions.contains(&session()).await);
		assert!(store.state().tracking.is_empty());
	}

	#[tokio::test]
	async fn test_complete_empty_order_commits_nothing() {
		let store = ScriptedStore::new();
		let (handler, sessions) = handler(&store);
		handler.start(&session()).await.unwrap();

		let reply = handler.complete(&session()).await.unwrap();
		assert!(reply.starts_with("Your order is empty"));
		assert!(!sessions.contains(&session()).await);
		assert_eq!(store.state().inserts_attempted, 0);
	}
}
