//! Errors surfaced while fulfilling an intent.
//!
//! Handlers return [`AgentError`]; the agent turns it into the reply text at
//! the dispatch boundary so nothing propagates past [`crate::OrderAgent::handle`].

use crate::commit::CommitError;
use eatery_storage::StorageError;
use eatery_types::{Intent, ParameterError, UnknownIntent};
use thiserror::Error;

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum AgentError {
	/// The request did not name an intent.
	#[error("Request carries no intent name")]
	MissingIntent,
	/// The request did not carry a usable session id.
	#[error("Request carries no session id")]
	MissingSession,
	/// Remove or complete was requested for a session without an order.
	#[error("No active order for this session")]
	SessionNotFound,
	#[error("Malformed parameters for '{intent}': {source}")]
	MalformedParameters {
		intent: Intent,
		#[source]
		source: ParameterError,
	},
	/// A line insert failed; the session has already been cleared.
	#[error("Order commit failed: {0}")]
	CommitFailed(#[from] CommitError),
	#[error(transparent)]
	UnknownIntent(#[from] UnknownIntent),
	#[error("Storage unavailable: {0}")]
	StorageUnavailable(#[source] StorageError),
}

impl AgentError {
	pub fn malformed(intent: Intent, source: impl Into<ParameterError>) -> Self {
		AgentError::MalformedParameters {
			intent,
			source: source.into(),
		}
	}

	/// Text shown to the user in place of a regular reply.
	pub fn user_message(&self) -> String {
		match self {
			AgentError::MissingIntent => "Sorry, I could not detect your intent.".to_string(),
			AgentError::MissingSession => "Session not found. Please try again.".to_string(),
			AgentError::SessionNotFound => {
				"I cannot find your order. Please place a new order.".to_string()
			},
			AgentError::MalformedParameters {
				intent: Intent::TrackOrder,
				..
			} => "Please provide a valid order id.".to_string(),
			AgentError::MalformedParameters { .. } => {
				"Please provide food items with correct quantities.".to_string()
			},
			AgentError::CommitFailed(_) => "Sorry! We failed to process your order due to \
			                                backend error. Please place a new order."
				.to_string(),
			AgentError::UnknownIntent(UnknownIntent(name)) => {
				format!("Sorry, I don't understand this request: {}", name)
			},
			AgentError::StorageUnavailable(_) => {
				"Sorry, we are having trouble reaching our kitchen. Please try again later."
					.to_string()
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use eatery_types::OrderLineError;

	#[test]
	fn test_malformed_message_depends_on_intent() {
		let tracking = AgentError::malformed(
			Intent::TrackOrder,
			ParameterError::Missing("order_id".into()),
		);
		assert_eq!(tracking.user_message(), "Please provide a valid order id.");

		let adding = AgentError::malformed(
			Intent::AddToOrder,
			OrderLineError::LengthMismatch {
				items: 2,
				quantities: 1,
			},
		);
		assert_eq!(
			adding.user_message(),
			"Please provide food items with correct quantities."
		);
	}

	#[test]
	fn test_unknown_intent_message_names_request() {
		let err = AgentError::from(UnknownIntent("order.pay".into()));
		assert_eq!(
			err.user_message(),
			"Sorry, I don't understand this request: order.pay"
		);
	}

	#[test]
	fn test_commit_failure_asks_for_new_order() {
		let err = AgentError::from(CommitError::EmptyOrder);
		assert!(err.user_message().contains("Please place a new order."));
		assert!(err.user_message().starts_with("Sorry! We failed to process your order"));
	}
}
