//! API types for the fulfillment webhook.
//!
//! The conversational platform posts a JSON envelope describing the matched
//! intent, its parameters and the active output contexts. Only the fields the
//! agent reads are modelled; everything else in the envelope is ignored.

use crate::intent::Parameters;
use serde::{Deserialize, Serialize};

/// Request body posted by the platform to the webhook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
	#[serde(default)]
	pub query_result: QueryResult,
}

/// Resolved query for a single user utterance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
	/// The matched intent, absent when nothing matched.
	#[serde(default)]
	pub intent: Option<IntentRef>,
	/// Parameters extracted from the utterance.
	#[serde(default)]
	pub parameters: Parameters,
	/// Contexts that remain active after this turn.
	#[serde(default)]
	pub output_contexts: Vec<OutputContext>,
}

/// Reference to the matched intent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRef {
	#[serde(default)]
	pub display_name: Option<String>,
}

/// An active output context, named with the full session path.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputContext {
	pub name: String,
}

impl WebhookRequest {
	/// Display name of the matched intent, if any.
	pub fn intent_name(&self) -> Option<&str> {
		self.query_result
			.intent
			.as_ref()
			.and_then(|intent| intent.display_name.as_deref())
			.filter(|name| !name.is_empty())
	}

	/// Name of the first output context, which embeds the session path.
	pub fn session_context(&self) -> Option<&str> {
		self.query_result
			.output_contexts
			.first()
			.map(|context| context.name.as_str())
	}
}

/// Response body returned to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
	pub fulfillment_text: String,
}

impl WebhookResponse {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			fulfillment_text: text.into(),
		}
	}
}
