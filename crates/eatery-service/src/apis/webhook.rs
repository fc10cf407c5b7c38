//! Webhook fulfillment endpoint.
//!
//! Unwraps the conversational platform's request envelope, hands the intent
//! to the agent and wraps the reply. The platform expects a reply to every
//! call, so malformed bodies are answered with an apology rather than an
//! HTTP error.

use eatery_core::OrderAgent;
use eatery_types::{WebhookRequest, WebhookResponse};
use regex::Regex;

const UNREADABLE_REQUEST_REPLY: &str = "Internal server error occurred. Please try again later.";

/// Finds the session id inside platform context names such as
/// `projects/p/agent/sessions/<id>/contexts/ongoing-order`.
pub struct SessionExtractor {
	pattern: Regex,
}

impl SessionExtractor {
	pub fn new() -> Result<Self, regex::Error> {
		Ok(Self {
			pattern: Regex::new(r"/sessions/(.*?)/contexts/")?,
		})
	}

	pub fn extract<'a>(&self, context_name: &'a str) -> Option<&'a str> {
		self.pattern
			.captures(context_name)
			.and_then(|captures| captures.get(1))
			.map(|m| m.as_str())
	}
}

/// Decodes one webhook body and produces the reply for it.
pub async fn process_webhook(
	body: &[u8],
	agent: &OrderAgent,
	sessions: &SessionExtractor,
) -> WebhookResponse {
	let request: WebhookRequest = match serde_json::from_slice(body) {
		Ok(request) => request,
		Err(e) => {
			tracing::warn!(error = %e, "Unreadable webhook request");
			return WebhookResponse::new(UNREADABLE_REQUEST_REPLY);
		},
	};

	let intent_name = request.intent_name().unwrap_or_default();
	let session_id = request
		.session_context()
		.and_then(|context| sessions.extract(context));

	let reply = agent
		.handle(intent_name, session_id, &request.query_result.parameters)
		.await;
	WebhookResponse::new(reply)
}
