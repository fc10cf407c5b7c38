//! HTTP server for the eatery webhook.
//!
//! This module provides the HTTP surface of the agent: the fulfillment
//! webhook the conversational platform calls and a health check.

use crate::apis::webhook::{process_webhook, SessionExtractor};
use axum::{
	body::Bytes,
	extract::State,
	response::Json,
	routing::{get, post},
	Router,
};
use eatery_config::ApiConfig;
use eatery_core::OrderAgent;
use eatery_types::WebhookResponse;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the agent that fulfills intents.
	pub agent: Arc<OrderAgent>,
	/// Reads session ids out of platform context names.
	pub sessions: Arc<SessionExtractor>,
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	agent: Arc<OrderAgent>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState {
		agent,
		sessions: Arc::new(SessionExtractor::new()?),
	};
	let app = router(app_state, &api_config.webhook_path);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!(
		webhook = %api_config.webhook_path,
		"Eatery webhook server starting on {}",
		bind_address
	);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Builds the router serving the webhook at `webhook_path`.
pub fn router(state: AppState, webhook_path: &str) -> Router {
	Router::new()
		.route(webhook_path, post(handle_webhook))
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Handles POST webhook requests.
///
/// The body is read as raw bytes so unparseable envelopes still receive a
/// 200 reply with fulfillment text.
async fn handle_webhook(State(state): State<AppState>, body: Bytes) -> Json<WebhookResponse> {
	Json(process_webhook(&body, &state.agent, &state.sessions).await)
}

/// Handles GET /health requests.
async fn handle_health() -> &'static str {
	"ok"
}
