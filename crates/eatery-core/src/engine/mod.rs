//! Core agent that turns platform intents into replies.
//!
//! This module contains the OrderAgent struct, which resolves each request to
//! an intent, routes it to the matching handler and renders every outcome as
//! reply text. It also runs the background sweep that abandons idle sessions.

use crate::commit::CommitPipeline;
use crate::error::AgentError;
use crate::handlers::{OrderHandler, TrackingHandler};
use crate::state::SessionStore;
use eatery_config::Config;
use eatery_storage::OrderStoreService;
use eatery_types::{truncate_id, Intent, Parameters, SessionId};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while the agent's background tasks run.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Configuration error: {0}")]
	Config(String),
}

/// Main agent that fulfills conversational ordering intents.
#[derive(Clone)]
pub struct OrderAgent {
	/// Agent configuration.
	config: Config,
	/// In-flight orders keyed by session.
	sessions: Arc<SessionStore>,
	/// Storage service for persisted orders.
	storage: Arc<OrderStoreService>,
	order_handler: Arc<OrderHandler>,
	tracking_handler: Arc<TrackingHandler>,
}

impl OrderAgent {
	pub fn new(config: Config, sessions: Arc<SessionStore>, storage: Arc<OrderStoreService>) -> Self {
		let pipeline = Arc::new(CommitPipeline::new(Arc::clone(&storage)));
		let order_handler = Arc::new(OrderHandler::new(Arc::clone(&sessions), pipeline));
		let tracking_handler = Arc::new(TrackingHandler::new(Arc::clone(&storage)));

		Self {
			config,
			sessions,
			storage,
			order_handler,
			tracking_handler,
		}
	}

	/// Handles one request and returns the text to show the user.
	///
	/// Never fails: every error is logged and rendered as a reply.
	pub async fn handle(
		&self,
		intent_name: &str,
		session_id: Option<&str>,
		parameters: &Parameters,
	) -> String {
		match self.dispatch(intent_name, session_id, parameters).await {
			Ok(reply) => reply,
			Err(e) => {
				match &e {
					AgentError::UnknownIntent(_) | AgentError::MissingIntent => {
						tracing::warn!(intent = intent_name, "Intent not understood")
					},
					AgentError::MissingSession => {
						tracing::warn!(intent = intent_name, "Request rejected without session id")
					},
					AgentError::CommitFailed(_) | AgentError::StorageUnavailable(_) => {
						tracing::error!(intent = intent_name, error = %e, "Request failed")
					},
					AgentError::SessionNotFound | AgentError::MalformedParameters { .. } => {
						tracing::info!(intent = intent_name, error = %e, "Request refused")
					},
				}
				e.user_message()
			},
		}
	}

	/// Resolves the intent and session, then runs the matching handler.
	///
	/// The intent name and session id are both checked before any session
	/// state is read.
	async fn dispatch(
		&self,
		intent_name: &str,
		session_id: Option<&str>,
		parameters: &Parameters,
	) -> Result<String, AgentError> {
		let intent_name = intent_name.trim();
		if intent_name.is_empty() {
			return Err(AgentError::MissingIntent);
		}
		let session_id = session_id
			.and_then(SessionId::parse)
			.ok_or(AgentError::MissingSession)?;
		let intent: Intent = intent_name.parse()?;

		tracing::debug!(
			intent = %intent,
			session = %truncate_id(session_id.as_str()),
			"Dispatching intent"
		);

		match intent {
			Intent::NewOrder => self.order_handler.start(&session_id).await,
			Intent::AddToOrder => self.order_handler.add(&session_id, parameters).await,
			Intent::RemoveFromOrder => self.order_handler.remove(&session_id, parameters).await,
			Intent::CompleteOrder => self.order_handler.complete(&session_id).await,
			Intent::TrackOrder => self.tracking_handler.track(parameters).await,
		}
	}

	/// Runs the idle-session sweeper until Ctrl+C.
	///
	/// With an idle timeout of zero sessions never expire and the loop only
	/// waits for shutdown.
	pub async fn run(&self) -> Result<(), EngineError> {
		let settings = &self.config.sessions;
		if settings.cleanup_interval_seconds == 0 {
			return Err(EngineError::Config(
				"cleanup_interval_seconds must be at least 1".into(),
			));
		}

		if settings.idle_timeout_seconds == 0 {
			tracing::info!("Session expiry disabled");
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::warn!(error = %e, "Failed to listen for shutdown signal");
			}
			return Ok(());
		}

		let max_idle = Duration::from_secs(settings.idle_timeout_seconds);
		let mut interval =
			tokio::time::interval(Duration::from_secs(settings.cleanup_interval_seconds));

		loop {
			tokio::select! {
				_ = interval.tick() => {
					self.sweep_idle_sessions(max_idle).await;
				}

				// Shutdown signal
				_ = tokio::signal::ctrl_c() => {
					break;
				}
			}
		}

		tracing::info!(
			open_sessions = self.sessions.len().await,
			"Stopping session sweeper"
		);
		Ok(())
	}

	/// Abandons sessions idle for longer than `max_idle`.
	pub async fn sweep_idle_sessions(&self, max_idle: Duration) -> usize {
		let evicted = self.sessions.evict_idle(max_idle).await;
		if evicted > 0 {
			tracing::debug!("Session cleanup: abandoned {} idle sessions", evicted);
		}
		evicted
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns a reference to the session store.
	pub fn sessions(&self) -> &Arc<SessionStore> {
		&self.sessions
	}

	/// Returns a reference to the storage service.
	pub fn storage(&self) -> &Arc<OrderStoreService> {
		&self.storage
	}
}
