//! Session store implementation.
//!
//! Maps each conversation to the order it is building. A session moves
//! through these states:
//!
//! | Current   | Event             | Next                 |
//! |-----------|-------------------|----------------------|
//! | none      | start / add       | building             |
//! | building  | add / remove      | building (may empty) |
//! | building  | complete          | none (taken)         |
//! | building  | idle too long     | none (abandoned)     |
//! | none      | remove / complete | none, with an error  |
//!
//! Every operation holds the registry lock for its whole read-modify-write,
//! so operations on one session are linearizable.

use eatery_types::{OrderLineError, OrderLines, SessionId};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Errors that can occur while mutating a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
	#[error("No active order for this session")]
	NoActiveOrder,
	#[error("Invalid order items: {0}")]
	InvalidItems(#[from] OrderLineError),
}

/// Outcome of removing items from a session's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
	/// Requested items that were present and have been deleted.
	pub removed: Vec<String>,
	/// Requested items that were not part of the order.
	pub not_found: Vec<String>,
	/// What is left of the order, possibly nothing.
	pub remaining: OrderLines,
}

#[derive(Debug)]
struct SessionRecord {
	lines: OrderLines,
	last_activity: Instant,
}

impl SessionRecord {
	fn new(lines: OrderLines) -> Self {
		Self {
			lines,
			last_activity: Instant::now(),
		}
	}

	fn touch(&mut self) {
		self.last_activity = Instant::now();
	}
}

/// Concurrency-safe registry of in-flight orders keyed by session.
#[derive(Debug, Default)]
pub struct SessionStore {
	sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl SessionStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the session, or resets an existing one to an empty order.
	pub async fn start(&self, session_id: &SessionId) {
		let mut sessions = self.sessions.write().await;
		sessions.insert(session_id.clone(), SessionRecord::new(OrderLines::new()));
	}

	/// Adds positionally paired items and quantities to the session's order.
	///
	/// The lists must be the same length; otherwise the session is left
	/// untouched. Quantities replace earlier ones for the same item. Creates
	/// the session if it does not exist and returns the merged order.
	pub async fn add_items(
		&self,
		session_id: &SessionId,
		items: &[String],
		quantities: &[u32],
	) -> Result<OrderLines, SessionError> {
		let additions = OrderLines::from_parallel(items, quantities)?;
		Ok(self.merge_items(session_id, additions).await)
	}

	/// Merges an already validated set into the session's order.
	pub async fn merge_items(&self, session_id: &SessionId, additions: OrderLines) -> OrderLines {
		let mut sessions = self.sessions.write().await;
		let record = sessions
			.entry(session_id.clone())
			.or_insert_with(|| SessionRecord::new(OrderLines::new()));
		record.lines.merge(additions);
		record.touch();
		record.lines.clone()
	}

	/// Removes the named items from the session's order.
	pub async fn remove_items(
		&self,
		session_id: &SessionId,
		item_names: &[String],
	) -> Result<Removal, SessionError> {
		let mut sessions = self.sessions.write().await;
		let record = sessions
			.get_mut(session_id)
			.ok_or(SessionError::NoActiveOrder)?;

		let mut removed = Vec::new();
		let mut not_found = Vec::new();
		for name in item_names {
			if record.lines.remove(name).is_some() {
				removed.push(name.clone());
			} else {
				not_found.push(name.clone());
			}
		}
		record.touch();

		Ok(Removal {
			removed,
			not_found,
			remaining: record.lines.clone(),
		})
	}

	/// Returns a copy of the session's order.
	pub async fn peek(&self, session_id: &SessionId) -> Option<OrderLines> {
		let sessions = self.sessions.read().await;
		sessions.get(session_id).map(|record| record.lines.clone())
	}

	/// Removes the session and hands its order to the caller in one step.
	///
	/// Of two concurrent calls for the same session, only one gets the order.
	pub async fn take(&self, session_id: &SessionId) -> Option<OrderLines> {
		let mut sessions = self.sessions.write().await;
		sessions.remove(session_id).map(|record| record.lines)
	}

	pub async fn contains(&self, session_id: &SessionId) -> bool {
		self.sessions.read().await.contains_key(session_id)
	}

	/// Number of sessions with an order in progress.
	pub async fn len(&self) -> usize {
		self.sessions.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.sessions.read().await.is_empty()
	}

	/// Drops sessions that have been idle for longer than `max_idle`.
	///
	/// Returns the number of abandoned sessions.
	pub async fn evict_idle(&self, max_idle: Duration) -> usize {
		let mut sessions = self.sessions.write().await;
		let before = sessions.len();
		sessions.retain(|_, record| record.last_activity.elapsed() <= max_idle);
		before - sessions.len()
	}
}
