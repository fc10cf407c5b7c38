//! Core ordering agent for the eatery system.
//!
//! This crate holds the conversational order lifecycle: the session store that
//! accumulates each conversation's order, the pipeline that commits finished
//! orders to storage, the intent handlers and the agent that dispatches
//! platform intents to them. It knows nothing about HTTP or webhook envelopes.

pub mod builder;
pub mod commit;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod state;

#[cfg(test)]
mod testing;

pub use builder::{AgentBuilder, AgentFactories, BuilderError};
pub use commit::{CommitError, CommitPipeline};
pub use engine::{EngineError, OrderAgent};
pub use error::AgentError;
pub use state::{Removal, SessionError, SessionStore};
