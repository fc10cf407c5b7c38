//! Intent handlers.
//!
//! Each handler fulfills a group of intents and reports failures as
//! [`AgentError`](crate::AgentError) for the agent to render.

pub mod order;
pub mod tracking;

pub use order::OrderHandler;
pub use tracking::TrackingHandler;
