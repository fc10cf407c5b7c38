//! Common types module for the eatery ordering agent.
//!
//! This module defines the core data types shared by every crate in the
//! workspace: session and order identifiers, the per-session order line set,
//! the closed set of conversational intents, webhook envelopes, and the
//! configuration validation framework used by pluggable implementations.

/// API types for the webhook endpoint and its request/response envelopes.
pub mod api;
/// Intent names and their parameter payloads.
pub mod intent;
/// Order types including identifiers and the order line set.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Utility functions for formatting values for logs and responses.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use intent::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use utils::{join_names, truncate_id};
pub use validation::*;
