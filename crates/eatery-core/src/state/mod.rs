//! State management for in-flight orders.
//!
//! This module holds the per-conversation order state that lives between
//! webhook requests, guarded so concurrent requests on one session never
//! lose an update.

pub mod session;

pub use session::{Removal, SessionError, SessionStore};
