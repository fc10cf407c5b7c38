//! Utility functions for common formatting needs.

pub mod formatting;

pub use formatting::{join_names, truncate_id};
