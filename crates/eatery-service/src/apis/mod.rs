//! HTTP endpoint implementations served by the eatery service.

pub mod webhook;
