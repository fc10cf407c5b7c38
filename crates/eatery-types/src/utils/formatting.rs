//! String formatting utilities.
//!
//! Provides helpers for shortening identifiers in logs and for rendering
//! item names back to the user.

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Joins item names with commas, e.g. `pizza, samosa`.
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
	names
		.iter()
		.map(|name| name.as_ref())
		.collect::<Vec<_>>()
		.join(", ")
}
