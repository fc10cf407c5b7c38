//! Order-related types for the ordering agent.
//!
//! Defines the identifiers exchanged with the conversational platform and the
//! storage backend, plus [`OrderLines`], the cart-like mapping of food item to
//! quantity that a session accumulates before it is committed.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Status written to the tracking history when an order is first committed.
pub const INITIAL_TRACKING_STATUS: &str = "in progress";

/// Opaque identifier of one conversation, supplied by the calling platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
	/// Creates a session id, rejecting blank input.
	pub fn parse(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();
		if trimmed.is_empty() {
			None
		} else {
			Some(Self(trimmed.to_string()))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Identifier of a persisted order.
///
/// Allocated by the storage backend as the current maximum plus one.
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl OrderId {
	/// The id handed out when no order has been persisted yet.
	pub const FIRST: OrderId = OrderId(1);

	/// Returns the id following this one.
	pub fn next(self) -> OrderId {
		OrderId(self.0.saturating_add(1))
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for OrderId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse::<u64>().map(OrderId)
	}
}

/// Errors raised when building or mutating an [`OrderLines`] set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderLineError {
	/// Parallel item/quantity lists did not line up.
	#[error("{items} food items but {quantities} quantities")]
	LengthMismatch { items: usize, quantities: usize },
	/// An item name was empty or whitespace.
	#[error("food item name cannot be empty")]
	EmptyItemName,
	/// A quantity of zero was supplied.
	#[error("quantity for '{0}' must be at least 1")]
	NonPositiveQuantity(String),
}

/// Mapping of food item to quantity for one session.
///
/// Every stored quantity is at least one: removing an item deletes its key
/// instead of storing zero. Iteration is ordered by item name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLines {
	lines: BTreeMap<String, u32>,
}

impl OrderLines {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a set from positionally paired item names and quantities.
	///
	/// A later occurrence of the same item name overwrites the earlier one.
	pub fn from_parallel(items: &[String], quantities: &[u32]) -> Result<Self, OrderLineError> {
		if items.len() != quantities.len() {
			return Err(OrderLineError::LengthMismatch {
				items: items.len(),
				quantities: quantities.len(),
			});
		}

		let mut lines = Self::new();
		for (item, quantity) in items.iter().zip(quantities) {
			lines.set(item.as_str(), *quantity)?;
		}
		Ok(lines)
	}

	/// Sets the quantity for an item, replacing any previous quantity.
	pub fn set(&mut self, item: impl Into<String>, quantity: u32) -> Result<(), OrderLineError> {
		let item = item.into();
		if item.trim().is_empty() {
			return Err(OrderLineError::EmptyItemName);
		}
		if quantity == 0 {
			return Err(OrderLineError::NonPositiveQuantity(item));
		}
		self.lines.insert(item, quantity);
		Ok(())
	}

	/// Merges `other` into this set. Quantities from `other` win.
	pub fn merge(&mut self, other: OrderLines) {
		self.lines.extend(other.lines);
	}

	/// Removes an item, returning its quantity if it was present.
	pub fn remove(&mut self, item: &str) -> Option<u32> {
		self.lines.remove(item)
	}

	pub fn get(&self, item: &str) -> Option<u32> {
		self.lines.get(item).copied()
	}

	pub fn contains(&self, item: &str) -> bool {
		self.lines.contains_key(item)
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// Iterates over `(item, quantity)` pairs in item-name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
		self.lines.iter().map(|(item, qty)| (item.as_str(), *qty))
	}
}

impl IntoIterator for OrderLines {
	type Item = (String, u32);
	type IntoIter = btree_map::IntoIter<String, u32>;

	fn into_iter(self) -> Self::IntoIter {
		self.lines.into_iter()
	}
}

/// Renders the set the way it is read back to the user, e.g. `1 coke, 2 pizza`.
impl fmt::Display for OrderLines {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (item, quantity) in self.iter() {
			if !first {
				f.write_str(", ")?;
			}
			write!(f, "{} {}", quantity, item)?;
			first = false;
		}
		Ok(())
	}
}
