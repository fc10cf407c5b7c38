//! Intent types for the ordering agent.
//!
//! The conversational platform resolves every utterance to an intent display
//! name and a bag of parameters. This module maps the display names onto a
//! closed enumeration and decodes the parameters each intent relies on.

use crate::order::{OrderId, OrderLineError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parameter carrying the list of food item names.
pub const FOOD_ITEM_PARAM: &str = "food-item";
/// Parameter carrying quantities, or a bare number for tracking requests.
pub const NUMBER_PARAM: &str = "number";
/// Parameter carrying an explicit order id for tracking requests.
pub const ORDER_ID_PARAM: &str = "order_id";

/// Every intent the agent knows how to fulfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
	/// Start (or restart) an order for the session.
	NewOrder,
	/// Add items to the session's order.
	AddToOrder,
	/// Remove items from the session's order.
	RemoveFromOrder,
	/// Commit the session's order to storage.
	CompleteOrder,
	/// Look up the status of a persisted order.
	TrackOrder,
}

impl Intent {
	/// Returns the display name the platform uses for this intent.
	pub fn display_name(&self) -> &'static str {
		match self {
			Intent::NewOrder => "new.order",
			Intent::AddToOrder => "order.add - context: ongoing-order",
			Intent::RemoveFromOrder => "order.remove - context: ongoing-order",
			Intent::CompleteOrder => "order.complete - context: ongoing-order",
			Intent::TrackOrder => "track.order - context: ongoing-tracking",
		}
	}

	/// Returns an iterator over all Intent variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::NewOrder,
			Self::AddToOrder,
			Self::RemoveFromOrder,
			Self::CompleteOrder,
			Self::TrackOrder,
		]
		.into_iter()
	}
}

impl fmt::Display for Intent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.display_name())
	}
}

/// Error returned when a display name matches no known intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intent: {0}")]
pub struct UnknownIntent(pub String);

impl FromStr for Intent {
	type Err = UnknownIntent;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Intent::all()
			.find(|intent| intent.display_name() == s)
			.ok_or_else(|| UnknownIntent(s.to_string()))
	}
}

/// Errors raised while decoding intent parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterError {
	#[error("parameter '{name}' must be {expected}")]
	InvalidType { name: String, expected: &'static str },
	#[error("parameter '{name}' has invalid number '{value}'")]
	InvalidNumber { name: String, value: String },
	#[error("missing parameter '{0}'")]
	Missing(String),
	#[error(transparent)]
	Lines(#[from] OrderLineError),
}

/// Parameters attached to an intent by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Food item names. A missing parameter reads as an empty list.
	pub fn food_items(&self) -> Result<Vec<String>, ParameterError> {
		list_values(self.get(FOOD_ITEM_PARAM))
			.into_iter()
			.map(|value| match value {
				Value::String(s) => Ok(s.clone()),
				_ => Err(ParameterError::InvalidType {
					name: FOOD_ITEM_PARAM.to_string(),
					expected: "a list of strings",
				}),
			})
			.collect()
	}

	/// Quantities paired positionally with [`Parameters::food_items`].
	pub fn quantities(&self) -> Result<Vec<u32>, ParameterError> {
		list_values(self.get(NUMBER_PARAM))
			.into_iter()
			.map(|value| {
				let n = whole_number(NUMBER_PARAM, value)?;
				u32::try_from(n).map_err(|_| ParameterError::InvalidNumber {
					name: NUMBER_PARAM.to_string(),
					value: value.to_string(),
				})
			})
			.collect()
	}

	/// The order id of a tracking request, read from `order_id` or `number`.
	pub fn order_id(&self) -> Result<OrderId, ParameterError> {
		let (name, value) = [ORDER_ID_PARAM, NUMBER_PARAM]
			.into_iter()
			.find_map(|name| {
				self.get(name)
					.and_then(|v| list_values(Some(v)).into_iter().next())
					.filter(|v| !is_blank(v))
					.map(|v| (name, v))
			})
			.ok_or_else(|| ParameterError::Missing(ORDER_ID_PARAM.to_string()))?;

		whole_number(name, value).map(OrderId)
	}
}

impl From<Map<String, Value>> for Parameters {
	fn from(values: Map<String, Value>) -> Self {
		Self(values)
	}
}

/// Flattens a scalar-or-array parameter into a list of values.
fn list_values(value: Option<&Value>) -> Vec<&Value> {
	match value {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(values)) => values.iter().collect(),
		Some(other) => vec![other],
	}
}

fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.trim().is_empty(),
		_ => false,
	}
}

/// Reads a non-negative integral number. The platform sends numbers as
/// floats (`2.0`), so integral floats and numeric strings are accepted.
fn whole_number(name: &str, value: &Value) -> Result<u64, ParameterError> {
	let invalid = || ParameterError::InvalidNumber {
		name: name.to_string(),
		value: value.to_string(),
	};

	match value {
		Value::Number(n) => {
			if let Some(v) = n.as_u64() {
				return Ok(v);
			}
			match n.as_f64() {
				Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
				_ => Err(invalid()),
			}
		},
		Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid()),
		_ => Err(invalid()),
	}
}
