//! Menu of unit prices used to price order lines.
//!
//! Item names are matched case-insensitively after trimming, since the
//! conversational platform may capitalize entity values differently from
//! the configured menu.

use crate::StorageError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Menu served when a backend configuration does not define one.
const DEFAULT_MENU: &[(&str, i64)] = &[
	("pav bhaji", 6),
	("chole bhature", 7),
	("pizza", 8),
	("mango lassi", 5),
	("masala dosa", 6),
	("vegetable biryani", 9),
	("vada pav", 4),
	("rava dosa", 7),
	("samosa", 5),
];

/// Unit prices keyed by normalized item name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
	prices: BTreeMap<String, Decimal>,
}

impl Menu {
	/// Builds a menu from `(item, unit price)` pairs.
	pub fn from_prices<I, S>(prices: I) -> Self
	where
		I: IntoIterator<Item = (S, Decimal)>,
		S: AsRef<str>,
	{
		Self {
			prices: prices
				.into_iter()
				.map(|(item, price)| (normalize(item.as_ref()), price))
				.collect(),
		}
	}

	/// Reads the optional `menu` table of a backend configuration.
	///
	/// Prices may be TOML integers or floats. Without a `menu` table the
	/// default menu is used.
	pub fn from_config(config: &toml::Value) -> Result<Self, StorageError> {
		let Some(menu) = config.get("menu") else {
			return Ok(Self::default());
		};
		let table = menu.as_table().ok_or_else(|| {
			StorageError::Configuration("menu must be a table of item = price".into())
		})?;

		let mut prices = BTreeMap::new();
		for (item, value) in table {
			let price = match value {
				toml::Value::Integer(i) => Some(Decimal::from(*i)),
				toml::Value::Float(f) => Decimal::from_f64(*f),
				_ => None,
			}
			.filter(|price| !price.is_sign_negative())
			.ok_or_else(|| {
				StorageError::Configuration(format!("invalid price for menu item '{}'", item))
			})?;
			prices.insert(normalize(item), price.normalize());
		}

		Ok(Self { prices })
	}

	/// Unit price of an item, if it is on the menu.
	pub fn price(&self, item: &str) -> Option<Decimal> {
		self.prices.get(&normalize(item)).copied()
	}

	pub fn len(&self) -> usize {
		self.prices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.prices.is_empty()
	}
}

impl Default for Menu {
	fn default() -> Self {
		Self::from_prices(
			DEFAULT_MENU
				.iter()
				.map(|(item, price)| (*item, Decimal::from(*price))),
		)
	}
}

fn normalize(item: &str) -> String {
	item.trim().to_lowercase()
}
