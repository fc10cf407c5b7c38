//! Order tables shared by the storage backends.
//!
//! A ledger holds the persisted order lines and the append-only tracking
//! history. The memory backend keeps one behind a lock; the file backend
//! loads and saves one per operation.

use crate::{Menu, StorageError};
use chrono::{DateTime, Utc};
use eatery_types::OrderId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One persisted line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRow {
	pub order_id: OrderId,
	pub food_item: String,
	pub quantity: u32,
	/// Price per unit at the time the line was recorded.
	pub unit_price: Decimal,
}

impl OrderLineRow {
	pub fn total_price(&self) -> Decimal {
		self.unit_price * Decimal::from(self.quantity)
	}
}

/// One entry of an order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRow {
	pub order_id: OrderId,
	pub status: String,
	pub recorded_at: DateTime<Utc>,
}

/// Persisted order lines and tracking history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderLedger {
	#[serde(default)]
	pub lines: Vec<OrderLineRow>,
	#[serde(default)]
	pub tracking: Vec<TrackingRow>,
	/// Highest order id handed out so far, whether or not it got lines.
	#[serde(default)]
	pub last_allocated: u64,
}

impl OrderLedger {
	/// Reserves the next order id.
	///
	/// The id is one past both the highest id with persisted lines and the
	/// highest id already handed out, so two allocations never collide even
	/// when neither order has written its lines yet.
	pub fn allocate_order_id(&mut self) -> OrderId {
		let highest = self
			.lines
			.iter()
			.map(|row| row.order_id.0)
			.max()
			.unwrap_or(0)
			.max(self.last_allocated);
		let order_id = OrderId(highest).next();
		self.last_allocated = order_id.0;
		order_id
	}

	/// Prices and records a line item. Items missing from the menu are rejected.
	pub fn insert_line(
		&mut self,
		menu: &Menu,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError> {
		let unit_price = menu
			.price(food_item)
			.ok_or_else(|| StorageError::UnknownItem(food_item.to_string()))?;

		self.lines.push(OrderLineRow {
			order_id,
			food_item: food_item.to_string(),
			quantity,
			unit_price,
		});
		Ok(())
	}

	pub fn insert_tracking(&mut self, order_id: OrderId, status: &str) {
		self.tracking.push(TrackingRow {
			order_id,
			status: status.to_string(),
			recorded_at: Utc::now(),
		});
	}

	/// Sum of line totals for an order. Orders without lines are not found.
	pub fn total(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
		let mut lines = self
			.lines
			.iter()
			.filter(|row| row.order_id == order_id)
			.peekable();
		if lines.peek().is_none() {
			return Err(StorageError::NotFound);
		}
		Ok(lines.map(OrderLineRow::total_price).sum())
	}

	/// Latest tracking status of an order.
	pub fn status(&self, order_id: OrderId) -> Option<&str> {
		self.tracking
			.iter()
			.rev()
			.find(|row| row.order_id == order_id)
			.map(|row| row.status.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn menu() -> Menu {
		Menu::from_prices([("pizza", Decimal::from(8)), ("samosa", Decimal::from(5))])
	}

	#[test]
	fn test_allocate_on_empty_ledger() {
		assert_eq!(OrderLedger::default().allocate_order_id(), OrderId(1));
	}

	#[test]
	fn test_allocate_follows_max_line() {
		let mut ledger = OrderLedger::default();
		ledger.insert_line(&menu(), "pizza", 1, OrderId(3)).unwrap();
		ledger.insert_line(&menu(), "pizza", 1, OrderId(7)).unwrap();
		ledger.insert_line(&menu(), "samosa", 1, OrderId(5)).unwrap();
		assert_eq!(ledger.allocate_order_id(), OrderId(8));
	}

	#[test]
	fn test_allocations_without_lines_stay_distinct() {
		let mut ledger = OrderLedger::default();
		let first = ledger.allocate_order_id();
		let second = ledger.allocate_order_id();
		assert_eq!((first, second), (OrderId(1), OrderId(2)));

		ledger.insert_line(&menu(), "pizza", 1, first).unwrap();
		assert_eq!(ledger.allocate_order_id(), OrderId(3));
	}

	#[test]
	fn test_high_water_mark_persists() {
		let mut ledger = OrderLedger::default();
		ledger.allocate_order_id();
		ledger.allocate_order_id();

		let json = serde_json::to_string(&ledger).unwrap();
		let mut reloaded: OrderLedger = serde_json::from_str(&json).unwrap();
		assert_eq!(reloaded.allocate_order_id(), OrderId(3));

		let legacy: OrderLedger = serde_json::from_str(r#"{"lines": []}"#).unwrap();
		assert_eq!(legacy.last_allocated, 0);
	}

	#[test]
	fn test_total_multiplies_unit_prices() {
		let mut ledger = OrderLedger::default();
		ledger.insert_line(&menu(), "pizza", 2, OrderId(1)).unwrap();
		ledger.insert_line(&menu(), "samosa", 3, OrderId(1)).unwrap();
		ledger.insert_line(&menu(), "pizza", 9, OrderId(2)).unwrap();

		assert_eq!(ledger.total(OrderId(1)).unwrap(), Decimal::from(31));
		assert!(matches!(ledger.total(OrderId(9)), Err(StorageError::NotFound)));
	}

	#[test]
	fn test_unknown_item_is_not_recorded() {
		let mut ledger = OrderLedger::default();
		let err = ledger.insert_line(&menu(), "taco", 1, OrderId(1)).unwrap_err();
		assert!(matches!(err, StorageError::UnknownItem(ref item) if item == "taco"));
		assert!(ledger.lines.is_empty());
	}

	#[test]
	fn test_status_is_latest_row() {
		let mut ledger = OrderLedger::default();
		ledger.insert_tracking(OrderId(1), "in progress");
		ledger.insert_tracking(OrderId(2), "in progress");
		ledger.insert_tracking(OrderId(1), "delivered");

		assert_eq!(ledger.status(OrderId(1)), Some("delivered"));
		assert_eq!(ledger.status(OrderId(2)), Some("in progress"));
		assert_eq!(ledger.status(OrderId(3)), None);
	}
}
