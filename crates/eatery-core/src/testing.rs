//! Scripted storage backend shared by the core tests.

use async_trait::async_trait;
use eatery_storage::{OrderStoreInterface, OrderStoreService, StorageError};
use eatery_types::{ConfigSchema, Field, FieldType, OrderId, Schema, ValidationError};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone)]
pub struct StoreState {
	pub lines: Vec<(String, u32, OrderId)>,
	pub tracking: Vec<(OrderId, String)>,
	pub inserts_attempted: usize,
}

#[derive(Debug, Default, Clone)]
struct Script {
	fail_insert_at: Option<usize>,
	fail_next_id: bool,
	fail_tracking: bool,
	fail_reads: bool,
	total: Option<Decimal>,
	required_config: Option<&'static str>,
}

/// Records every call and fails where the test tells it to.
#[derive(Clone, Default)]
pub struct ScriptedStore {
	state: Arc<Mutex<StoreState>>,
	script: Script,
}

impl ScriptedStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fails the line insert with the given zero-based index.
	pub fn fail_insert_at(mut self, index: usize) -> Self {
		self.script.fail_insert_at = Some(index);
		self
	}

	pub fn fail_next_id(mut self) -> Self {
		self.script.fail_next_id = true;
		self
	}

	pub fn fail_tracking(mut self) -> Self {
		self.script.fail_tracking = true;
		self
	}

	/// Fails totals and status lookups.
	pub fn fail_reads(mut self) -> Self {
		self.script.fail_reads = true;
		self
	}

	/// Makes the config schema demand the named string field.
	pub fn require_config(mut self, field: &'static str) -> Self {
		self.script.required_config = Some(field);
		self
	}

	/// Reports this total for every order with lines.
	pub fn with_total(mut self, total: Decimal) -> Self {
		self.script.total = Some(total);
		self
	}

	pub fn service(&self) -> Arc<OrderStoreService> {
		Arc::new(OrderStoreService::new(Box::new(self.clone())))
	}

	pub fn state(&self) -> StoreState {
		self.state.lock().unwrap().clone()
	}
}

#[async_trait]
impl OrderStoreInterface for ScriptedStore {
	async fn next_order_id(&self) -> Result<OrderId, StorageError> {
		if self.script.fail_next_id {
			return Err(StorageError::Backend("connection refused".into()));
		}
		let state = self.state.lock().unwrap();
		Ok(state
			.lines
			.iter()
			.map(|(_, _, id)| *id)
			.max()
			.map_or(OrderId::FIRST, OrderId::next))
	}

	async fn insert_order_line(
		&self,
		food_item: &str,
		quantity: u32,
		order_id: OrderId,
	) -> Result<(), StorageError> {
		let mut state = self.state.lock().unwrap();
		let index = state.inserts_attempted;
		state.inserts_attempted += 1;
		if self.script.fail_insert_at == Some(index) {
			return Err(StorageError::UnknownItem(food_item.to_string()));
		}
		state.lines.push((food_item.to_string(), quantity, order_id));
		Ok(())
	}

	async fn insert_tracking_row(&self, order_id: OrderId, status: &str) -> Result<(), StorageError> {
		if self.script.fail_tracking {
			return Err(StorageError::Backend("connection refused".into()));
		}
		self.state
			.lock()
			.unwrap()
			.tracking
			.push((order_id, status.to_string()));
		Ok(())
	}

	async fn order_total(&self, order_id: OrderId) -> Result<Decimal, StorageError> {
		if self.script.fail_reads {
			return Err(StorageError::Backend("connection refused".into()));
		}
		let state = self.state.lock().unwrap();
		if !state.lines.iter().any(|(_, _, id)| *id == order_id) {
			return Err(StorageError::NotFound);
		}
		Ok(self.script.total.unwrap_or_default())
	}

	async fn order_status(&self, order_id: OrderId) -> Result<Option<String>, StorageError> {
		if self.script.fail_reads {
			return Err(StorageError::Backend("connection refused".into()));
		}
		let state = self.state.lock().unwrap();
		Ok(state
			.tracking
			.iter()
			.rev()
			.find(|(id, _)| *id == order_id)
			.map(|(_, status)| status.clone()))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(ScriptedSchema {
			required: self.script.required_config,
		})
	}
}

struct ScriptedSchema {
	required: Option<&'static str>,
}

impl ConfigSchema for ScriptedSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let required = self
			.required
			.map(|name| Field::new(name, FieldType::String))
			.into_iter()
			.collect();
		Schema::new(required, vec![]).validate(config)
	}
}
