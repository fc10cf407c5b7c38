//! Configuration validation utilities.
//!
//! Backend implementations receive their configuration as raw TOML values.
//! This module provides a small schema framework so each backend can check
//! its section before it is built, with errors that name the offending field.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Represents the type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	/// A string value.
	String,
	/// An integer or float that must not be negative.
	NonNegativeNumber,
	/// A table with arbitrary keys whose values all share one type.
	Map(Box<FieldType>),
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A named field in a configuration schema.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator that runs after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Validation schema for a TOML table: fields that must be present and
/// fields that are checked only when present.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn type_mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(type_mismatch(field_name, "string", value));
			}
		},
		FieldType::NonNegativeNumber => {
			let number = match value {
				toml::Value::Integer(i) => *i as f64,
				toml::Value::Float(f) => *f,
				other => return Err(type_mismatch(field_name, "number", other)),
			};
			if !number.is_finite() || number < 0.0 {
				return Err(ValidationError::InvalidValue {
					field: field_name.to_string(),
					message: format!("Value {} must be a non-negative number", number),
				});
			}
		},
		FieldType::Map(inner_type) => {
			let table = value
				.as_table()
				.ok_or_else(|| type_mismatch(field_name, "table", value))?;
			for (key, item) in table {
				validate_field_type(&format!("{}.{}", field_name, key), item, inner_type)?;
			}
		},
	}

	Ok(())
}

/// A configuration schema that can validate TOML values.
pub trait ConfigSchema: Send + Sync {
	/// Validates a TOML configuration value against this schema.
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(input: &str) -> toml::Value {
		toml::from_str(input).unwrap()
	}

	fn menu_schema() -> Schema {
		Schema::new(
			vec![Field::new("storage_path", FieldType::String)],
			vec![
				Field::new("menu", FieldType::Map(Box::new(FieldType::NonNegativeNumber))),
			],
		)
	}

	#[test]
	fn test_valid_config() {
		let config = parse(
			r#"
storage_path = "./orders.json"
menu = { pizza = 8, "mango lassi" = 5.5 }
"#,
		);
		assert!(menu_schema().validate(&config).is_ok());
	}

	#[test]
	fn test_missing_required_field() {
		let err = menu_schema().validate(&parse("menu = {}")).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(ref f) if f == "storage_path"));
	}

	#[test]
	fn test_negative_price_rejected() {
		let config = parse(
			r#"
storage_path = "x"
menu = { pizza = -1 }
"#,
		);
		let err = menu_schema().validate(&config).unwrap_err();
		assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "menu.pizza"));
	}

	#[test]
	fn test_string_price_rejected() {
		let config = parse(
			r#"
storage_path = "x"
menu = { pizza = "eight" }
"#,
		);
		assert!(matches!(
			menu_schema().validate(&config),
			Err(ValidationError::TypeMismatch { .. })
		));
	}

	#[test]
	fn test_custom_validator() {
		let schema = Schema::new(
			vec![Field::new("storage_path", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(s) if s.ends_with(".json") => Ok(()),
					_ => Err("must be a .json file".into()),
				}
			})],
			vec![],
		);
		assert!(schema.validate(&parse("storage_path = \"a.json\"")).is_ok());
		assert!(schema.validate(&parse("storage_path = \"a.txt\"")).is_err());
	}
}
