use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{PropertyType, Tool};

impl Tool {
    /// Validate arguments against the tool's input schema metadata: the
    /// checks of [`Tool::check_presence`], then property types.
    ///
    /// Failures use the same field/reason wording as the record validators,
    /// so a bad payload reads the same on both transports.
    pub fn validate_arguments(&self, args: &Value) -> Result<(), ValidationError> {
        self.check_presence(args)?;
        let Value::Object(obj) = args else {
            return Ok(());
        };

        // Null stands for "absent" on optional fields.
        for (field, value) in obj {
            if value.is_null() {
                continue;
            }
            if let Some(expected) = self.schema_meta.property_types.get(field) {
                check_type(field, *expected, value)?;
            }
        }

        Ok(())
    }

    /// Shape checks only: an object (or nothing), required fields present,
    /// oneOf and dependencies satisfied. Property types are not looked at.
    pub fn check_presence(&self, args: &Value) -> Result<(), ValidationError> {
        let empty = serde_json::Map::new();
        let obj = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ValidationError::new("body", "must be an object")),
        };
        let meta = &self.schema_meta;

        for field in &meta.required {
            if obj.get(field).is_none_or(Value::is_null) {
                return Err(ValidationError::required(field));
            }
        }

        // oneOf: at least one set of required fields must be satisfied.
        if !meta.one_of.is_empty() {
            let satisfied = meta
                .one_of
                .iter()
                .any(|set| set.required.iter().all(|f| obj.contains_key(f)));
            if !satisfied {
                return Err(ValidationError::new(
                    "arguments",
                    "must satisfy oneOf requirements",
                ));
            }
        }

        // dependencies: if field A is present, fields B must also be present.
        for (field, deps) in &meta.dependencies {
            if obj.contains_key(field) {
                for dep in deps {
                    if !obj.contains_key(dep) {
                        return Err(ValidationError::new(
                            dep.as_str(),
                            format!("is required when \"{}\" is present", field),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn check_type(field: &str, expected: PropertyType, value: &Value) -> Result<(), ValidationError> {
    let ok = match expected {
        PropertyType::String => value.is_string(),
        PropertyType::Boolean => value.is_boolean(),
        PropertyType::Number => value.is_number(),
        PropertyType::Integer => value.is_i64() || value.is_u64(),
        PropertyType::Object => value.is_object(),
        PropertyType::Array { string_items } => match value.as_array() {
            Some(items) => !string_items || items.iter().all(Value::is_string),
            None => false,
        },
    };
    if ok {
        return Ok(());
    }
    let reason = match expected {
        PropertyType::String => "must be a string",
        PropertyType::Boolean => "must be a boolean",
        PropertyType::Number => "must be a number",
        PropertyType::Integer => "must be an integer",
        PropertyType::Object => "must be an object",
        PropertyType::Array { string_items: true } => "must be an array of strings",
        PropertyType::Array { string_items: false } => "must be an array",
    };
    Err(ValidationError::new(field, reason))
}
