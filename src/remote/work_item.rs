use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Remote work item as the service returns it: an id plus an untyped field
/// bag keyed by field reference name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub rev: i64,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("work item {id}: required field '{field}' is missing")]
    Missing { id: i64, field: String },

    #[error("work item {id}: field '{field}' is not a {expected}")]
    WrongShape {
        id: i64,
        field: String,
        expected: &'static str,
    },
}

impl WorkItem {
    fn missing(&self, field: &str) -> FieldError {
        FieldError::Missing {
            id: self.id,
            field: field.to_string(),
        }
    }

    fn wrong_shape(&self, field: &str, expected: &'static str) -> FieldError {
        FieldError::WrongShape {
            id: self.id,
            field: field.to_string(),
            expected,
        }
    }

    pub fn str_field(&self, field: &str) -> Result<&str, FieldError> {
        let value = self.fields.get(field).ok_or_else(|| self.missing(field))?;
        value.as_str().ok_or_else(|| self.wrong_shape(field, "string"))
    }

    /// Numeric field that may legitimately be absent. Remote numbers arrive
    /// as floats even for integer fields.
    pub fn opt_number_field(&self, field: &str) -> Result<Option<f64>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.wrong_shape(field, "number")),
        }
    }

    /// `uniqueName` of an identity field, or `None` when the field is absent.
    pub fn identity_field(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .get("uniqueName")
                .and_then(|v| v.as_str())
                .map(Some)
                .ok_or_else(|| self.wrong_shape(field, "identity")),
        }
    }
}
