//! Turns arbitrary serializable items into column/value records.
//!
//! Items go through `serde_json`, so structs, maps and anything else with a
//! `Serialize` impl that produces an object can be inserted. Field renames
//! and `skip_serializing_if` attributes are honored because they are applied
//! by serde before the mapper sees the object.

use crate::models::{Record, Value};
use crate::{Result, error::RowgateError};
use serde::Serialize;

/// Controls which fields end up in the record.
#[derive(Debug, Clone)]
pub struct MapOptions {
    /// Keep fields whose value is null. When false they are dropped and the
    /// column falls back to its server-side default.
    pub include_nil: bool,
    /// Column names to leave out.
    pub omit: Vec<String>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            include_nil: true,
            omit: Vec::new(),
        }
    }
}

impl MapOptions {
    /// Builder method to drop null fields.
    pub fn without_nil(mut self) -> Self {
        self.include_nil = false;
        self
    }

    /// Builder method to skip a column.
    pub fn omit(mut self, column: impl Into<String>) -> Self {
        self.omit.push(column.into());
        self
    }
}

/// Maps an item to a [`Record`].
///
/// Columns come out sorted by name, which keeps the generated SQL stable.
///
/// # Errors
/// Returns a mapping error if the item fails to serialize, does not
/// serialize to an object, or holds an unsigned integer beyond `i64::MAX`.
///
/// # Example
/// ```rust
/// use rowgate_core::mapper::{MapOptions, map_item};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Account {
///     id: Option<i64>,
///     email: String,
/// }
///
/// let account = Account { id: None, email: "a@example.com".into() };
/// let record = map_item(&account, &MapOptions::default())?;
/// assert_eq!(record.columns(), ["email", "id"]);
/// # Ok::<(), rowgate_core::RowgateError>(())
/// ```
pub fn map_item<T>(item: &T, options: &MapOptions) -> Result<Record>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_value(item)
        .map_err(|e| RowgateError::mapping(format!("item could not be serialized: {}", e)))?;

    let object = match json {
        serde_json::Value::Object(object) => object,
        other => {
            return Err(RowgateError::mapping(format!(
                "expected a struct or map, got {}",
                kind_of(&other)
            )));
        }
    };

    // serde_json may be built with `preserve_order`, so sort explicitly.
    let mut fields: Vec<_> = object.into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut record = Record::new();
    for (column, field) in fields {
        if options.omit.iter().any(|o| *o == column) {
            continue;
        }
        if field.is_null() && !options.include_nil {
            continue;
        }
        let value = to_value(&column, field)?;
        record.push(column, value);
    }

    Ok(record)
}

fn to_value(column: &str, field: serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    Ok(match field {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_u64() {
                return Err(RowgateError::mapping(format!(
                    "column '{}' holds {} which does not fit a BIGINT",
                    column, n
                )));
            } else {
                // Always Some for numbers that are neither i64 nor u64.
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::Text(s),
        nested @ (Json::Array(_) | Json::Object(_)) => Value::Text(nested.to_string()),
    })
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
