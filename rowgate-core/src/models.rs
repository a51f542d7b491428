//! Core data models shared by the mapper, the statement builder and the
//! database adapters.
//!
//! Nothing here is persisted. A [`Record`] lives for the duration of one
//! insert, and an [`InsertKey`] is what the caller gets back.

use serde::Serialize;
use std::collections::BTreeMap;

/// A single column value that can be bound to a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// BIT
    Bool(bool),
    /// Any integer column, bound as BIGINT
    Int(i64),
    /// FLOAT
    Float(f64),
    /// NVARCHAR; also carries nested JSON produced by the mapper
    Text(String),
    /// VARBINARY
    Bytes(Vec<u8>),
    /// UNIQUEIDENTIFIER
    Uuid(uuid::Uuid),
    /// DATETIME2 without a time zone
    Timestamp(chrono::NaiveDateTime),
}

impl Value {
    /// Returns true for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Timestamp(t) => write!(f, "{}", t),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(value: uuid::Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(value: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Column-name to value mapping, used for composite primary keys.
pub type Cond = BTreeMap<String, Value>;

/// Column names and values derived from one input item.
///
/// `columns[i]` always names `values[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(column, value)` pairs, keeping their order.
    ///
    /// # Example
    /// ```rust
    /// use rowgate_core::models::{Record, Value};
    ///
    /// let record = Record::from_pairs([("id", Value::from(7)), ("name", Value::from("ada"))]);
    /// assert_eq!(record.columns(), ["id", "name"]);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.push(column, value);
        }
        record
    }

    /// Appends one column and its value.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push(column.into());
        self.values.push(value.into());
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column values, positionally aligned with [`Record::columns`].
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Looks up the value of a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Iterates over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Splits the record into its column and value vectors.
    pub fn into_parts(self) -> (Vec<String>, Vec<Value>) {
        (self.columns, self.values)
    }
}

/// Key returned by a successful insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsertKey {
    /// Identity assigned by the server for tables with at most one primary
    /// key column. `None` when the driver could not report it.
    Id(Option<i64>),
    /// Supplied values of every primary key column present in the record.
    Composite(Cond),
}

impl InsertKey {
    /// Returns the generated identity, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            InsertKey::Id(id) => *id,
            InsertKey::Composite(_) => None,
        }
    }
}

/// What a statement does, as far as drivers care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Anything that needs no post-processing, such as `SET` statements.
    Raw,
    /// An INSERT whose generated identity should be reported.
    Insert,
}

/// SQL text plus positional parameters (`@P1`, `@P2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// T-SQL text with `@Pn` placeholders
    pub sql: String,
    /// Values for the placeholders, in order
    pub params: Vec<Value>,
    /// How drivers should treat the result
    pub kind: StatementKind,
}

impl Statement {
    /// Creates a raw statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            kind: StatementKind::Raw,
        }
    }

    /// Creates a raw statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
            kind: StatementKind::Raw,
        }
    }
}

/// Outcome of executing one statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows the statement touched
    pub rows_affected: u64,
    /// Identity generated by an INSERT, when the driver could read it
    pub last_insert_id: Option<i64>,
}
