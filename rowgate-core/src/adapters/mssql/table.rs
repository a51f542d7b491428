//! SQL Server collection.
//!
//! Inserting into a table with an identity column fails unless
//! `IDENTITY_INSERT` is switched on for that table, so [`Table`] switches it
//! on whenever the record carries a non-null primary key value and off again
//! once the INSERT has run. All three statements share one session.

use crate::Result;
use crate::adapters::{BaseCollection, Collection, Database, Session};
use crate::builder::{insert_into, quote_identifier};
use crate::models::{Cond, InsertKey, Record, Statement};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// A SQL Server table exposed as a [`Collection`].
pub struct Table {
    base: BaseCollection,
    database: Arc<dyn Database>,
    name: String,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("database", &self.database.name())
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Binds a table to `database`. Primary keys are looked up on first insert.
    pub fn new(database: Arc<dyn Database>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            base: BaseCollection::new(name.clone()),
            database,
            name,
        }
    }

    /// Pins the primary key columns instead of asking the server.
    pub fn with_primary_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base = BaseCollection::with_primary_keys(self.name.clone(), keys);
        self
    }

    /// Primary key columns of this table.
    pub async fn primary_keys(&self) -> Result<&[String]> {
        self.base.primary_keys(self.database.as_ref()).await
    }
}

#[async_trait]
impl Collection for Table {
    fn name(&self) -> &str {
        &self.name
    }

    fn database(&self) -> &dyn Database {
        self.database.as_ref()
    }

    async fn insert_record(&self, record: Record) -> Result<InsertKey> {
        let primary_keys = self.primary_keys().await?;
        let explicit_keys = has_explicit_keys(&self.name, &record, primary_keys);

        let insertable = without_null_keys(&record, primary_keys);
        let statement = insert_into(self.name.as_str())
            .columns(insertable.columns().iter().cloned())
            .values(insertable.values().iter().cloned())
            .build()?;

        let mut session = self.database.session().await?;

        let identity_insert = if explicit_keys {
            let table = quote_identifier(&self.name)?;
            IdentityInsert::enable(session.as_mut(), table).await?
        } else {
            None
        };

        let result = session.exec(&statement).await;

        if let Some(identity) = identity_insert {
            identity.disable(session.as_mut()).await;
        }

        let result = result?;
        debug!(
            table = %self.name,
            rows = result.rows_affected,
            "inserted record"
        );

        if primary_keys.len() <= 1 {
            // The insert already succeeded; a missing identity is not an error.
            return Ok(InsertKey::Id(result.last_insert_id));
        }

        Ok(InsertKey::Composite(key_values(&record, primary_keys)))
    }
}

/// True when any primary key column carries a non-null value.
fn has_explicit_keys(table: &str, record: &Record, primary_keys: &[String]) -> bool {
    let mut found = false;
    for (column, value) in record.iter() {
        if value.is_null() || !primary_keys.iter().any(|k| k == column) {
            continue;
        }
        debug!(table, key = column, value = %value, "explicit primary key value");
        found = true;
    }
    found
}

/// Copy of `record` without primary key columns whose value is null.
///
/// An identity column may not appear in the column list while identity
/// insert is off, not even with a NULL value, so a null key is left for the
/// server to generate.
fn without_null_keys(record: &Record, primary_keys: &[String]) -> Record {
    Record::from_pairs(
        record
            .iter()
            .filter(|(column, value)| {
                !(value.is_null() && primary_keys.iter().any(|k| k == column))
            })
            .map(|(column, value)| (column, value.clone())),
    )
}

/// Supplied values of the primary key columns present in `record`.
fn key_values(record: &Record, primary_keys: &[String]) -> Cond {
    record
        .iter()
        .filter(|(column, _)| primary_keys.iter().any(|k| k == column))
        .map(|(column, value)| (column.to_string(), value.clone()))
        .collect()
}

/// `IDENTITY_INSERT` switched on for one table on one session.
struct IdentityInsert {
    table: String,
}

impl IdentityInsert {
    /// Switches identity insert on.
    ///
    /// Returns `None` when the table has no identity column, which is fine:
    /// key values can then be inserted without it.
    async fn enable(session: &mut (dyn Session + '_), table: String) -> Result<Option<Self>> {
        let statement = Statement::raw(format!("SET IDENTITY_INSERT {} ON", table));
        match session.exec(&statement).await {
            Ok(_) => Ok(Some(Self { table })),
            Err(e) if e.is_missing_identity() => {
                debug!(table = %table, "table has no identity column");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Switches identity insert off. Failures are logged and otherwise
    /// ignored; the INSERT outcome is what the caller gets.
    async fn disable(self, session: &mut (dyn Session + '_)) {
        let statement = Statement::raw(format!("SET IDENTITY_INSERT {} OFF", self.table));
        if let Err(e) = session.exec(&statement).await {
            warn!(table = %self.table, error = %e, "failed to switch identity insert off");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn test_has_explicit_keys_ignores_nulls_and_other_columns() {
        let keys = vec!["id".to_string()];

        let record = Record::from_pairs([("id", Value::Null), ("name", Value::from("x"))]);
        assert!(!has_explicit_keys("t", &record, &keys));

        let record = Record::from_pairs([("code", Value::from(5)), ("name", Value::from("x"))]);
        assert!(!has_explicit_keys("t", &record, &keys));

        let record = Record::from_pairs([("id", Value::from(5))]);
        assert!(has_explicit_keys("t", &record, &keys));
    }

    #[test]
    fn test_without_null_keys_drops_only_null_key_columns() {
        let keys = vec!["id".to_string(), "region".to_string()];
        let record = Record::from_pairs([
            ("id", Value::Null),
            ("nickname", Value::Null),
            ("region", Value::from("eu")),
        ]);

        let insertable = without_null_keys(&record, &keys);

        assert_eq!(insertable.columns(), ["nickname", "region"]);
        assert_eq!(insertable.values(), [Value::Null, Value::from("eu")]);
    }

    #[test]
    fn test_key_values_keeps_only_present_keys() {
        let keys = vec!["tenant".to_string(), "code".to_string(), "region".to_string()];
        let record = Record::from_pairs([
            ("code", Value::from("a")),
            ("label", Value::from("x")),
            ("tenant", Value::from(2)),
        ]);

        let cond = key_values(&record, &keys);
        assert_eq!(cond.len(), 2);
        assert_eq!(cond.get("tenant"), Some(&Value::Int(2)));
        assert_eq!(cond.get("code"), Some(&Value::from("a")));
        assert!(!cond.contains_key("region"));
    }
}
