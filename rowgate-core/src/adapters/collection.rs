//! Primary key bookkeeping shared by collection implementations.

use super::Database;
use crate::Result;
use tokio::sync::OnceCell;

/// Per-table helper that knows the table's primary key columns.
///
/// Keys are looked up through [`Database::primary_keys`] the first time they
/// are needed and cached for the lifetime of the collection.
#[derive(Debug)]
pub struct BaseCollection {
    table: String,
    primary_keys: OnceCell<Vec<String>>,
}

impl BaseCollection {
    /// Creates a helper that looks the keys up on first use.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_keys: OnceCell::new(),
        }
    }

    /// Creates a helper with known primary keys; the database is never asked.
    pub fn with_primary_keys<I, S>(table: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            primary_keys: OnceCell::from(keys.into_iter().map(Into::into).collect::<Vec<_>>()),
        }
    }

    /// Table name the keys belong to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the primary key columns, fetching them on first use.
    ///
    /// A failed lookup is not cached; the next call tries again.
    pub async fn primary_keys(&self, database: &dyn Database) -> Result<&[String]> {
        let keys = self
            .primary_keys
            .get_or_try_init(|| async {
                let keys = database.primary_keys(&self.table).await?;
                tracing::debug!(table = %self.table, keys = ?keys, "loaded primary keys");
                Ok::<_, crate::RowgateError>(keys)
            })
            .await?;
        Ok(keys.as_slice())
    }
}
