//! INSERT statement builder for the T-SQL dialect.
//!
//! Only INSERT is covered. Identifiers are bracket-quoted, non-null values
//! are bound as `@P1..@Pn` parameters, and NULL is written inline so the
//! server never has to infer the type of an untyped NULL parameter.

use crate::adapters::Session;
use crate::models::{ExecResult, Statement, StatementKind, Value};
use crate::{Result, error::RowgateError};
use std::collections::HashSet;

/// SQL Server accepts at most 2100 parameters per request.
pub const MAX_PARAMETERS: usize = 2100;

/// SQL Server accepts at most 1000 row value expressions per VALUES clause.
pub const MAX_ROWS: usize = 1000;

/// Starts an INSERT into `table`.
pub fn insert_into(table: impl Into<String>) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Builder for `INSERT INTO ... VALUES ...` statements.
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl InsertBuilder {
    /// Starts an INSERT into `table`. Same as [`insert_into`].
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Sets the target columns.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one row of values. Call repeatedly to insert several rows.
    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    /// Renders the statement.
    ///
    /// # Errors
    /// Returns a builder error when the table or a column name is empty,
    /// a column repeats, a row does not match the column count, or the
    /// statement exceeds SQL Server's row or parameter limits.
    ///
    /// # Example
    /// ```rust
    /// use rowgate_core::builder::insert_into;
    ///
    /// let stmt = insert_into("dbo.artists")
    ///     .columns(["id", "name"])
    ///     .values([rowgate_core::Value::Int(1), rowgate_core::Value::Null])
    ///     .build()?;
    /// assert_eq!(stmt.sql, "INSERT INTO [dbo].[artists] ([id], [name]) VALUES (@P1, NULL)");
    /// assert_eq!(stmt.params.len(), 1);
    /// # Ok::<(), rowgate_core::RowgateError>(())
    /// ```
    pub fn build(&self) -> Result<Statement> {
        let table = split_identifier(&self.table)?;
        let mut sql = format!("INSERT INTO {}", join_quoted(&table));

        if self.columns.is_empty() {
            if self.rows.iter().any(|row| !row.is_empty()) {
                return Err(RowgateError::builder("values given without columns"));
            }
            if self.rows.len() > 1 {
                return Err(RowgateError::builder(
                    "only one DEFAULT VALUES row can be inserted per statement",
                ));
            }
            sql.push_str(" DEFAULT VALUES");
            return Ok(Statement {
                sql,
                params: Vec::new(),
                kind: StatementKind::Insert,
            });
        }

        if self.rows.is_empty() {
            return Err(RowgateError::builder("no values to insert"));
        }
        if self.rows.len() > MAX_ROWS {
            return Err(RowgateError::builder(format!(
                "{} rows exceed the limit of {} per statement",
                self.rows.len(),
                MAX_ROWS
            )));
        }

        let mut seen = HashSet::new();
        let mut quoted_columns = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            if column.is_empty() {
                return Err(RowgateError::builder("empty column name"));
            }
            if !seen.insert(column.as_str()) {
                return Err(RowgateError::builder(format!(
                    "column '{}' specified more than once",
                    column
                )));
            }
            quoted_columns.push(quote_part(column));
        }

        let mut params = Vec::new();
        let mut tuples = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(RowgateError::builder(format!(
                    "row {} has {} values for {} columns",
                    index,
                    row.len(),
                    self.columns.len()
                )));
            }

            let mut slots = Vec::with_capacity(row.len());
            for value in row {
                if value.is_null() {
                    slots.push("NULL".to_string());
                } else {
                    params.push(value.clone());
                    slots.push(format!("@P{}", params.len()));
                }
            }
            tuples.push(format!("({})", slots.join(", ")));
        }

        if params.len() > MAX_PARAMETERS {
            return Err(RowgateError::builder(format!(
                "{} parameters exceed the limit of {}",
                params.len(),
                MAX_PARAMETERS
            )));
        }

        sql.push_str(&format!(
            " ({}) VALUES {}",
            quoted_columns.join(", "),
            tuples.join(", ")
        ));

        Ok(Statement {
            sql,
            params,
            kind: StatementKind::Insert,
        })
    }

    /// Builds the statement and executes it on `session`.
    pub async fn exec(&self, session: &mut dyn Session) -> Result<ExecResult> {
        let statement = self.build()?;
        tracing::trace!(sql = %statement.sql, params = statement.params.len(), "executing insert");
        session.exec(&statement).await
    }
}

/// Quotes a possibly schema-qualified identifier: `dbo.users` becomes
/// `[dbo].[users]`. Parts that are already bracketed are kept as one part.
///
/// # Errors
/// Returns a builder error for empty names, empty parts, or an unterminated
/// bracket.
pub fn quote_identifier(name: &str) -> Result<String> {
    split_identifier(name).map(|parts| join_quoted(&parts))
}

/// Splits a dotted identifier into its unquoted parts.
pub(crate) fn split_identifier(name: &str) -> Result<Vec<String>> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RowgateError::builder("empty table name"));
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();
    let mut in_brackets = false;

    while let Some(c) = chars.next() {
        match (in_brackets, c) {
            (false, '[') if current.is_empty() => in_brackets = true,
            (true, ']') => {
                if chars.peek() == Some(&']') {
                    chars.next();
                    current.push(']');
                } else {
                    in_brackets = false;
                }
            }
            (false, '.') => parts.push(std::mem::take(&mut current)),
            (_, c) => current.push(c),
        }
    }

    if in_brackets {
        return Err(RowgateError::builder(format!(
            "unterminated bracket in identifier '{}'",
            name
        )));
    }
    parts.push(current);

    if parts.iter().any(String::is_empty) {
        return Err(RowgateError::builder(format!(
            "identifier '{}' has an empty part",
            name
        )));
    }

    Ok(parts)
}

fn quote_part(part: &str) -> String {
    format!("[{}]", part.replace(']', "]]"))
}

fn join_quoted(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| quote_part(p))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() -> Result<()> {
        assert_eq!(quote_identifier("users")?, "[users]");
        assert_eq!(quote_identifier("dbo.users")?, "[dbo].[users]");
        assert_eq!(quote_identifier("[dbo].[my.table]")?, "[dbo].[my.table]");
        assert_eq!(quote_identifier("odd]name")?, "[odd]]name]");
        assert_eq!(quote_identifier("[odd]]name]")?, "[odd]]name]");
        Ok(())
    }

    #[test]
    fn test_quote_identifier_rejects_bad_names() {
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("   ").is_err());
        assert!(quote_identifier("dbo.").is_err());
        assert!(quote_identifier("[dbo.users").is_err());
    }

    #[test]
    fn test_build_single_row() -> Result<()> {
        let stmt = insert_into("artists")
            .columns(["id", "name", "country"])
            .values([Value::Int(3), Value::from("Nina"), Value::Null])
            .build()?;

        assert_eq!(
            stmt.sql,
            "INSERT INTO [artists] ([id], [name], [country]) VALUES (@P1, @P2, NULL)"
        );
        assert_eq!(stmt.params, [Value::Int(3), Value::from("Nina")]);
        assert_eq!(stmt.kind, StatementKind::Insert);
        Ok(())
    }

    #[test]
    fn test_build_multiple_rows_numbers_parameters_across_rows() -> Result<()> {
        let stmt = insert_into("tags")
            .columns(["name"])
            .values(["a"])
            .values(["b"])
            .build()?;

        assert_eq!(stmt.sql, "INSERT INTO [tags] ([name]) VALUES (@P1), (@P2)");
        assert_eq!(stmt.params.len(), 2);
        Ok(())
    }

    #[test]
    fn test_build_default_values() -> Result<()> {
        let stmt = insert_into("counters").build()?;
        assert_eq!(stmt.sql, "INSERT INTO [counters] DEFAULT VALUES");

        let stmt = insert_into("counters")
            .columns(Vec::<String>::new())
            .values(Vec::<Value>::new())
            .build()?;
        assert_eq!(stmt.sql, "INSERT INTO [counters] DEFAULT VALUES");
        assert!(stmt.params.is_empty());
        Ok(())
    }

    #[test]
    fn test_build_rejects_mismatched_rows() {
        let result = insert_into("t")
            .columns(["a", "b"])
            .values([Value::Int(1)])
            .build();
        assert!(matches!(result, Err(RowgateError::Builder { .. })));
    }

    #[test]
    fn test_build_rejects_duplicate_and_missing_columns() {
        let result = insert_into("t")
            .columns(["a", "a"])
            .values([1, 2])
            .build();
        assert!(matches!(result, Err(RowgateError::Builder { .. })));

        let result = insert_into("t").columns(["a"]).build();
        assert!(matches!(result, Err(RowgateError::Builder { .. })));

        let result = insert_into("t").values([1]).build();
        assert!(matches!(result, Err(RowgateError::Builder { .. })));
    }

    #[test]
    fn test_build_enforces_parameter_limit() {
        let columns: Vec<String> = (0..2101).map(|i| format!("c{}", i)).collect();
        let values: Vec<Value> = (0..2101).map(Value::from).collect();

        let result = insert_into("wide").columns(columns).values(values).build();
        assert!(matches!(result, Err(RowgateError::Builder { .. })));
    }

    struct EchoSession(Vec<Statement>);

    #[async_trait::async_trait]
    impl Session for EchoSession {
        async fn exec(&mut self, statement: &Statement) -> Result<ExecResult> {
            self.0.push(statement.clone());
            Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: Some(11),
            })
        }
    }

    #[tokio::test]
    async fn test_exec_runs_built_statement() -> Result<()> {
        let mut session = EchoSession(Vec::new());

        let result = insert_into("dbo.tags")
            .columns(["name"])
            .values(["rock"])
            .exec(&mut session)
            .await?;

        assert_eq!(result.last_insert_id, Some(11));
        assert_eq!(session.0.len(), 1);
        assert_eq!(session.0[0].sql, "INSERT INTO [dbo].[tags] ([name]) VALUES (@P1)");
        Ok(())
    }

    #[tokio::test]
    async fn test_exec_does_not_send_invalid_statements() {
        let mut session = EchoSession(Vec::new());

        let result = insert_into("t").columns(["a"]).exec(&mut session).await;

        assert!(result.is_err());
        assert!(session.0.is_empty());
    }
}
