//! Core library for rowgate.
//!
//! rowgate maps generic "insert this record" calls onto SQL Server. A record
//! (any `Serialize` struct or map) is turned into columns and values, an
//! INSERT is built for the T-SQL dialect, `IDENTITY_INSERT` is switched on
//! when primary key values are supplied explicitly, and the generated or
//! supplied key is handed back.
//!
//! # Architecture
//! - `mapper`: record → columns/values
//! - `builder`: INSERT statement rendering with bracket quoting
//! - `adapters`: `Database`/`Session`/`Collection` traits and the SQL Server
//!   adapter
//! - `error`, `logging`: ambient error and tracing setup
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - Connection URLs are redacted in errors and logs

pub mod adapters;
pub mod builder;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod models;

// Re-export commonly used types
pub use adapters::{Collection, CollectionExt, ConnectionConfig, Database, Session};
pub use error::{Result, RowgateError};
pub use logging::init_logging;
pub use mapper::{MapOptions, map_item};
pub use models::{Cond, ExecResult, InsertKey, Record, Statement, StatementKind, Value};

#[cfg(feature = "mssql")]
pub use adapters::mssql::MssqlDatabase;
