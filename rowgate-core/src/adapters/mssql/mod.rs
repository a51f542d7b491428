//! SQL Server adapter.
//!
//! # Module Structure
//! - `table`: The collection that inserts records, toggling identity insert
//!   when key values are supplied
//! - `connection`: tiberius-backed [`MssqlDatabase`] (requires the `mssql`
//!   feature)
//!
//! # SQL Server-Specific Behavior
//! - Writing explicit values into an identity column requires
//!   `SET IDENTITY_INSERT <table> ON`, which is session-scoped
//! - Identifiers are quoted with `[brackets]`
//! - The generated identity is read with `SCOPE_IDENTITY()` in the same batch

#[cfg(feature = "mssql")]
pub mod connection;
pub mod table;


#[cfg(feature = "mssql")]
pub use connection::MssqlDatabase;
pub use table::Table;
