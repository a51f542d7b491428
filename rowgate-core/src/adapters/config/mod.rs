//! Configuration types for database adapters.
//!
//! # Security
//! These configuration structs intentionally do NOT store passwords or
//! credentials. Credentials are consumed when the driver connects.

mod connection;

pub use connection::{ConnectionConfig, DEFAULT_PORT};
