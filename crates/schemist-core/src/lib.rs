//! Core contracts and helpers for Schemist.
//!
//! This crate defines the schema model shared by the dialects, the diff
//! planner, the adapters and the CLI.

pub mod constraints;
pub mod error;
pub mod redaction;
pub mod schema;
pub mod types;
pub mod validation;

pub use constraints::{Key, KeyPart};
pub use error::{Error, Result};
pub use redaction::{RedactedConnection, redact_connection_string};
pub use schema::{Catalog, Column, TEMP_COLUMN_PREFIX, Table};
pub use types::{ColumnDefinition, DeprecatedActions, ValueType};
pub use validation::{validate_catalog, validate_table};
