//! Backend DDL renderers.
//!
//! A [`Dialect`] turns one structural intent (add a column, build an index)
//! into backend-specific [`Fragment`]s and renders column storage types for
//! type-change detection.

pub mod dialect;
pub mod fragment;
pub mod postgres;
pub mod sqlite;

pub use dialect::{Dialect, quote_ident};
pub use fragment::{Fragment, Value};
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
