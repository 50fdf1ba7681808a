//! Database adapters: live schema introspection and statement execution.

pub mod adapter;
pub mod options;
pub mod postgres;

pub use adapter::{Adapter, Transaction};
pub use options::IntrospectOptions;
pub use postgres::{PostgresAdapter, introspect_postgres, introspect_postgres_with_options};
