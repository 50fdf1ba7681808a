//! Applies a planned migration through an adapter, inside one transaction.

pub mod executor;
pub mod model;

pub use executor::{apply, migrate, migrate_to_writer, plan_against, write_statements};
pub use model::MigrationReport;
