//! Schema diff planner.
//!
//! Compares a live table with its declared target and produces the ordered
//! DDL actions that reconcile them.

pub mod catalog;
pub mod diff;
pub mod model;

pub use catalog::plan_catalog;
pub use diff::diff;
pub use model::{Action, ActionKind, CatalogPlan, TablePlan, sort_actions};
