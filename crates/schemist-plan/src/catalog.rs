use schemist_core::{Catalog, Result};
use schemist_dialect::Dialect;

use crate::diff::diff;
use crate::model::{CatalogPlan, sort_actions};

/// Plan every table of `target` against the live catalog `current`.
///
/// Incremental actions of all tables are merged and re-sorted by kind and
/// name, so every index drop across the catalog runs before any column drop.
/// New tables follow in catalog order, each creation directly followed by its
/// index builds.
pub fn plan_catalog(
    dialect: &dyn Dialect,
    current: &Catalog,
    target: &Catalog,
) -> Result<CatalogPlan> {
    let mut incremental = Vec::new();
    let mut creations = Vec::new();

    for table in target.iter() {
        let plan = diff(dialect, current.table(&table.name), table)?;
        tracing::debug!(
            event = "table_planned",
            table = %plan.table,
            created = plan.created,
            actions = plan.actions.len()
        );
        if plan.created {
            creations.extend(plan.actions);
        } else {
            incremental.extend(plan.actions);
        }
    }

    sort_actions(&mut incremental);
    incremental.extend(creations);

    Ok(CatalogPlan {
        actions: incremental,
    })
}
