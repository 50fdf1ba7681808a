use std::io::Write;
use std::time::Instant;

use tracing::{debug, info, warn};

use schemist_core::{Catalog, Error, Result, validate_catalog};
use schemist_introspect::Adapter;
use schemist_plan::{CatalogPlan, plan_catalog};

use crate::model::MigrationReport;

/// Validate `target`, read the live catalog and plan the difference.
pub async fn plan_against(adapter: &dyn Adapter, target: &Catalog) -> Result<CatalogPlan> {
    validate_catalog(target)?;

    let current = adapter.catalog().await?;
    info!(
        event = "catalog_loaded",
        engine = adapter.engine(),
        tables = current.len()
    );

    let plan = plan_catalog(adapter.dialect(), &current, target)?;
    info!(
        event = "plan_built",
        actions = plan.actions.len(),
        statements = plan.fragments().count()
    );
    Ok(plan)
}

/// Bring the database behind `adapter` in line with `target`.
///
/// Every statement runs in a single transaction; the first failure rolls the
/// whole migration back. An empty plan opens no transaction at all.
pub async fn migrate(adapter: &dyn Adapter, target: &Catalog) -> Result<MigrationReport> {
    let plan = plan_against(adapter, target).await?;
    apply(adapter, &plan).await
}

/// Execute an already built plan in a single transaction.
pub async fn apply(adapter: &dyn Adapter, plan: &CatalogPlan) -> Result<MigrationReport> {
    let mut report = MigrationReport::planned(plan);
    if plan.is_empty() {
        info!(event = "migration_skipped", reason = "up_to_date");
        return Ok(report);
    }

    let start = Instant::now();
    let mut tx = adapter.begin().await?;
    for fragment in plan.fragments() {
        match tx.exec(fragment).await {
            Ok(rows) => {
                debug!(event = "statement_executed", sql = %fragment.sql, rows = rows);
            }
            Err(err) => {
                let message = err.to_string();
                warn!(
                    event = "migration_rolled_back",
                    sql = %fragment.sql,
                    error = %message
                );
                if let Err(rollback) = tx.rollback().await {
                    warn!(event = "rollback_failed", error = %rollback);
                }
                return Err(Error::Execution {
                    statement: fragment.sql.clone(),
                    message,
                });
            }
        }
    }
    tx.commit().await?;

    report.applied = true;
    info!(
        event = "migration_committed",
        statements = report.statements,
        duration_ms = start.elapsed().as_millis() as u64
    );
    Ok(report)
}

/// Render the migration as a script instead of executing it.
pub async fn migrate_to_writer<W: Write>(
    adapter: &dyn Adapter,
    target: &Catalog,
    out: W,
) -> Result<MigrationReport> {
    let plan = plan_against(adapter, target).await?;
    write_statements(&plan, out)
}

/// Write every statement of `plan` on its own `;`-terminated line.
pub fn write_statements<W: Write>(plan: &CatalogPlan, mut out: W) -> Result<MigrationReport> {
    for statement in plan.statements() {
        writeln!(out, "{statement}")?;
    }
    out.flush()?;
    Ok(MigrationReport::planned(plan))
}
