use serde::Serialize;

use schemist_plan::CatalogPlan;

/// Summary of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Planned actions.
    pub actions: usize,
    /// Statements rendered from those actions.
    pub statements: usize,
    /// Whether the statements were committed to the database.
    pub applied: bool,
}

impl MigrationReport {
    pub fn planned(plan: &CatalogPlan) -> Self {
        Self {
            actions: plan.actions.len(),
            statements: plan.fragments().count(),
            applied: false,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.statements == 0
    }
}
