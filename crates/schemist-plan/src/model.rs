use std::fmt;

use serde::{Deserialize, Serialize};

use schemist_core::Table;
use schemist_dialect::Fragment;

/// Ordering class of a planned action.
///
/// Variants are declared in execution order: indexes over changing columns go
/// first, renames precede modifications and additions, new columns exist
/// before the indexes that cover them, and table creation comes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    DropIndex,
    DropColumn,
    RenameColumn,
    ModifyColumn,
    AddColumn,
    AddIndex,
    CreateTable,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::DropIndex => "dropIndex",
            ActionKind::DropColumn => "dropColumn",
            ActionKind::RenameColumn => "renameColumn",
            ActionKind::ModifyColumn => "modifyColumn",
            ActionKind::AddColumn => "addColumn",
            ActionKind::AddIndex => "addIndex",
            ActionKind::CreateTable => "createTable",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned DDL step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub table: String,
    /// Object the action applies to: index, column (old name for renames) or table.
    pub name: String,
    pub fragments: Vec<Fragment>,
}

impl Action {
    pub fn new(
        kind: ActionKind,
        table: impl Into<String>,
        name: impl Into<String>,
        fragments: Vec<Fragment>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            name: name.into(),
            fragments,
        }
    }
}

/// Stable sort by kind, then by name.
pub fn sort_actions(actions: &mut [Action]) {
    actions.sort_by(|left, right| {
        left.kind
            .cmp(&right.kind)
            .then_with(|| left.name.cmp(&right.name))
    });
}

/// Result of diffing one table.
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table: String,
    pub actions: Vec<Action>,
    /// Live table with planned renames registered; `None` when the table is created.
    pub snapshot: Option<Table>,
    pub created: bool,
}

impl TablePlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Combined plan for a whole catalog, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogPlan {
    pub actions: Vec<Action>,
}

impl CatalogPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.actions.iter().flat_map(|action| action.fragments.iter())
    }

    /// Every statement as script text, one per line.
    pub fn statements(&self) -> Vec<String> {
        self.fragments().map(Fragment::to_statement).collect()
    }
}
