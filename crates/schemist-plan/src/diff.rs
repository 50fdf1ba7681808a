use std::collections::HashSet;

use schemist_core::{Column, Error, Key, Result, Table};
use schemist_dialect::{Dialect, Fragment};

use crate::model::{Action, ActionKind, TablePlan, sort_actions};

/// Compute the ordered actions turning `current` into `target`.
///
/// `current` is `None` when the table does not exist yet. The input is never
/// mutated; planned renames are registered on the returned snapshot instead.
pub fn diff(dialect: &dyn Dialect, current: Option<&Table>, target: &Table) -> Result<TablePlan> {
    let Some(current) = current else {
        return Ok(create(dialect, target));
    };

    let mut planner = Planner::new(dialect, current.clone(), target);
    planner.reconcile_deprecated_columns()?;
    planner.reconcile_live_columns();
    planner.collect_temporary_columns();
    planner.reconcile_keys();
    Ok(planner.finish())
}

/// One `createTable` action, then one `addIndex` per secondary key.
fn create(dialect: &dyn Dialect, target: &Table) -> TablePlan {
    let mut actions = vec![Action::new(
        ActionKind::CreateTable,
        &target.name,
        &target.name,
        vec![dialect.create_table(target)],
    )];
    for key in target.keys.iter().filter(|key| !key.primary) {
        if let Some(fragment) = dialect.add_index(key) {
            actions.push(Action::new(
                ActionKind::AddIndex,
                &target.name,
                &key.name,
                vec![fragment],
            ));
        }
    }
    TablePlan {
        table: target.name.clone(),
        actions,
        snapshot: None,
        created: true,
    }
}

struct Planner<'a> {
    dialect: &'a dyn Dialect,
    snapshot: Table,
    target: &'a Table,
    actions: Vec<Action>,
    /// Columns whose storage or identity changed; indexes over them are rebuilt.
    modified: HashSet<String>,
    /// Columns removed or renamed away; indexes over them are dropped.
    dropped: HashSet<String>,
    emitted: HashSet<(ActionKind, String)>,
}

impl<'a> Planner<'a> {
    fn new(dialect: &'a dyn Dialect, snapshot: Table, target: &'a Table) -> Self {
        Self {
            dialect,
            snapshot,
            target,
            actions: Vec::new(),
            modified: HashSet::new(),
            dropped: HashSet::new(),
            emitted: HashSet::new(),
        }
    }

    fn push(&mut self, kind: ActionKind, name: &str, fragments: Vec<Fragment>) {
        if fragments.is_empty() {
            return;
        }
        if matches!(kind, ActionKind::DropIndex | ActionKind::AddIndex)
            && !self.emitted.insert((kind, name.to_string()))
        {
            return;
        }
        self.actions
            .push(Action::new(kind, &self.target.name, name, fragments));
    }

    fn drop_column(&mut self, column: &Column) {
        let fragment = self.dialect.drop_column(column);
        self.push(ActionKind::DropColumn, &column.name, vec![fragment]);
        self.dropped.insert(column.name.clone());
        self.snapshot.remove_column(&column.name);
    }

    /// Deprecated target columns first, so a successor declared before its
    /// old name still sees the rename registered.
    fn reconcile_deprecated_columns(&mut self) -> Result<()> {
        let target = self.target;
        for column in target
            .columns
            .iter()
            .filter(|column| column.definition.is_deprecated())
        {
            let Some(existing) = self.snapshot.column(&column.name).cloned() else {
                continue;
            };

            let Some(to) = column.definition.rename_target() else {
                self.drop_column(&existing);
                continue;
            };

            let successor = target
                .column(to)
                .filter(|successor| !successor.definition.is_deprecated())
                .ok_or_else(|| {
                    Error::InvalidSchema(format!(
                        "rename target not found: {}.{} -> {}",
                        target.name, column.name, to
                    ))
                })?;

            if let Some(stale) = self.snapshot.column(&successor.name).cloned() {
                self.drop_column(&stale);
            }

            let fragment = self.dialect.rename_column(&existing, &successor.name);
            self.push(ActionKind::RenameColumn, &existing.name, vec![fragment]);
            self.snapshot.rename_column(&existing.name, &successor.name);
            self.dropped.insert(existing.name.clone());
            self.dropped.remove(&successor.name);
            self.modified.insert(successor.name.clone());
        }
        Ok(())
    }

    fn reconcile_live_columns(&mut self) {
        let target = self.target;
        for column in target
            .columns
            .iter()
            .filter(|column| !column.definition.is_deprecated())
        {
            match self.snapshot.column(&column.name).cloned() {
                Some(existing) => {
                    let current_type = self.dialect.data_type(&existing.definition);
                    let target_type = self.dialect.data_type(&column.definition);
                    if current_type.eq_ignore_ascii_case(&target_type) {
                        continue;
                    }
                    let fragments = self.dialect.modify_column(column, &existing);
                    if !fragments.is_empty() {
                        self.push(ActionKind::ModifyColumn, &column.name, fragments);
                        self.modified.insert(column.name.clone());
                    }
                }
                None => {
                    let fragment = self.dialect.add_column(column);
                    self.push(ActionKind::AddColumn, &column.name, vec![fragment]);
                }
            }
        }
    }

    /// Leftovers of a copy sequence interrupted before its final drop.
    fn collect_temporary_columns(&mut self) {
        let leftovers: Vec<Column> = self
            .snapshot
            .columns
            .iter()
            .filter(|column| column.is_temporary() && self.target.column(&column.name).is_none())
            .cloned()
            .collect();
        for column in &leftovers {
            self.drop_column(column);
        }
    }

    fn reconcile_keys(&mut self) {
        let target = self.target;
        for key in target.keys.iter().filter(|key| !key.primary) {
            let existing = self
                .snapshot
                .key(&key.name)
                .filter(|item| !item.primary)
                .cloned();
            let rebuild = key.columns().any(|column| self.modified.contains(column));
            match existing {
                Some(existing) if rebuild || !existing.same_parts(key) => {
                    self.drop_index(&existing);
                    self.add_index(key);
                }
                Some(_) => {}
                None => self.add_index(key),
            }
        }

        let current_keys: Vec<Key> = self
            .snapshot
            .keys
            .iter()
            .filter(|key| !key.primary)
            .cloned()
            .collect();
        for key in &current_keys {
            let cascades = key.columns().any(|column| self.dropped.contains(column));
            if cascades || target.key(&key.name).is_none() {
                self.drop_index(key);
            }
        }
    }

    fn drop_index(&mut self, key: &Key) {
        if let Some(fragment) = self.dialect.drop_index(key) {
            self.push(ActionKind::DropIndex, &key.name, vec![fragment]);
        }
    }

    fn add_index(&mut self, key: &Key) {
        if let Some(fragment) = self.dialect.add_index(key) {
            self.push(ActionKind::AddIndex, &key.name, vec![fragment]);
        }
    }

    fn finish(mut self) -> TablePlan {
        sort_actions(&mut self.actions);
        TablePlan {
            table: self.target.name.clone(),
            actions: self.actions,
            snapshot: Some(self.snapshot),
            created: false,
        }
    }
}
