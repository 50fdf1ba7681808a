use schemist_core::{Column, ColumnDefinition, Key, Table};

use crate::fragment::Fragment;

/// Per-backend translator from structural intent to DDL.
pub trait Dialect: Send + Sync {
    /// Backend identifier (e.g. `postgres`).
    fn name(&self) -> &'static str;

    /// Table body, including the primary key.
    fn create_table(&self, table: &Table) -> Fragment;

    /// Table body followed by one fragment per non-primary index.
    fn create_table_if_not_exists(&self, table: &Table) -> Vec<Fragment> {
        let mut fragments = vec![self.create_table(table)];
        fragments.extend(table.keys.iter().filter_map(|key| self.add_index(key)));
        fragments
    }

    fn drop_table(&self, table: &Table) -> Fragment;

    fn truncate_table(&self, table: &Table) -> Fragment;

    fn add_column(&self, column: &Column) -> Fragment;

    fn drop_column(&self, column: &Column) -> Fragment;

    /// Rename `column` to `to`.
    fn rename_column(&self, column: &Column, to: &str) -> Fragment;

    /// Change the storage of `prev` into `column`.
    ///
    /// Returns nothing when only the auto-increment status differs.
    fn modify_column(&self, column: &Column, prev: &Column) -> Vec<Fragment>;

    /// Returns `None` for a primary key.
    fn add_index(&self, key: &Key) -> Option<Fragment>;

    /// Returns `None` for a primary key.
    fn drop_index(&self, key: &Key) -> Option<Fragment>;

    /// Effective storage type, compared case-insensitively to detect type changes.
    fn data_type(&self, definition: &ColumnDefinition) -> String;
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
