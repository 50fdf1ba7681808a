use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::Key;
use crate::error::{Error, Result};
use crate::types::ColumnDefinition;

/// Reserved prefix for the temporary columns of rename/add/copy/drop sequences.
pub const TEMP_COLUMN_PREFIX: &str = "__schemist_tmp_";

/// A column attached to a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Application-side field name; defaults to the column name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub table: String,
    #[serde(flatten)]
    pub definition: ColumnDefinition,
}

impl Column {
    pub fn new(table: &str, name: &str, definition: ColumnDefinition) -> Self {
        Self {
            name: name.to_lowercase(),
            field_name: name.to_string(),
            table: table.to_lowercase(),
            definition,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.name.starts_with(TEMP_COLUMN_PREFIX)
    }

    /// Same column under another name, with deprecation actions cleared.
    pub fn renamed(&self, name: &str) -> Self {
        let mut column = self.clone();
        column.name = name.to_lowercase();
        column.definition.deprecated = None;
        column
    }
}

/// A table: ordered columns plus keys, both looked up by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub keys: Vec<Key>,
}

impl Table {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            columns: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Builder form of [`Table::push_column`].
    pub fn with_column(mut self, name: &str, definition: ColumnDefinition) -> Self {
        let column = Column::new(&self.name, name, definition);
        self.push_column(column);
        self
    }

    /// Builder form of [`Table::push_key`].
    pub fn with_key(mut self, key: Key) -> Self {
        self.push_key(key);
        self
    }

    /// Add a column; a column with the same name is replaced in place.
    pub fn push_column(&mut self, mut column: Column) {
        column.table = self.name.clone();
        match self.columns.iter_mut().find(|item| item.name == column.name) {
            Some(slot) => *slot = column,
            None => self.columns.push(column),
        }
    }

    /// Add a key; a key with the same name is replaced in place.
    pub fn push_key(&mut self, mut key: Key) {
        key.table = self.name.clone();
        match self.keys.iter_mut().find(|item| item.name == key.name) {
            Some(slot) => *slot = key,
            None => self.keys.push(key),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        let name = name.to_lowercase();
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn key(&self, name: &str) -> Option<&Key> {
        let name = name.to_lowercase();
        self.keys.iter().find(|key| key.name == name)
    }

    pub fn primary_key(&self) -> Option<&Key> {
        self.keys.iter().find(|key| key.primary)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let name = name.to_lowercase();
        let position = self.columns.iter().position(|column| column.name == name)?;
        Some(self.columns.remove(position))
    }

    /// Re-register the column `from` under `to`, keeping its position and
    /// storage definition. Any existing column named `to` is replaced.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        let from = from.to_lowercase();
        let to = to.to_lowercase();
        let Some(position) = self.columns.iter().position(|column| column.name == from) else {
            return false;
        };
        let renamed = self.columns[position].renamed(&to);
        self.columns[position] = renamed;
        if let Some(stale) = self
            .columns
            .iter()
            .enumerate()
            .position(|(index, column)| index != position && column.name == to)
        {
            self.columns.remove(stale);
        }
        true
    }

    /// Lower-case every name and attach columns and keys to this table.
    pub fn normalize(&mut self) {
        self.name = self.name.to_lowercase();
        for column in &mut self.columns {
            if column.field_name.is_empty() {
                column.field_name = column.name.clone();
            }
            column.name = column.name.to_lowercase();
            column.table = self.name.clone();
            if let Some(actions) = column.definition.deprecated.as_mut() {
                actions.rename_to = actions
                    .rename_to
                    .take()
                    .map(|to| to.trim().to_lowercase())
                    .filter(|to| !to.is_empty());
            }
        }
        for key in &mut self.keys {
            key.name = key.name.to_lowercase();
            key.table = self.name.clone();
            for part in &mut key.parts {
                part.column = part.column.to_lowercase();
            }
        }
    }
}

/// Ordered, name-keyed collection of tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Catalog {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(skip)]
    requires: Vec<Catalog>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML declaration and normalize it.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(source).map_err(|err| Error::InvalidSchema(err.to_string()))?;
        Ok(catalog.normalized())
    }

    /// Parse a JSON declaration and normalize it.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let catalog: Catalog =
            serde_json::from_str(source).map_err(|err| Error::InvalidSchema(err.to_string()))?;
        Ok(catalog.normalized())
    }

    fn normalized(mut self) -> Self {
        let tables = std::mem::take(&mut self.tables);
        for mut table in tables {
            table.normalize();
            self.insert(table);
        }
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    /// Add a table; a table with the same name is replaced in place.
    pub fn insert(&mut self, table: Table) {
        match self.tables.iter_mut().find(|item| item.name == table.name) {
            Some(slot) => *slot = table,
            None => self.tables.push(table),
        }
    }

    /// Declare that this catalog builds on `other`.
    pub fn require(&mut self, other: Catalog) {
        self.requires.push(other);
    }

    /// Own tables first, then tables of required catalogs not seen yet.
    pub fn iter(&self) -> impl Iterator<Item = &Table> {
        let mut seen = HashSet::new();
        let mut tables = Vec::new();
        self.collect_into(&mut seen, &mut tables);
        tables.into_iter()
    }

    fn collect_into<'a>(&'a self, seen: &mut HashSet<&'a str>, out: &mut Vec<&'a Table>) {
        for table in &self.tables {
            if seen.insert(table.name.as_str()) {
                out.push(table);
            }
        }
        for required in &self.requires {
            required.collect_into(seen, out);
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        let name = name.to_lowercase();
        self.iter().find(|table| table.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.iter().map(|table| table.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeprecatedActions, ValueType};

    fn table(name: &str, columns: &[&str]) -> Table {
        columns.iter().fold(Table::new(name), |table, column| {
            table.with_column(column, ColumnDefinition::new(ValueType::String))
        })
    }

    #[test]
    fn duplicate_names_replace_in_place() {
        let mut catalog = Catalog::new()
            .with_table(table("users", &["id"]))
            .with_table(table("posts", &["id"]));
        catalog.insert(table("Users", &["id", "email"]));

        assert_eq!(catalog.table_names(), vec!["users", "posts"]);
        assert_eq!(catalog.table("users").map(|t| t.columns.len()), Some(2));
    }

    #[test]
    fn required_catalogs_follow_own_tables() {
        let mut base = Catalog::new()
            .with_table(table("accounts", &["id"]))
            .with_table(table("users", &["legacy"]));
        base.require(Catalog::new().with_table(table("audit", &["id"])));

        let mut catalog = Catalog::new().with_table(table("users", &["id"]));
        catalog.require(base);

        assert_eq!(catalog.table_names(), vec!["users", "accounts", "audit"]);
        let users = catalog.table("users").expect("users");
        assert!(users.column("legacy").is_none());
    }

    #[test]
    fn rename_keeps_position_and_replaces_stale_column() {
        let mut users = table("users", &["id", "name", "real_name"]);
        assert!(users.rename_column("name", "real_name"));

        let names: Vec<&str> = users.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "real_name"]);
        assert!(!users.rename_column("missing", "other"));
    }

    #[test]
    fn parses_toml_declaration() {
        let source = r#"
            [[tables]]
            name = "Users"

            [[tables.columns]]
            name = "ID"
            type = "int64"
            auto_increment = true

            [[tables.columns]]
            name = "name"
            type = "string"
            length = 255
            deprecated = { rename_to = "Real_Name" }

            [[tables.columns]]
            name = "real_name"
            type = "string"
            length = 255

            [[tables.keys]]
            name = "users_pkey"
            primary = true
            unique = true
            parts = [{ column = "id" }]
        "#;

        let catalog = Catalog::from_toml_str(source).expect("parse catalog");
        let users = catalog.table("users").expect("users table");
        let id = users.column("id").expect("id column");
        assert_eq!(id.field_name, "ID");
        assert_eq!(id.table, "users");
        assert!(id.definition.auto_increment);
        assert_eq!(
            users.column("name").and_then(|c| c.definition.rename_target()),
            Some("real_name")
        );
        assert_eq!(users.primary_key().map(|k| k.table.as_str()), Some("users"));
    }

    #[test]
    fn empty_rename_target_means_drop() {
        let source = r#"
            [[tables]]
            name = "users"

            [[tables.columns]]
            name = "legacy"
            type = "string"
            deprecated = { rename_to = "" }
        "#;

        let catalog = Catalog::from_toml_str(source).expect("parse catalog");
        let legacy = catalog
            .table("users")
            .and_then(|users| users.column("legacy"))
            .expect("legacy column");
        assert!(legacy.definition.is_deprecated());
        assert_eq!(legacy.definition.deprecated, Some(DeprecatedActions::default()));
        assert_eq!(legacy.definition.rename_target(), None);

        let built = ColumnDefinition::new(ValueType::String).rename_to("");
        assert_eq!(built.rename_target(), None);
    }
}
