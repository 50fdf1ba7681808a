use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::schema::{Catalog, Table};

/// Validate internal consistency of a declared catalog.
///
/// This checks:
/// - duplicate tables/columns/keys
/// - key columns exist and keys are not empty
/// - at most one primary key per table
/// - rename targets exist and are live columns
/// - no column uses the reserved temporary prefix
pub fn validate_catalog(catalog: &Catalog) -> Result<()> {
    let mut tables = BTreeSet::new();
    for table in catalog.iter() {
        if !tables.insert(table.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }
        validate_table(table)?;
    }
    Ok(())
}

/// Validate a single declared table.
pub fn validate_table(table: &Table) -> Result<()> {
    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if !columns.insert(column.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name: {}.{}",
                table.name, column.name
            )));
        }
        if column.is_temporary() {
            return Err(Error::InvalidSchema(format!(
                "column name uses the reserved temporary prefix: {}.{}",
                table.name, column.name
            )));
        }
    }

    for column in &table.columns {
        let Some(target) = column.definition.rename_target() else {
            continue;
        };
        match table.column(target) {
            None => {
                return Err(Error::InvalidSchema(format!(
                    "rename target not found: {}.{} -> {}",
                    table.name, column.name, target
                )));
            }
            Some(successor) if successor.definition.is_deprecated() => {
                return Err(Error::InvalidSchema(format!(
                    "rename target is itself deprecated: {}.{} -> {}",
                    table.name, column.name, target
                )));
            }
            Some(_) => {}
        }
    }

    let mut keys = BTreeSet::new();
    let mut primary = 0;
    for key in &table.keys {
        if !keys.insert(key.name.as_str()) {
            return Err(Error::InvalidSchema(format!(
                "duplicate key name: {}.{}",
                table.name, key.name
            )));
        }
        if key.parts.is_empty() {
            return Err(Error::InvalidSchema(format!(
                "key has no columns: {}.{}",
                table.name, key.name
            )));
        }
        if key.primary {
            primary += 1;
        }
        for column in key.columns() {
            let live = table
                .column(column)
                .is_some_and(|item| !item.definition.is_deprecated());
            if !live {
                return Err(Error::InvalidSchema(format!(
                    "key column not found: {}.{}.{}",
                    table.name, key.name, column
                )));
            }
        }
    }

    if primary > 1 {
        return Err(Error::InvalidSchema(format!(
            "more than one primary key: {}",
            table.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::Key;
    use crate::schema::{Column, TEMP_COLUMN_PREFIX};
    use crate::types::{ColumnDefinition, ValueType};

    fn users() -> Table {
        Table::new("users")
            .with_column("id", ColumnDefinition::new(ValueType::Int64).auto_increment())
            .with_column("name", ColumnDefinition::new(ValueType::String))
            .with_key(Key::primary("users_pkey", &["id"]))
    }

    #[test]
    fn accepts_well_formed_catalog() {
        let catalog = Catalog::new().with_table(users());
        assert!(validate_catalog(&catalog).is_ok());
    }

    #[test]
    fn rejects_missing_rename_target() {
        let table = users().with_column(
            "nick",
            ColumnDefinition::new(ValueType::String).rename_to("nickname"),
        );
        let err = validate_table(&table).unwrap_err();
        assert!(err.to_string().contains("rename target not found"));
    }

    #[test]
    fn rejects_key_on_deprecated_column() {
        let table = users()
            .with_column("legacy", ColumnDefinition::new(ValueType::String).drop_deprecated())
            .with_key(Key::index("users_legacy_idx", &["legacy"]));
        let err = validate_table(&table).unwrap_err();
        assert!(err.to_string().contains("key column not found"));
    }

    #[test]
    fn rejects_second_primary_key() {
        let table = users().with_key(Key::primary("primary", &["name"]));
        assert!(validate_table(&table).is_err());
    }

    #[test]
    fn rejects_reserved_prefix() {
        let mut table = users();
        table.push_column(Column::new(
            "users",
            &format!("{TEMP_COLUMN_PREFIX}name"),
            ColumnDefinition::new(ValueType::String),
        ));
        assert!(validate_table(&table).is_err());
    }
}
