use schemist_core::{Column, ColumnDefinition, Key, TEMP_COLUMN_PREFIX, Table, ValueType};

use crate::dialect::{Dialect, quote_ident};
use crate::fragment::Fragment;

/// SQLite DDL renderer.
///
/// SQLite cannot change a column type in place, so type changes go through a
/// temporary column: rename, add, copy, drop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    fn column_sql(&self, column: &Column, inline_primary: bool) -> String {
        let definition = &column.definition;
        let mut sql = format!(
            "{} {}",
            quote_ident(&column.name),
            self.data_type(definition)
        );
        if inline_primary {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
            return sql;
        }
        // ADD COLUMN rejects NOT NULL without a default.
        if !definition.nullable && definition.default.is_some() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &definition.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    fn key_columns(key: &Key) -> String {
        key.parts
            .iter()
            .map(|part| match part.options.as_deref() {
                Some(options) if !options.is_empty() => {
                    format!("{} {}", quote_ident(&part.column), options)
                }
                _ => quote_ident(&part.column),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Single auto-increment column covered by the primary key, if any.
    fn inline_primary(table: &Table) -> Option<&str> {
        let primary = table.primary_key()?;
        let mut columns = primary.columns();
        let column = columns.next()?;
        if columns.next().is_some() {
            return None;
        }
        table
            .column(column)
            .filter(|item| item.definition.auto_increment)
            .map(|item| item.name.as_str())
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn create_table(&self, table: &Table) -> Fragment {
        let inline = Self::inline_primary(table);
        let mut body: Vec<String> = table
            .columns
            .iter()
            .filter(|column| !column.definition.is_deprecated())
            .map(|column| self.column_sql(column, inline == Some(column.name.as_str())))
            .collect();
        if let Some(primary) = table.primary_key().filter(|_| inline.is_none()) {
            body.push(format!("PRIMARY KEY ({})", Self::key_columns(primary)));
        }
        Fragment::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&table.name),
            body.join(", ")
        ))
    }

    fn drop_table(&self, table: &Table) -> Fragment {
        Fragment::new(format!("DROP TABLE IF EXISTS {}", quote_ident(&table.name)))
    }

    fn truncate_table(&self, table: &Table) -> Fragment {
        Fragment::new(format!("DELETE FROM {}", quote_ident(&table.name)))
    }

    fn add_column(&self, column: &Column) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(&column.table),
            self.column_sql(column, false)
        ))
    }

    fn drop_column(&self, column: &Column) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(&column.table),
            quote_ident(&column.name)
        ))
    }

    fn rename_column(&self, column: &Column, to: &str) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_ident(&column.table),
            quote_ident(&column.name),
            quote_ident(to)
        ))
    }

    fn modify_column(&self, column: &Column, prev: &Column) -> Vec<Fragment> {
        let data_type = self.data_type(&column.definition);
        if data_type.eq_ignore_ascii_case(&self.data_type(&prev.definition)) {
            return Vec::new();
        }

        let temporary = prev.renamed(&format!("{TEMP_COLUMN_PREFIX}{}", column.name));
        let table = quote_ident(&column.table);
        vec![
            self.rename_column(prev, &temporary.name),
            self.add_column(column),
            Fragment::new(format!(
                "UPDATE {table} SET {} = CAST({} AS {data_type})",
                quote_ident(&column.name),
                quote_ident(&temporary.name)
            )),
            self.drop_column(&temporary),
        ]
    }

    fn add_index(&self, key: &Key) -> Option<Fragment> {
        if key.primary {
            return None;
        }
        let unique = if key.unique { "UNIQUE " } else { "" };
        Some(Fragment::new(format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&key.name),
            quote_ident(&key.table),
            Self::key_columns(key)
        )))
    }

    fn drop_index(&self, key: &Key) -> Option<Fragment> {
        if key.primary {
            return None;
        }
        Some(Fragment::new(format!(
            "DROP INDEX IF EXISTS {}",
            quote_ident(&key.name)
        )))
    }

    fn data_type(&self, definition: &ColumnDefinition) -> String {
        if let Some(data_type) = &definition.data_type {
            return data_type.clone();
        }
        match definition.value_type {
            ValueType::Bool => "BOOLEAN".to_string(),
            ValueType::Int16 => "SMALLINT".to_string(),
            ValueType::Int32 => "INT".to_string(),
            ValueType::Int64 => "INTEGER".to_string(),
            ValueType::Float32 | ValueType::Float64 => "REAL".to_string(),
            ValueType::Decimal => "NUMERIC".to_string(),
            ValueType::String => match definition.length {
                Some(length) => format!("VARCHAR({length})"),
                None => "TEXT".to_string(),
            },
            ValueType::Bytes => "BLOB".to_string(),
            ValueType::Date => "DATE".to_string(),
            ValueType::Timestamp => "DATETIME".to_string(),
            ValueType::Json | ValueType::Uuid => "TEXT".to_string(),
        }
    }
}
