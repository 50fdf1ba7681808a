use schemist_core::{Column, ColumnDefinition, Key, Table, ValueType};

use crate::dialect::{Dialect, quote_ident};
use crate::fragment::Fragment;

/// PostgreSQL DDL renderer.
///
/// Storage types follow `format_type()` so declared columns compare equal to
/// introspected ones. With a schema set, table and index names are qualified
/// so statements never depend on `search_path`.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect {
    schema: Option<String>,
}

impl PostgresDialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    fn qualify(&self, name: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(name)),
            None => quote_ident(name),
        }
    }

    fn column_sql(&self, column: &Column) -> String {
        let definition = &column.definition;
        let mut sql = format!(
            "{} {}",
            quote_ident(&column.name),
            self.data_type(definition)
        );
        if definition.auto_increment {
            sql.push_str(" GENERATED BY DEFAULT AS IDENTITY");
        }
        if !definition.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = definition.default.as_deref().filter(|_| !definition.auto_increment)
        {
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
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn create_table(&self, table: &Table) -> Fragment {
        let mut body: Vec<String> = table
            .columns
            .iter()
            .filter(|column| !column.definition.is_deprecated())
            .map(|column| self.column_sql(column))
            .collect();
        if let Some(primary) = table.primary_key() {
            body.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                quote_ident(&primary.name),
                Self::key_columns(primary)
            ));
        }
        Fragment::new(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.qualify(&table.name),
            body.join(", ")
        ))
    }

    fn drop_table(&self, table: &Table) -> Fragment {
        Fragment::new(format!("DROP TABLE IF EXISTS {}", self.qualify(&table.name)))
    }

    fn truncate_table(&self, table: &Table) -> Fragment {
        Fragment::new(format!("TRUNCATE TABLE {}", self.qualify(&table.name)))
    }

    fn add_column(&self, column: &Column) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.qualify(&column.table),
            self.column_sql(column)
        ))
    }

    fn drop_column(&self, column: &Column) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.qualify(&column.table),
            quote_ident(&column.name)
        ))
    }

    fn rename_column(&self, column: &Column, to: &str) -> Fragment {
        Fragment::new(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.qualify(&column.table),
            quote_ident(&column.name),
            quote_ident(to)
        ))
    }

    fn modify_column(&self, column: &Column, prev: &Column) -> Vec<Fragment> {
        let data_type = self.data_type(&column.definition);
        if data_type.eq_ignore_ascii_case(&self.data_type(&prev.definition)) {
            return Vec::new();
        }
        let name = quote_ident(&column.name);
        vec![Fragment::new(format!(
            "ALTER TABLE {} ALTER COLUMN {name} TYPE {data_type} USING {name}::{data_type}",
            self.qualify(&column.table),
        ))]
    }

    fn add_index(&self, key: &Key) -> Option<Fragment> {
        if key.primary {
            return None;
        }
        let unique = if key.unique { "UNIQUE " } else { "" };
        let method = key
            .method
            .as_deref()
            .map(|method| format!(" USING {method}"))
            .unwrap_or_default();
        Some(Fragment::new(format!(
            "CREATE {unique}INDEX IF NOT EXISTS {} ON {}{method} ({})",
            quote_ident(&key.name),
            self.qualify(&key.table),
            Self::key_columns(key)
        )))
    }

    fn drop_index(&self, key: &Key) -> Option<Fragment> {
        if key.primary {
            return None;
        }
        Some(Fragment::new(format!(
            "DROP INDEX IF EXISTS {}",
            self.qualify(&key.name)
        )))
    }

    fn data_type(&self, definition: &ColumnDefinition) -> String {
        if let Some(data_type) = &definition.data_type {
            return data_type.clone();
        }
        match definition.value_type {
            ValueType::Bool => "boolean".to_string(),
            ValueType::Int16 => "smallint".to_string(),
            ValueType::Int32 => "integer".to_string(),
            ValueType::Int64 => "bigint".to_string(),
            ValueType::Float32 => "real".to_string(),
            ValueType::Float64 => "double precision".to_string(),
            ValueType::Decimal => match (definition.length, definition.decimal) {
                (Some(precision), Some(scale)) => format!("numeric({precision},{scale})"),
                (Some(precision), None) => format!("numeric({precision})"),
                _ => "numeric".to_string(),
            },
            ValueType::String => match definition.length {
                Some(length) => format!("character varying({length})"),
                None => "text".to_string(),
            },
            ValueType::Bytes => "bytea".to_string(),
            ValueType::Date => "date".to_string(),
            ValueType::Timestamp => "timestamp with time zone".to_string(),
            ValueType::Json => "jsonb".to_string(),
            ValueType::Uuid => "uuid".to_string(),
        }
    }
}
