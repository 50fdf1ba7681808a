use schemist_core::{Column, ColumnDefinition, Key, KeyPart, Table, ValueType};

use crate::options::IntrospectOptions;

use super::queries::{RawColumn, RawIndex};

pub fn filter_tables(raw: Vec<String>, opts: &IntrospectOptions) -> Vec<String> {
    raw.into_iter()
        .filter(|table| opts.includes_table(table))
        .collect()
}

pub fn map_columns(table: &str, mut raw: Vec<RawColumn>) -> Vec<Column> {
    raw.sort_by_key(|col| col.ordinal_position);
    raw.into_iter()
        .map(|col| {
            let auto_increment = col.is_identity
                || col
                    .default
                    .as_deref()
                    .is_some_and(|default| default.starts_with("nextval("));

            let numeric = col.udt_name == "numeric";

            let mut definition = ColumnDefinition::new(value_type_from_udt(&col.udt_name))
                .data_type(col.data_type);
            definition.nullable = col.is_nullable;
            definition.length = col
                .character_max_length
                .or(col.numeric_precision.filter(|_| numeric))
                .and_then(|value| u32::try_from(value).ok());
            definition.decimal = col
                .numeric_scale
                .filter(|_| numeric)
                .and_then(|value| u32::try_from(value).ok());
            definition.auto_increment = auto_increment;
            if !auto_increment {
                definition.default = col.default;
            }

            Column::new(table, &col.name, definition)
        })
        .collect()
}

pub fn map_indexes(raw: Vec<RawIndex>) -> Vec<Key> {
    raw.into_iter()
        .map(|idx| {
            let parts = idx
                .columns
                .iter()
                .zip(idx.options.iter().map(Some).chain(std::iter::repeat(None)))
                .map(|(column, options)| {
                    let part = KeyPart::new(column.as_str());
                    match options.filter(|options| !options.is_empty()) {
                        Some(options) => part.with_options(options.as_str()),
                        None => part,
                    }
                })
                .collect();

            Key {
                name: idx.name.to_lowercase(),
                unique: idx.is_unique,
                primary: idx.is_primary,
                method: Some(idx.method),
                parts,
                table: String::new(),
            }
        })
        .collect()
}

pub fn assemble_table(name: &str, columns: Vec<Column>, keys: Vec<Key>) -> Table {
    let mut table = Table::new(name);
    for column in columns {
        table.push_column(column);
    }
    for key in keys {
        table.push_key(key);
    }
    table
}

/// Best-effort application type for an introspected column; comparisons use
/// the rendered `data_type` instead.
pub fn value_type_from_udt(udt_name: &str) -> ValueType {
    match udt_name {
        "bool" => ValueType::Bool,
        "int2" => ValueType::Int16,
        "int4" => ValueType::Int32,
        "int8" => ValueType::Int64,
        "float4" => ValueType::Float32,
        "float8" => ValueType::Float64,
        "numeric" => ValueType::Decimal,
        "bytea" => ValueType::Bytes,
        "date" => ValueType::Date,
        "timestamp" | "timestamptz" => ValueType::Timestamp,
        "json" | "jsonb" => ValueType::Json,
        "uuid" => ValueType::Uuid,
        _ => ValueType::String,
    }
}
