use schemist_core::{Catalog, ColumnDefinition, Key, Table, ValueType};
use schemist_dialect::{PostgresDialect, SqliteDialect};
use schemist_plan::plan_catalog;

fn main() {
    let live = Catalog::new().with_table(
        Table::new("users")
            .with_column("id", ColumnDefinition::new(ValueType::Int64).auto_increment())
            .with_column("name", ColumnDefinition::new(ValueType::String))
            .with_column("age", ColumnDefinition::new(ValueType::Int32))
            .with_key(Key::primary("users_pkey", &["id"]))
            .with_key(Key::index("users_age_idx", &["age"])),
    );
    let target = Catalog::new().with_table(
        Table::new("users")
            .with_column("id", ColumnDefinition::new(ValueType::Int64).auto_increment())
            .with_column("name", ColumnDefinition::new(ValueType::String).rename_to("full_name"))
            .with_column("full_name", ColumnDefinition::new(ValueType::String))
            .with_column("age", ColumnDefinition::new(ValueType::Int64))
            .with_key(Key::primary("users_pkey", &["id"]))
            .with_key(Key::index("users_age_idx", &["age"])),
    );

    let postgres = plan_catalog(&PostgresDialect::new(), &live, &target).expect("postgres plan");
    let sqlite = plan_catalog(&SqliteDialect, &live, &target).expect("sqlite plan");

    println!("-- postgres");
    for statement in postgres.statements() {
        println!("{statement}");
    }
    println!("-- sqlite");
    for statement in sqlite.statements() {
        println!("{statement}");
    }
}
