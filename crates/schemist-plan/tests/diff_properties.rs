use schemist_core::{
    Catalog, Column, ColumnDefinition, Key, TEMP_COLUMN_PREFIX, Table, ValueType, validate_catalog,
};
use schemist_dialect::{Dialect, PostgresDialect, SqliteDialect};
use schemist_plan::{ActionKind, TablePlan, diff};

fn dialects() -> Vec<Box<dyn Dialect>> {
    vec![Box::new(PostgresDialect::new()), Box::new(SqliteDialect)]
}

fn orders() -> Table {
    Table::new("orders")
        .with_column("id", ColumnDefinition::new(ValueType::Int64).auto_increment())
        .with_column("customer_id", ColumnDefinition::new(ValueType::Int64))
        .with_column("status", ColumnDefinition::new(ValueType::String).length(32))
        .with_column("total", ColumnDefinition::new(ValueType::Decimal).precision(12, 2))
        .with_column("note", ColumnDefinition::new(ValueType::String).nullable())
        .with_column("placed_at", ColumnDefinition::new(ValueType::Timestamp))
        .with_key(Key::primary("orders_pkey", &["id"]))
        .with_key(Key::index("orders_customer_idx", &["customer_id", "placed_at"]))
        .with_key(Key::index("orders_status_idx", &["status"]))
        .with_key(Key::unique("orders_note_key", &["note"]))
}

fn kinds(plan: &TablePlan) -> Vec<ActionKind> {
    plan.actions.iter().map(|action| action.kind).collect()
}

fn count(plan: &TablePlan, kind: ActionKind, name: &str) -> usize {
    plan.actions
        .iter()
        .filter(|action| action.kind == kind && action.name == name)
        .count()
}

#[test]
fn diffing_a_table_with_itself_is_empty() {
    for dialect in dialects() {
        let table = orders();
        let plan = diff(dialect.as_ref(), Some(&table), &table).expect("diff");
        assert!(plan.is_empty(), "{}: {:?}", dialect.name(), plan.actions);
    }
}

#[test]
fn absent_table_is_created_then_indexed() {
    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), None, &orders()).expect("diff");

        assert!(plan.created);
        assert!(plan.snapshot.is_none());
        assert_eq!(
            kinds(&plan),
            vec![
                ActionKind::CreateTable,
                ActionKind::AddIndex,
                ActionKind::AddIndex,
                ActionKind::AddIndex
            ]
        );
        let indexes: Vec<&str> = plan.actions[1..]
            .iter()
            .map(|action| action.name.as_str())
            .collect();
        assert_eq!(
            indexes,
            vec!["orders_customer_idx", "orders_status_idx", "orders_note_key"]
        );
    }
}

#[test]
fn actions_follow_kind_order() {
    let current = orders()
        .with_column("legacy", ColumnDefinition::new(ValueType::String))
        .with_column("ref", ColumnDefinition::new(ValueType::String))
        .with_key(Key::index("orders_legacy_idx", &["legacy"]));
    let target = orders()
        .with_column("legacy", ColumnDefinition::new(ValueType::String).drop_deprecated())
        .with_column("ref", ColumnDefinition::new(ValueType::String).rename_to("reference"))
        .with_column("reference", ColumnDefinition::new(ValueType::String))
        .with_column("channel", ColumnDefinition::new(ValueType::String).nullable())
        .with_column("status", ColumnDefinition::new(ValueType::String).length(64))
        .with_key(Key::index("orders_channel_idx", &["channel"]));

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&current), &target).expect("diff");
        let observed = kinds(&plan);

        let mut sorted = observed.clone();
        sorted.sort();
        assert_eq!(observed, sorted, "{}", dialect.name());
        for kind in [
            ActionKind::DropIndex,
            ActionKind::DropColumn,
            ActionKind::RenameColumn,
            ActionKind::ModifyColumn,
            ActionKind::AddColumn,
            ActionKind::AddIndex,
        ] {
            assert!(observed.contains(&kind), "{}: missing {kind}", dialect.name());
        }
    }
}

#[test]
fn rename_is_a_single_rename_action() {
    let current = orders().with_column("ref", ColumnDefinition::new(ValueType::String));
    let target = orders()
        .with_column("ref", ColumnDefinition::new(ValueType::String).rename_to("reference"))
        .with_column("reference", ColumnDefinition::new(ValueType::String));

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&current), &target).expect("diff");
        assert_eq!(kinds(&plan), vec![ActionKind::RenameColumn]);
        assert_eq!(plan.actions[0].name, "ref");
        assert!(plan.actions[0].fragments[0].sql.contains("\"reference\""));
        for name in ["ref", "reference"] {
            assert_eq!(count(&plan, ActionKind::DropColumn, name), 0);
            assert_eq!(count(&plan, ActionKind::AddColumn, name), 0);
        }
    }
}

#[test]
fn stale_rename_target_is_dropped_before_rename() {
    let current = orders()
        .with_column("ref", ColumnDefinition::new(ValueType::String))
        .with_column("reference", ColumnDefinition::new(ValueType::String));
    let target = orders()
        .with_column("ref", ColumnDefinition::new(ValueType::String).rename_to("reference"))
        .with_column("reference", ColumnDefinition::new(ValueType::String));

    let plan = diff(&PostgresDialect::new(), Some(&current), &target).expect("diff");
    let order: Vec<(ActionKind, &str)> = plan
        .actions
        .iter()
        .map(|action| (action.kind, action.name.as_str()))
        .collect();
    assert_eq!(
        order,
        vec![
            (ActionKind::DropColumn, "reference"),
            (ActionKind::RenameColumn, "ref")
        ]
    );
}

#[test]
fn dropping_an_indexed_column_drops_its_index() {
    let target = {
        let mut table = orders();
        table.keys.retain(|key| key.name != "orders_note_key");
        table.push_column(Column::new(
            "orders",
            "note",
            ColumnDefinition::new(ValueType::String).drop_deprecated(),
        ));
        table
    };

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&orders()), &target).expect("diff");
        assert_eq!(count(&plan, ActionKind::DropIndex, "orders_note_key"), 1);
        assert_eq!(count(&plan, ActionKind::AddIndex, "orders_note_key"), 0);
        assert_eq!(count(&plan, ActionKind::DropColumn, "note"), 1);
    }
}

#[test]
fn index_rebuild_is_emitted_once() {
    // customer_id changes type and the index gains a column.
    let mut target = orders().with_column("customer_id", ColumnDefinition::new(ValueType::Int32));
    target.push_key(Key::index(
        "orders_customer_idx",
        &["customer_id", "placed_at", "status"],
    ));

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&orders()), &target).expect("diff");
        assert_eq!(count(&plan, ActionKind::DropIndex, "orders_customer_idx"), 1);
        assert_eq!(count(&plan, ActionKind::AddIndex, "orders_customer_idx"), 1);
        assert_eq!(count(&plan, ActionKind::ModifyColumn, "customer_id"), 1);
        assert_eq!(plan.actions.len(), 3, "{}", dialect.name());
    }
}

#[test]
fn sqlite_type_change_copies_through_temporary_column() {
    let target = orders().with_column("status", ColumnDefinition::new(ValueType::Int16));
    let plan = diff(&SqliteDialect, Some(&orders()), &target).expect("diff");

    let modify = plan
        .actions
        .iter()
        .find(|action| action.kind == ActionKind::ModifyColumn)
        .expect("modify action");
    let statements: Vec<&str> = modify
        .fragments
        .iter()
        .map(|fragment| fragment.sql.as_str())
        .collect();
    assert_eq!(
        statements,
        vec![
            r#"ALTER TABLE "orders" RENAME COLUMN "status" TO "__schemist_tmp_status""#,
            r#"ALTER TABLE "orders" ADD COLUMN "status" SMALLINT"#,
            r#"UPDATE "orders" SET "status" = CAST("__schemist_tmp_status" AS SMALLINT)"#,
            r#"ALTER TABLE "orders" DROP COLUMN "__schemist_tmp_status""#,
        ]
    );
    assert_eq!(count(&plan, ActionKind::DropIndex, "orders_status_idx"), 1);
    assert_eq!(count(&plan, ActionKind::AddIndex, "orders_status_idx"), 1);
}

#[test]
fn leftover_temporary_columns_are_collected() {
    let mut current = orders();
    current.push_column(Column::new(
        "orders",
        &format!("{TEMP_COLUMN_PREFIX}status"),
        ColumnDefinition::new(ValueType::String).data_type("VARCHAR(32)"),
    ));

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&current), &orders()).expect("diff");
        assert_eq!(kinds(&plan), vec![ActionKind::DropColumn]);
        assert_eq!(plan.actions[0].name, "__schemist_tmp_status");
    }
}

#[test]
fn type_comparison_ignores_case() {
    let current = orders().with_column(
        "status",
        ColumnDefinition::new(ValueType::String).data_type("CHARACTER VARYING(32)"),
    );
    let plan = diff(&PostgresDialect::new(), Some(&current), &orders()).expect("diff");
    assert!(plan.is_empty());
}

#[test]
fn removed_index_is_dropped() {
    let mut target = orders();
    target.keys.retain(|key| key.name != "orders_status_idx");

    let plan = diff(&PostgresDialect::new(), Some(&orders()), &target).expect("diff");
    assert_eq!(kinds(&plan), vec![ActionKind::DropIndex]);
    assert_eq!(
        plan.actions[0].fragments[0].sql,
        r#"DROP INDEX IF EXISTS "orders_status_idx""#
    );
}

#[test]
fn empty_rename_target_drops_the_column() {
    let source = r#"
        [[tables]]
        name = "users"

        [[tables.columns]]
        name = "id"
        type = "int64"

        [[tables.columns]]
        name = "legacy"
        type = "string"
        deprecated = { rename_to = "" }
    "#;
    let declared = Catalog::from_toml_str(source).expect("parse catalog");
    validate_catalog(&declared).expect("valid catalog");
    let target = declared.table("users").expect("users");

    let current = Table::new("users")
        .with_column("id", ColumnDefinition::new(ValueType::Int64))
        .with_column("legacy", ColumnDefinition::new(ValueType::String));

    for dialect in dialects() {
        let plan = diff(dialect.as_ref(), Some(&current), target).expect("diff");
        let order: Vec<(ActionKind, &str)> = plan
            .actions
            .iter()
            .map(|action| (action.kind, action.name.as_str()))
            .collect();
        assert_eq!(order, vec![(ActionKind::DropColumn, "legacy")], "{}", dialect.name());
    }
}
