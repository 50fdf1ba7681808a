use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schemist_core::{Catalog, ColumnDefinition, Error, Key, Result, Table, ValueType};
use schemist_dialect::{Dialect, Fragment, PostgresDialect};
use schemist_introspect::{Adapter, Transaction};
use schemist_migrate::{migrate, migrate_to_writer, write_statements};
use schemist_plan::{CatalogPlan, plan_catalog};

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, entry: String) {
    if let Ok(mut entries) = log.lock() {
        entries.push(entry);
    }
}

/// Adapter that serves a fixed catalog and records what it is asked to run.
struct RecordingAdapter {
    current: Catalog,
    dialect: PostgresDialect,
    fail_on: Option<&'static str>,
    log: Log,
}

impl RecordingAdapter {
    fn new(current: Catalog) -> Self {
        Self {
            current,
            dialect: PostgresDialect::new(),
            fail_on: None,
            log: Arc::default(),
        }
    }

    fn failing_on(mut self, needle: &'static str) -> Self {
        self.fail_on = Some(needle);
        self
    }

    fn entries(&self) -> Vec<String> {
        self.log.lock().map(|entries| entries.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Adapter for RecordingAdapter {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn catalog(&self) -> Result<Catalog> {
        record(&self.log, "catalog".to_string());
        Ok(self.current.clone())
    }

    async fn exec(&self, fragment: &Fragment) -> Result<u64> {
        record(&self.log, format!("autocommit {}", fragment.sql));
        Ok(0)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        record(&self.log, "begin".to_string());
        Ok(Box::new(RecordingTransaction {
            fail_on: self.fail_on,
            log: Arc::clone(&self.log),
        }))
    }
}

struct RecordingTransaction {
    fail_on: Option<&'static str>,
    log: Log,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn exec(&mut self, fragment: &Fragment) -> Result<u64> {
        if self.fail_on.is_some_and(|needle| fragment.sql.contains(needle)) {
            record(&self.log, format!("failed {}", fragment.sql));
            return Err(Error::Db("relation already exists".to_string()));
        }
        record(&self.log, format!("exec {}", fragment.sql));
        Ok(0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        record(&self.log, "commit".to_string());
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        record(&self.log, "rollback".to_string());
        Ok(())
    }
}

fn users() -> Table {
    Table::new("users")
        .with_column("id", ColumnDefinition::new(ValueType::Int64).auto_increment())
        .with_column("email", ColumnDefinition::new(ValueType::String).length(255))
        .with_key(Key::primary("users_pkey", &["id"]))
        .with_key(Key::unique("users_email_key", &["email"]))
}

#[tokio::test]
async fn up_to_date_database_opens_no_transaction() {
    let target = Catalog::new().with_table(users());
    let adapter = RecordingAdapter::new(target.clone());

    let report = migrate(&adapter, &target).await.expect("migrate");

    assert!(report.is_noop());
    assert!(!report.applied);
    assert_eq!(adapter.entries(), vec!["catalog"]);
}

#[tokio::test]
async fn statements_run_in_order_then_commit() {
    let adapter = RecordingAdapter::new(Catalog::new());
    let target = Catalog::new().with_table(users());

    let report = migrate(&adapter, &target).await.expect("migrate");

    assert!(report.applied);
    assert_eq!(report.actions, 2);
    assert_eq!(report.statements, 2);

    let entries = adapter.entries();
    assert_eq!(entries.len(), 5, "{entries:?}");
    assert_eq!(entries[0], "catalog");
    assert_eq!(entries[1], "begin");
    assert!(entries[2].starts_with("exec CREATE TABLE IF NOT EXISTS \"users\""));
    assert!(entries[3].starts_with("exec CREATE UNIQUE INDEX IF NOT EXISTS \"users_email_key\""));
    assert_eq!(entries[4], "commit");
}

#[tokio::test]
async fn first_failure_rolls_back_everything() {
    let adapter = RecordingAdapter::new(Catalog::new()).failing_on("CREATE UNIQUE INDEX");
    let target = Catalog::new().with_table(users());

    let err = migrate(&adapter, &target).await.expect_err("must fail");
    match err {
        Error::Execution { statement, message } => {
            assert!(statement.contains("users_email_key"));
            assert!(message.contains("relation already exists"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let entries = adapter.entries();
    assert_eq!(entries.last().map(String::as_str), Some("rollback"));
    assert!(!entries.iter().any(|entry| entry == "commit"));
}

#[tokio::test]
async fn dry_run_writes_one_statement_per_line() {
    let current = Catalog::new().with_table(
        users().with_column("nickname", ColumnDefinition::new(ValueType::String)),
    );
    let target = Catalog::new().with_table(users().with_column(
        "nickname",
        ColumnDefinition::new(ValueType::String).drop_deprecated(),
    ));
    let adapter = RecordingAdapter::new(current);

    let mut out = Vec::new();
    let report = migrate_to_writer(&adapter, &target, &mut out)
        .await
        .expect("render");

    let script = String::from_utf8(out).expect("utf8");
    assert_eq!(
        script,
        "ALTER TABLE \"users\" DROP COLUMN \"nickname\";\n"
    );
    assert_eq!(report.statements, 1);
    assert!(!report.applied);
    assert_eq!(adapter.entries(), vec!["catalog"]);
}

#[tokio::test]
async fn invalid_target_is_rejected_before_reading_the_database() {
    let target = Catalog::new().with_table(users().with_column(
        "handle",
        ColumnDefinition::new(ValueType::String).rename_to("missing"),
    ));
    let adapter = RecordingAdapter::new(Catalog::new());

    let err = migrate(&adapter, &target).await.expect_err("must fail");

    assert!(matches!(err, Error::InvalidSchema(_)));
    assert!(adapter.entries().is_empty());
}

#[test]
fn statements_are_written_in_plan_order() {
    let dialect = PostgresDialect::new();
    let plan = plan_catalog(&dialect, &Catalog::new(), &Catalog::new().with_table(users()))
        .expect("plan");

    let mut out = Vec::new();
    let report = write_statements(&plan, &mut out).expect("write");

    let script = String::from_utf8(out).expect("utf8");
    let lines: Vec<String> = script.lines().map(str::to_string).collect();
    assert_eq!(lines, plan.statements());
    assert_eq!(report.statements, 2);
    assert!(lines.iter().all(|line| line.ends_with(';')));

    let mut empty = Vec::new();
    let report = write_statements(&CatalogPlan::default(), &mut empty).expect("write");
    assert!(report.is_noop());
    assert!(empty.is_empty());
}

