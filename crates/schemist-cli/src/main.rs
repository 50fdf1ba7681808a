mod registry;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use registry::{RunContext, RunOptions, RunPaths, init_run_logging, start_run, write_plan};
use schemist_core::{Catalog, Error as CoreError, redact_connection_string};
use schemist_introspect::{IntrospectOptions, PostgresAdapter};
use schemist_migrate::{MigrationReport, apply, plan_against, write_statements};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
}

#[derive(Parser, Debug)]
#[command(name = "schemist", version, about = "Declarative schema migrations")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the statements that would bring the database up to date.
    Plan(RunArgs),
    /// Apply the planned statements in a single transaction.
    Migrate(MigrateArgs),
    /// Print the JSON Schema of the catalog file format.
    JsonSchema(JsonSchemaArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Database connection string (flag form).
    #[arg(long, value_name = "CONNECTION_STRING", conflicts_with = "conn_pos")]
    conn: Option<String>,
    /// Database connection string (positional form).
    #[arg(value_name = "CONNECTION_STRING", required_unless_present = "conn")]
    conn_pos: Option<String>,
    /// Target catalog file (.toml or .json).
    #[arg(long, value_name = "FILE")]
    schema: PathBuf,
    /// Database namespace holding the managed tables.
    #[arg(long, default_value = "public")]
    pg_schema: String,
    /// Restrict the run to these tables.
    #[arg(long = "table", value_name = "TABLE")]
    tables: Vec<String>,
    /// Output directory for runs.
    #[arg(long, default_value = "runs")]
    run_dir: PathBuf,
    /// Optional extra path for plan.sql.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Render the plan without executing it.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Args, Debug)]
struct JsonSchemaArgs {
    /// Write to this path instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan(args) => run("plan", args, true).await,
        Command::Migrate(args) => run("migrate", args.run, args.dry_run).await,
        Command::JsonSchema(args) => write_json_schema(args.out.as_deref()),
    }
}

async fn run(command: &str, args: RunArgs, dry_run: bool) -> Result<(), CliError> {
    let RunArgs {
        conn,
        conn_pos,
        schema,
        pg_schema,
        tables,
        run_dir,
        out,
    } = args;

    let conn = match (conn, conn_pos) {
        (Some(value), None) => value,
        (None, Some(value)) => value,
        (Some(_), Some(_)) => {
            return Err(CliError::InvalidConfig(
                "use either --conn or positional connection string".to_string(),
            ));
        }
        (None, None) => {
            return Err(CliError::InvalidConfig(
                "connection string is required".to_string(),
            ));
        }
    };

    let engine = detect_engine(&conn)?;

    let options = IntrospectOptions {
        schema: pg_schema,
        tables: if tables.is_empty() { None } else { Some(tables) },
        ..IntrospectOptions::default()
    };

    let run_id = Uuid::new_v4().to_string();
    let run_ctx = RunContext {
        run_id: run_id.clone(),
        started_at: chrono::Utc::now(),
        command: command.to_string(),
        engine: engine.to_string(),
        schema_file: schema.clone(),
        run_dir,
        out,
        options: RunOptions {
            pg_schema: options.schema.clone(),
            tables: options.tables.clone(),
            dry_run,
        },
        connection: redact_connection_string(&conn),
    };

    let run_paths = start_run(&run_ctx)?;
    init_run_logging(&run_paths.logs_path)?;

    tracing::info!(
        event = "run_started",
        run_id = %run_id,
        command = command,
        engine = %engine,
        dry_run = dry_run
    );

    let timer = Instant::now();

    let target = restrict(load_catalog(&schema)?, &options);
    tracing::info!(
        event = "target_loaded",
        path = %schema.display(),
        tables = target.len()
    );

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&conn)
        .await?;
    let adapter = PostgresAdapter::new(pool, options);

    let plan = plan_against(&adapter, &target).await?;
    let statements = plan.statements();
    write_plan(&run_paths, &statements, run_ctx.out.as_deref())?;
    tracing::info!(event = "plan_written", path = %run_paths.plan_path.display());

    let report = if dry_run {
        write_statements(&plan, std::io::stdout().lock())?
    } else {
        apply(&adapter, &plan).await?
    };

    finish(&run_paths, &report, timer);
    Ok(())
}

fn finish(paths: &RunPaths, report: &MigrationReport, timer: Instant) {
    let duration_ms = timer.elapsed().as_millis() as u64;
    tracing::info!(
        event = "run_finished",
        status = "success",
        run_dir = %paths.root.display(),
        actions = report.actions,
        statements = report.statements,
        applied = report.applied,
        duration_ms = duration_ms
    );
}

fn load_catalog(path: &Path) -> Result<Catalog, CliError> {
    let source = std::fs::read_to_string(path)?;
    let catalog = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Catalog::from_toml_str(&source)?,
        Some("json") => Catalog::from_json_str(&source)?,
        _ => {
            return Err(CliError::InvalidConfig(format!(
                "unsupported catalog file (expected .toml or .json): {}",
                path.display()
            )));
        }
    };
    Ok(catalog)
}

/// Keep only the tables selected with `--table`.
fn restrict(catalog: Catalog, options: &IntrospectOptions) -> Catalog {
    if options.tables.is_none() {
        return catalog;
    }
    catalog
        .iter()
        .filter(|table| options.includes_table(&table.name))
        .cloned()
        .fold(Catalog::new(), Catalog::with_table)
}

fn write_json_schema(out: Option<&Path>) -> Result<(), CliError> {
    let schema = schemars::schema_for!(Catalog);
    let rendered = serde_json::to_string_pretty(&schema)?;
    match out {
        Some(path) => std::fs::write(path, format!("{rendered}\n"))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(
            redact_connection_string(conn).redacted,
        ))
    }
}
