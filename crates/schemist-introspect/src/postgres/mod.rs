use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};

use schemist_core::{Catalog, Result};
use schemist_dialect::{Dialect, Fragment, PostgresDialect, Value};

use crate::adapter::{Adapter, Transaction};
use crate::options::IntrospectOptions;

use queries::db_error;

mod mapper;
mod queries;

/// Adapter for PostgreSQL databases.
#[derive(Debug, Clone)]
pub struct PostgresAdapter {
    pool: PgPool,
    options: IntrospectOptions,
    dialect: PostgresDialect,
}

impl PostgresAdapter {
    /// Create a new adapter using a pre-configured pool. Rendered DDL targets
    /// the same schema that is introspected.
    pub fn new(pool: PgPool, options: IntrospectOptions) -> Self {
        let dialect = PostgresDialect::with_schema(options.schema.as_str());
        Self {
            pool,
            options,
            dialect,
        }
    }

    pub fn options(&self) -> &IntrospectOptions {
        &self.options
    }
}

#[async_trait]
impl Adapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn catalog(&self) -> Result<Catalog> {
        introspect(&self.pool, &self.options).await
    }

    async fn exec(&self, fragment: &Fragment) -> Result<u64> {
        let result = bind_fragment(fragment)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let inner = self.pool.begin().await.map_err(db_error)?;
        Ok(Box::new(PgTransaction { inner }))
    }
}

struct PgTransaction {
    inner: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn exec(&mut self, fragment: &Fragment) -> Result<u64> {
        let result = bind_fragment(fragment)
            .execute(&mut *self.inner)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.commit().await.map_err(db_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await.map_err(db_error)
    }
}

fn bind_fragment(fragment: &Fragment) -> Query<'_, Postgres, PgArguments> {
    fragment
        .args
        .iter()
        .fold(sqlx::query(&fragment.sql), |query, value| match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(value) => query.bind(*value),
            Value::Int(value) => query.bind(*value),
            Value::Float(value) => query.bind(*value),
            Value::Text(value) => query.bind(value.as_str()),
        })
}

/// Introspect Postgres with default options.
pub async fn introspect_postgres(pool: &PgPool) -> Result<Catalog> {
    introspect_postgres_with_options(pool, IntrospectOptions::default()).await
}

/// Introspect Postgres with caller-provided options.
pub async fn introspect_postgres_with_options(
    pool: &PgPool,
    opts: IntrospectOptions,
) -> Result<Catalog> {
    introspect(pool, &opts).await
}

/// Read every managed table of the configured namespace into a catalog.
pub async fn introspect(pool: &PgPool, opts: &IntrospectOptions) -> Result<Catalog> {
    let database = queries::fetch_database_name(pool).await?;
    let tables = mapper::filter_tables(
        queries::list_tables_in_schema(pool, &opts.schema).await?,
        opts,
    );

    let mut catalog = Catalog::new();
    for name in tables {
        let raw_columns = queries::list_columns(pool, &opts.schema, &name).await?;
        let columns = mapper::map_columns(&name, raw_columns);

        let keys = if opts.include_indexes {
            mapper::map_indexes(queries::list_indexes(pool, &opts.schema, &name).await?)
        } else {
            Vec::new()
        };

        tracing::debug!(
            event = "table_introspected",
            table = %name,
            columns = columns.len(),
            keys = keys.len()
        );
        catalog.insert(mapper::assemble_table(&name, columns, keys));
    }

    tracing::debug!(
        event = "catalog_introspected",
        database = %database,
        schema = %opts.schema,
        tables = catalog.len()
    );
    Ok(catalog)
}
