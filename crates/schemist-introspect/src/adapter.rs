use async_trait::async_trait;

use schemist_core::{Catalog, Result};
use schemist_dialect::{Dialect, Fragment};

/// Trait implemented by database adapters that can introspect and alter schemas.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Dialect used to render DDL for this backend.
    fn dialect(&self) -> &dyn Dialect;

    /// Read the live schema into a catalog.
    async fn catalog(&self) -> Result<Catalog>;

    /// Execute a single fragment outside any transaction.
    async fn exec(&self, fragment: &Fragment) -> Result<u64>;

    /// Open a transaction; dropping it without commit rolls it back.
    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// An open transaction on an adapter.
#[async_trait]
pub trait Transaction: Send {
    async fn exec(&mut self, fragment: &Fragment) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
