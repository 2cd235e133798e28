//! Connection Sources
//!
//! A [`DataSource`] is the process-wide factory of physical connections. It
//! outlives every unit of work and is shared behind an `Arc`.
//!
//! - [`resolver`] turns a [`crate::config::DataSourceConfig`] into a source
//! - [`postgres`] is the sqlx-backed PostgreSQL source

pub mod postgres;
pub mod resolver;

#[cfg(test)]
pub mod mock;

pub use postgres::{PgConnection, PgDataSource};
pub use resolver::resolve_data_source;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Physical database connection
///
/// Autocommit follows JDBC semantics: while it is off, every statement runs
/// inside the current transaction until `commit` or `rollback` ends it.
#[async_trait]
pub trait Connection: Send {
    /// Enable or disable autocommit
    async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError>;

    fn auto_commit(&self) -> bool;

    /// Execute one statement, returning the affected row count
    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError>;

    async fn commit(&mut self) -> Result<(), BoxError>;

    async fn rollback(&mut self) -> Result<(), BoxError>;

    /// Release the connection back to its source
    async fn close(self: Box<Self>) -> Result<(), BoxError>;
}

/// Transactional resource of a connection, registered with a coordinator
/// transaction on enlistment. Opaque to this crate.
pub trait XaResource: Send + Sync {
    /// Resource name for logging
    fn name(&self) -> &str;
}

/// Factory of physical connections
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Get source name for logging
    fn name(&self) -> &str;

    /// Create a new physical connection
    async fn get_connection(&self) -> Result<Box<dyn Connection>, BoxError>;

    /// Distributed-transaction resource handle for a connection of this source
    ///
    /// Sources without XA support keep the default, which always fails.
    fn xa_resource(&self, _conn: &dyn Connection) -> Result<Arc<dyn XaResource>, BoxError> {
        Err(format!(
            "data source '{}' does not support distributed transactions",
            self.name()
        )
        .into())
    }
}
