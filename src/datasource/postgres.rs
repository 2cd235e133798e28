//! PostgreSQL connection source

use std::time::Duration;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Executor, Postgres};

use super::{Connection, DataSource};
use crate::error::{BoxError, DaoError};

/// PostgreSQL data source over a sqlx connection pool
pub struct PgDataSource {
    name: String,
    pool: PgPool,
}

impl PgDataSource {
    /// Create a new database connection pool
    pub async fn connect(name: impl Into<String>, database_url: &str) -> Result<Self, DaoError> {
        let pool = PgPoolOptions::new()
            .max_connections(50)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        let name = name.into();
        tracing::info!(source = %name, "PostgreSQL connection pool established");
        Ok(Self { name, pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), DaoError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DataSource for PgDataSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_connection(&self) -> Result<Box<dyn Connection>, BoxError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(PgConnection::new(conn)))
    }
}

/// Pooled PostgreSQL connection with JDBC autocommit semantics
///
/// While autocommit is off a transaction block is always open: `commit` and
/// `rollback` end it and immediately open the next one.
pub struct PgConnection {
    conn: PoolConnection<Postgres>,
    auto_commit: bool,
}

impl PgConnection {
    pub fn new(conn: PoolConnection<Postgres>) -> Self {
        Self {
            conn,
            auto_commit: true,
        }
    }

    async fn run(&mut self, statement: &'static str) -> Result<(), sqlx::Error> {
        (&mut *self.conn).execute(statement).await?;
        Ok(())
    }
}

#[async_trait]
impl Connection for PgConnection {
    async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError> {
        match (self.auto_commit, auto_commit) {
            (true, false) => self.run("BEGIN").await?,
            // Re-enabling autocommit commits the open transaction
            (false, true) => self.run("COMMIT").await?,
            _ => {}
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        let result = sqlx::query(sql).execute(&mut *self.conn).await?;
        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<(), BoxError> {
        if self.auto_commit {
            return Err("cannot commit when autocommit is enabled".into());
        }
        self.run("COMMIT").await?;
        self.run("BEGIN").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), BoxError> {
        if self.auto_commit {
            return Err("cannot rollback when autocommit is enabled".into());
        }
        self.run("ROLLBACK").await?;
        self.run("BEGIN").await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), BoxError> {
        let mut this = *self;
        if !this.auto_commit {
            // Pending work is discarded before the connection goes back to the pool
            this.run("ROLLBACK").await?;
        }
        Ok(())
    }
}
