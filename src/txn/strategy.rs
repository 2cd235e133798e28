//! Transaction Strategies
//!
//! Local and distributed begin/commit/rollback/enlist, selected once when the
//! factory is initialized.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::context::UnitOfWork;
use crate::datasource::{Connection, DataSource};
use crate::error::DaoError;
use crate::naming::{Naming, STANDARD_TRANSACTION_MANAGER_JNDI_NAME};

/// Transaction model of a factory
#[async_trait]
pub trait TransactionStrategy: Send + Sync {
    /// Get strategy name for logging
    fn name(&self) -> &'static str;

    async fn begin(&self, source: &dyn DataSource, uow: &mut UnitOfWork) -> Result<(), DaoError>;

    async fn commit(&self, uow: &mut UnitOfWork) -> Result<(), DaoError>;

    async fn rollback(&self, uow: &mut UnitOfWork) -> Result<(), DaoError>;

    /// Hook for a freshly acquired connection, before it is stored
    async fn enlist(
        &self,
        source: &dyn DataSource,
        conn: &mut dyn Connection,
        uow: &mut UnitOfWork,
    ) -> Result<(), DaoError>;
}

// ============================================================================
// Local transactions
// ============================================================================

/// Autocommit-off transactions on the unit of work's own connection
#[derive(Debug, Default)]
pub struct LocalStrategy;

#[async_trait]
impl TransactionStrategy for LocalStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn begin(&self, source: &dyn DataSource, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        if uow.local_tx_active {
            debug!(uow = %uow.id(), "Local transaction already active");
            return Ok(());
        }

        let (mut conn, fresh) = match uow.connection.take() {
            Some(conn) => (conn, false),
            None => {
                let conn = source.get_connection().await.map_err(|e| {
                    DaoError::transaction(
                        "Error occurred while retrieving config.datasource connection",
                        e,
                    )
                })?;
                (conn, true)
            }
        };

        if let Err(e) = conn.set_auto_commit(false).await {
            if fresh {
                if let Err(close_err) = conn.close().await {
                    error!(uow = %uow.id(), error = %close_err, "Error occurred while close the connection");
                }
            } else {
                uow.connection = Some(conn);
            }
            return Err(DaoError::transaction(
                "Error occurred while disabling autocommit",
                e,
            ));
        }

        uow.connection = Some(conn);
        uow.local_tx_active = true;
        debug!(uow = %uow.id(), fresh = fresh, "Local transaction started");
        Ok(())
    }

    async fn commit(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let id = uow.id();
        match uow.connection.as_mut() {
            Some(conn) if !conn.auto_commit() => {
                conn.commit().await.map_err(|e| {
                    DaoError::transaction("Error occurred while committing the transaction", e)
                })?;
                uow.local_tx_active = false;
                debug!(uow = %id, "Local transaction committed");
            }
            Some(_) => {
                debug!(uow = %id, "Connection is in autocommit mode, hence commit has not been attempted");
            }
            None => {
                debug!(
                    uow = %id,
                    "Datasource connection associated with the unit of work is null, hence commit has not been attempted"
                );
            }
        }
        Ok(())
    }

    async fn rollback(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let id = uow.id();
        match uow.connection.as_mut() {
            Some(conn) if !conn.auto_commit() => {
                conn.rollback().await.map_err(|e| {
                    DaoError::transaction("Error occurred while rollback the transaction", e)
                })?;
                uow.local_tx_active = false;
                debug!(uow = %id, "Local transaction rolled back");
            }
            Some(_) => {
                debug!(uow = %id, "Connection is in autocommit mode, hence rollback has not been attempted");
            }
            None => {
                debug!(
                    uow = %id,
                    "Datasource connection associated with the unit of work is null, hence rollback has not been attempted"
                );
            }
        }
        Ok(())
    }

    async fn enlist(
        &self,
        _source: &dyn DataSource,
        _conn: &mut dyn Connection,
        _uow: &mut UnitOfWork,
    ) -> Result<(), DaoError> {
        Ok(())
    }
}

// ============================================================================
// Distributed transactions
// ============================================================================

/// Coordinator-managed transactions with resource enlistment
pub struct XaStrategy {
    naming: Arc<dyn Naming>,
    manager_name: String,
}

impl XaStrategy {
    /// Coordinator looked up under the standard name
    pub fn new(naming: Arc<dyn Naming>) -> Self {
        Self::with_manager_name(naming, STANDARD_TRANSACTION_MANAGER_JNDI_NAME)
    }

    pub fn with_manager_name(naming: Arc<dyn Naming>, manager_name: impl Into<String>) -> Self {
        Self {
            naming,
            manager_name: manager_name.into(),
        }
    }

    pub fn manager_name(&self) -> &str {
        &self.manager_name
    }
}

#[async_trait]
impl TransactionStrategy for XaStrategy {
    fn name(&self) -> &'static str {
        "xa"
    }

    async fn begin(&self, _source: &dyn DataSource, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        if let Some(tx) = &uow.transaction {
            debug!(uow = %uow.id(), tx = %tx.id(), "Distributed transaction already active");
            return Ok(());
        }

        let manager = self
            .naming
            .lookup_transaction_manager(&self.manager_name)
            .await
            .map_err(|e| {
                let lookup = DaoError::lookup(self.manager_name.as_str(), e);
                error!(uow = %uow.id(), error = %lookup, "Naming exception occurred during lookup");
                DaoError::transaction("Error in begin transaction", lookup)
            })?;

        let tx = manager.begin().await.map_err(|e| {
            error!(uow = %uow.id(), error = %e, "Error in begin transaction");
            DaoError::transaction("Error in begin transaction", e)
        })?;

        info!(uow = %uow.id(), tx = %tx.id(), "Distributed transaction started");
        uow.transaction = Some(tx);
        uow.resource = None;
        Ok(())
    }

    async fn commit(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let Some(tx) = uow.transaction.clone() else {
            debug!(uow = %uow.id(), "No distributed transaction associated with the unit of work, hence commit has not been attempted");
            return Ok(());
        };

        let result = tx.commit().await;
        uow.clear_distributed();

        result.map_err(|e| {
            error!(uow = %uow.id(), tx = %tx.id(), error = %e, "Error occurred commit transaction");
            DaoError::transaction("Error occurred commit transaction", e)
        })?;
        debug!(uow = %uow.id(), tx = %tx.id(), "Distributed transaction committed");
        Ok(())
    }

    async fn rollback(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let Some(tx) = uow.transaction.clone() else {
            debug!(uow = %uow.id(), "No distributed transaction associated with the unit of work, hence rollback has not been attempted");
            return Ok(());
        };

        let result = tx.rollback().await;
        uow.clear_distributed();

        result.map_err(|e| {
            error!(uow = %uow.id(), tx = %tx.id(), error = %e, "Error occurred rollback transaction");
            DaoError::transaction("Error occurred rollback transaction", e)
        })?;
        debug!(uow = %uow.id(), tx = %tx.id(), "Distributed transaction rolled back");
        Ok(())
    }

    async fn enlist(
        &self,
        source: &dyn DataSource,
        conn: &mut dyn Connection,
        uow: &mut UnitOfWork,
    ) -> Result<(), DaoError> {
        let Some(tx) = uow.transaction.clone() else {
            return Ok(());
        };
        if uow.resource.is_some() {
            return Ok(());
        }

        let resource = source.xa_resource(&*conn).map_err(|e| {
            error!(uow = %uow.id(), error = %e, "Error occurred while enlist the resource");
            DaoError::transaction("Error occurred while enlist the resource", e)
        })?;

        tx.enlist_resource(resource.clone()).await.map_err(|e| {
            error!(uow = %uow.id(), tx = %tx.id(), error = %e, "Error occurred while enlist the resource");
            DaoError::transaction("Error occurred while enlist the resource", e)
        })?;

        debug!(uow = %uow.id(), tx = %tx.id(), resource = resource.name(), "Resource enlisted");
        uow.resource = Some(resource);
        Ok(())
    }
}
