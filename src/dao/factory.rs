//! Policy Management DAO Factory
//!
//! The single entry point through which data-access objects obtain the
//! connection bound to their unit of work and drive its transaction.

use std::sync::{Arc, RwLock};

use tracing::{debug, error, info, warn};

use crate::config::DataSourceConfig;
use crate::datasource::{Connection, DataSource, resolve_data_source};
use crate::error::DaoError;
use crate::naming::{Naming, STANDARD_TRANSACTION_MANAGER_JNDI_NAME};
use crate::txn::{LocalStrategy, TransactionStrategy, UnitOfWork, XaStrategy};

/// Immutable snapshot installed by `init`
struct Runtime {
    data_source: Arc<dyn DataSource>,
    strategy: Arc<dyn TransactionStrategy>,
    xa_enabled: bool,
    manager_name: String,
}

/// DAO factory - connection and transaction manager for units of work
///
/// Shared behind an `Arc`; every per-call operation takes the caller's
/// [`UnitOfWork`] so concurrent operations never see each other's state.
pub struct DaoFactory {
    naming: Arc<dyn Naming>,
    runtime: RwLock<Option<Arc<Runtime>>>,
}

impl DaoFactory {
    /// Create an uninitialized factory resolving names through `naming`
    pub fn new(naming: Arc<dyn Naming>) -> Self {
        Self {
            naming,
            runtime: RwLock::new(None),
        }
    }

    /// Initialize from a data source descriptor
    ///
    /// Sets the transaction mode and resolves the source. The last successful
    /// call wins; a failed call leaves the previous state in place.
    pub async fn init(&self, config: Option<&DataSourceConfig>) -> Result<(), DaoError> {
        let data_source = resolve_data_source(config, self.naming.as_ref()).await?;
        let xa_enabled = config.map(|c| c.xa_enabled).unwrap_or(false);
        let manager_name = config
            .and_then(|c| c.transaction_manager_name.clone())
            .unwrap_or_else(|| STANDARD_TRANSACTION_MANAGER_JNDI_NAME.to_string());
        self.install(data_source, xa_enabled, manager_name);
        Ok(())
    }

    /// Initialize with an already constructed source, keeping the current mode
    /// and coordinator name
    pub fn init_with_source(&self, data_source: Arc<dyn DataSource>) {
        let (xa_enabled, manager_name) = match self.current() {
            Some(rt) => (rt.xa_enabled, rt.manager_name.clone()),
            None => (false, STANDARD_TRANSACTION_MANAGER_JNDI_NAME.to_string()),
        };
        self.install(data_source, xa_enabled, manager_name);
    }

    fn install(&self, data_source: Arc<dyn DataSource>, xa_enabled: bool, manager_name: String) {
        let strategy: Arc<dyn TransactionStrategy> = if xa_enabled {
            Arc::new(XaStrategy::with_manager_name(
                self.naming.clone(),
                manager_name.as_str(),
            ))
        } else {
            Arc::new(LocalStrategy)
        };
        info!(
            source = data_source.name(),
            mode = strategy.name(),
            "DAO factory initialized"
        );

        let runtime = Arc::new(Runtime {
            data_source,
            strategy,
            xa_enabled,
            manager_name,
        });
        match self.runtime.write() {
            Ok(mut guard) => *guard = Some(runtime),
            Err(poisoned) => *poisoned.into_inner() = Some(runtime),
        }
    }

    fn current(&self) -> Option<Arc<Runtime>> {
        match self.runtime.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn runtime(&self) -> Result<Arc<Runtime>, DaoError> {
        self.current().ok_or(DaoError::NotInitialized)
    }

    /// The configured data source
    pub fn data_source(&self) -> Result<Arc<dyn DataSource>, DaoError> {
        Ok(self.runtime()?.data_source.clone())
    }

    /// True when initialized in distributed-transaction mode
    pub fn is_xa_enabled(&self) -> Result<bool, DaoError> {
        Ok(self.runtime()?.xa_enabled)
    }

    pub async fn begin_transaction(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let rt = self.runtime()?;
        rt.strategy.begin(rt.data_source.as_ref(), uow).await
    }

    pub async fn commit_transaction(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let rt = self.runtime()?;
        rt.strategy.commit(uow).await
    }

    pub async fn rollback_transaction(&self, uow: &mut UnitOfWork) -> Result<(), DaoError> {
        let rt = self.runtime()?;
        rt.strategy.rollback(uow).await
    }

    /// Connection bound to `uow`, acquired on first use
    ///
    /// Inside a distributed transaction the connection is enlisted once per
    /// transaction, including one stored before `begin`. A fresh connection
    /// that fails enlistment is released and nothing is stored; a stored one
    /// stays bound to `uow` and the next call retries.
    pub async fn get_connection<'a>(
        &self,
        uow: &'a mut UnitOfWork,
    ) -> Result<&'a mut dyn Connection, DaoError> {
        let rt = self.runtime()?;
        let (conn, enlisted) = match uow.connection.take() {
            Some(mut conn) => {
                let enlisted = rt
                    .strategy
                    .enlist(rt.data_source.as_ref(), &mut *conn, uow)
                    .await;
                (conn, enlisted)
            }
            None => (self.acquire(&rt, uow).await?, Ok(())),
        };
        let conn = uow.connection.insert(conn);
        enlisted?;
        Ok(&mut **conn)
    }

    async fn acquire(
        &self,
        rt: &Runtime,
        uow: &mut UnitOfWork,
    ) -> Result<Box<dyn Connection>, DaoError> {
        let mut conn = rt.data_source.get_connection().await.map_err(|e| {
            DaoError::connection("Error occurred while retrieving data source connection", e)
        })?;

        if let Err(e) = rt
            .strategy
            .enlist(rt.data_source.as_ref(), &mut *conn, uow)
            .await
        {
            if let Err(close_err) = conn.close().await {
                warn!(uow = %uow.id(), error = %close_err, "Failed to release connection after enlistment failure");
            }
            return Err(e);
        }

        debug!(uow = %uow.id(), source = rt.data_source.name(), "Connection acquired");
        Ok(conn)
    }

    /// Release the connection bound to `uow`
    ///
    /// Never fails: close errors are logged and the stored reference is
    /// cleared regardless.
    pub async fn close_connection(&self, uow: &mut UnitOfWork) {
        uow.local_tx_active = false;
        let Some(conn) = uow.connection.take() else {
            debug!(uow = %uow.id(), "No connection associated with the unit of work to close");
            return;
        };

        if let Err(e) = conn.close().await {
            error!(uow = %uow.id(), error = %e, "Error occurred while close the connection");
        } else {
            debug!(uow = %uow.id(), "Connection closed");
        }
    }
}
