//! Directory Service
//!
//! Name-based lookup of data sources and the transaction coordinator.
//! [`NamingRegistry`] is the in-process implementation; anything else that can
//! resolve names (a remote directory, a container) implements [`Naming`].

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::JndiEnvironment;
use crate::datasource::DataSource;
use crate::error::BoxError;
use crate::txn::TransactionManager;

/// Well-known name the coordinator is bound under
pub const STANDARD_TRANSACTION_MANAGER_JNDI_NAME: &str = "java:comp/TransactionManager";

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("Name not bound: {0}")]
    NameNotFound(String),
}

/// Directory service lookups
#[async_trait]
pub trait Naming: Send + Sync {
    /// Resolve a name plus optional property bag to a data source
    async fn lookup_data_source(
        &self,
        name: &str,
        environment: Option<&JndiEnvironment>,
    ) -> Result<Arc<dyn DataSource>, BoxError>;

    /// Resolve a name to the transaction coordinator
    async fn lookup_transaction_manager(
        &self,
        name: &str,
    ) -> Result<Arc<dyn TransactionManager>, BoxError>;
}

/// In-process directory of bound names
#[derive(Default)]
pub struct NamingRegistry {
    data_sources: DashMap<String, Arc<dyn DataSource>>,
    transaction_managers: DashMap<String, Arc<dyn TransactionManager>>,
}

impl NamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a data source, replacing any previous binding
    pub fn bind_data_source(&self, name: impl Into<String>, source: Arc<dyn DataSource>) {
        self.data_sources.insert(name.into(), source);
    }

    /// Bind a coordinator, replacing any previous binding
    pub fn bind_transaction_manager(
        &self,
        name: impl Into<String>,
        manager: Arc<dyn TransactionManager>,
    ) {
        self.transaction_managers.insert(name.into(), manager);
    }

    pub fn unbind(&self, name: &str) -> bool {
        let ds = self.data_sources.remove(name).is_some();
        let tm = self.transaction_managers.remove(name).is_some();
        ds || tm
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.data_sources.contains_key(name) || self.transaction_managers.contains_key(name)
    }
}

#[async_trait]
impl Naming for NamingRegistry {
    async fn lookup_data_source(
        &self,
        name: &str,
        environment: Option<&JndiEnvironment>,
    ) -> Result<Arc<dyn DataSource>, BoxError> {
        debug!(
            name = name,
            properties = environment.map(|e| e.len()).unwrap_or(0),
            "Looking up data source"
        );
        self.data_sources
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NamingError::NameNotFound(name.to_string()).into())
    }

    async fn lookup_transaction_manager(
        &self,
        name: &str,
    ) -> Result<Arc<dyn TransactionManager>, BoxError> {
        self.transaction_managers
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| NamingError::NameNotFound(name.to_string()).into())
    }
}
