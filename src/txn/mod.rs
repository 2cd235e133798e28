//! Transactions
//!
//! Two transaction models behind one [`TransactionStrategy`]:
//!
//! ```text
//! Local:        NoTransaction ──begin──▶ InTransaction ──commit/rollback──▶ NoTransaction
//!               (autocommit off on the unit of work's connection)
//!
//! Distributed:  NoTransaction ──begin──▶ InTransaction ──commit/rollback──▶ NoTransaction
//!               (coordinator handle stored; first connection enlisted once)
//! ```
//!
//! All per-call state lives in an explicit [`UnitOfWork`] owned by the caller.

pub mod context;
pub mod strategy;

#[cfg(test)]
pub mod mock;

pub use context::UnitOfWork;
pub use strategy::{LocalStrategy, TransactionStrategy, XaStrategy};

use std::sync::Arc;

use async_trait::async_trait;

use crate::datasource::XaResource;
use crate::error::BoxError;

/// Transaction coordinator, looked up by well-known name
#[async_trait]
pub trait TransactionManager: Send + Sync {
    /// Start a coordinator-managed transaction
    async fn begin(&self) -> Result<Arc<dyn GlobalTransaction>, BoxError>;
}

/// Handle to an in-progress coordinator-managed transaction
#[async_trait]
pub trait GlobalTransaction: Send + Sync {
    /// Transaction id for logging
    fn id(&self) -> String;

    /// Register a resource so the coordinator includes it in the outcome
    async fn enlist_resource(&self, resource: Arc<dyn XaResource>) -> Result<(), BoxError>;

    async fn commit(&self) -> Result<(), BoxError>;

    async fn rollback(&self) -> Result<(), BoxError>;
}
