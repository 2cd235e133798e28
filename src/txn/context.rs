//! Unit of Work
//!
//! Per-logical-operation state. One value per concurrent operation, passed by
//! `&mut` into every factory call; it is deliberately not `Clone`.

use std::fmt;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use super::GlobalTransaction;
use crate::datasource::{Connection, XaResource};

/// State bound to one logical unit of work
///
/// Holds at most one connection, one coordinator transaction and one
/// enlisted resource. In distributed mode the connection is enlisted into the
/// stored transaction and never committed on its own.
pub struct UnitOfWork {
    id: Uuid,
    pub(crate) connection: Option<Box<dyn Connection>>,
    /// Local mode: the stored connection has autocommit off for this transaction
    pub(crate) local_tx_active: bool,
    pub(crate) transaction: Option<Arc<dyn GlobalTransaction>>,
    pub(crate) resource: Option<Arc<dyn XaResource>>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            connection: None,
            local_tx_active: false,
            transaction: None,
            resource: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// True while a local or distributed transaction is open
    pub fn in_transaction(&self) -> bool {
        self.local_tx_active || self.transaction.is_some()
    }

    pub fn transaction(&self) -> Option<&Arc<dyn GlobalTransaction>> {
        self.transaction.as_ref()
    }

    pub fn enlisted_resource(&self) -> Option<&Arc<dyn XaResource>> {
        self.resource.as_ref()
    }

    pub(crate) fn clear_distributed(&mut self) {
        self.resource = None;
        self.transaction = None;
    }
}

impl Default for UnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if self.connection.is_some() {
            warn!(uow = %self.id, "Unit of work dropped with an open connection");
        }
        if let Some(tx) = &self.transaction {
            warn!(uow = %self.id, tx = %tx.id(), "Unit of work dropped inside a distributed transaction");
        }
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("id", &self.id)
            .field("connection", &self.connection.is_some())
            .field("local_tx_active", &self.local_tx_active)
            .field("transaction", &self.transaction.as_ref().map(|t| t.id()))
            .field("resource", &self.resource.as_ref().map(|r| r.name().to_string()))
            .finish()
    }
}
