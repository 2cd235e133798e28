//! Policy Management DAO - connection and transaction manager
//!
//! Binds one connection and one transaction to each logical unit of work,
//! for both local (autocommit-off) and distributed (coordinator-managed)
//! transactions.
//!
//! # Modules
//!
//! - [`config`] - Data source descriptor and YAML configuration
//! - [`datasource`] - Connection source traits, resolver, PostgreSQL source
//! - [`naming`] - Directory service lookups and in-process registry
//! - [`txn`] - Unit of work context and transaction strategies
//! - [`dao`] - The DAO factory driving connections and transactions
//! - [`error`] - Error types
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod dao;
pub mod datasource;
pub mod error;
pub mod logging;
pub mod naming;
pub mod txn;

// Convenient re-exports at crate root
pub use config::{DataSourceConfig, JndiLookupDefinition, JndiProperty, LogConfig, PolicyConfig};
pub use dao::DaoFactory;
pub use datasource::{Connection, DataSource, PgDataSource, XaResource};
pub use error::{BoxError, DaoError};
pub use naming::{Naming, NamingRegistry, STANDARD_TRANSACTION_MANAGER_JNDI_NAME};
pub use txn::{GlobalTransaction, TransactionManager, UnitOfWork};
