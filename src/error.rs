//! DAO Error Types
//!
//! One error enum for every operation the DAO factory exposes. Collaborator
//! failures (data source, naming, coordinator) are kept as the chained source.

use thiserror::Error;

/// Boxed error returned by collaborator traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// DAO error types
#[derive(Error, Debug)]
pub enum DaoError {
    /// Missing or unusable data source configuration. Fatal to initialization.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Directory service could not resolve a name.
    #[error("Lookup of '{name}' failed: {source}")]
    Lookup {
        name: String,
        #[source]
        source: BoxError,
    },

    /// An operation ran before the factory was initialized.
    #[error("Data source is not yet configured")]
    NotInitialized,

    /// Physical connection acquisition failed. Nothing was stored.
    #[error("{message}: {source}")]
    Connection {
        message: String,
        #[source]
        source: BoxError,
    },

    /// Begin, commit, rollback or enlistment failed.
    #[error("{message}: {source}")]
    Transaction {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl DaoError {
    pub fn lookup(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DaoError::Lookup {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DaoError::Connection {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn transaction(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DaoError::Transaction {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Get the stable error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            DaoError::Configuration(_) => "CONFIGURATION_ERROR",
            DaoError::Lookup { .. } => "LOOKUP_ERROR",
            DaoError::NotInitialized => "NOT_INITIALIZED",
            DaoError::Connection { .. } => "CONNECTION_ERROR",
            DaoError::Transaction { .. } => "TRANSACTION_ERROR",
        }
    }

    /// True for failures raised by begin/commit/rollback/enlist
    pub fn is_transaction(&self) -> bool {
        matches!(self, DaoError::Transaction { .. })
    }
}

impl From<sqlx::Error> for DaoError {
    fn from(e: sqlx::Error) -> Self {
        DaoError::connection("Error occurred while retrieving data source connection", e)
    }
}
