//! Policy Management DAO access
//!
//! ```text
//! caller ──▶ begin_transaction ──▶ DAOs: get_connection ──▶ commit / rollback ──▶ close_connection
//!                 │                        │
//!                 ▼                        ▼
//!          TransactionStrategy       DataSource (+ enlist in XA mode)
//! ```
//!
//! # Invariants
//!
//! 1. **One connection per unit of work**: repeated `get_connection` calls
//!    return the same connection until `close_connection`
//! 2. **Enlist once**: in distributed mode a unit of work enlists at most one
//!    resource per transaction
//! 3. **Cleared on completion**: distributed commit/rollback clear the stored
//!    handle and resource even when the coordinator call fails
//! 4. **Close never fails**: close errors are logged, state is cleared

pub mod factory;


pub use factory::DaoFactory;
