//! Mock transaction coordinator for testing

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{GlobalTransaction, TransactionManager};
use crate::datasource::XaResource;
use crate::error::BoxError;

/// Failure toggles are copied into each transaction at `begin`
#[derive(Default)]
pub struct MockTransactionManager {
    begin_count: AtomicUsize,
    fail_begin: AtomicBool,
    fail_enlist: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    transactions: Mutex<Vec<Arc<MockTransaction>>>,
}

impl MockTransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_begin(&self, fail: bool) {
        self.fail_begin.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_enlist(&self, fail: bool) {
        self.fail_enlist.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn begin_count(&self) -> usize {
        self.begin_count.load(Ordering::SeqCst)
    }

    pub fn last_transaction(&self) -> Option<Arc<MockTransaction>> {
        self.transactions.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TransactionManager for MockTransactionManager {
    async fn begin(&self) -> Result<Arc<dyn GlobalTransaction>, BoxError> {
        let n = self.begin_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_begin.load(Ordering::SeqCst) {
            return Err("Mock begin failure".into());
        }

        let tx = Arc::new(MockTransaction {
            id: format!("tx-{}", n),
            enlisted: Mutex::new(Vec::new()),
            commit_count: AtomicUsize::new(0),
            rollback_count: AtomicUsize::new(0),
            fail_enlist: self.fail_enlist.load(Ordering::SeqCst),
            fail_commit: self.fail_commit.load(Ordering::SeqCst),
            fail_rollback: self.fail_rollback.load(Ordering::SeqCst),
        });
        self.transactions.lock().unwrap().push(tx.clone());
        Ok(tx)
    }
}

pub struct MockTransaction {
    id: String,
    enlisted: Mutex<Vec<String>>,
    commit_count: AtomicUsize,
    rollback_count: AtomicUsize,
    fail_enlist: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

impl MockTransaction {
    /// Names of resources enlisted so far, in order
    pub fn enlisted(&self) -> Vec<String> {
        self.enlisted.lock().unwrap().clone()
    }

    pub fn commit_count(&self) -> usize {
        self.commit_count.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollback_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GlobalTransaction for MockTransaction {
    fn id(&self) -> String {
        self.id.clone()
    }

    async fn enlist_resource(&self, resource: Arc<dyn XaResource>) -> Result<(), BoxError> {
        if self.fail_enlist {
            return Err("Mock enlist failure".into());
        }
        self.enlisted.lock().unwrap().push(resource.name().to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), BoxError> {
        self.commit_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit {
            return Err("Mock commit failure".into());
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), BoxError> {
        self.rollback_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_rollback {
            return Err("Mock rollback failure".into());
        }
        Ok(())
    }
}
