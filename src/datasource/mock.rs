//! Mock data source for testing
//!
//! Connections are numbered from 1 in acquisition order; `execute` returns the
//! connection number so tests can tell connections apart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Connection, DataSource, XaResource};
use crate::error::BoxError;

#[derive(Default)]
struct Behaviour {
    fail_get: bool,
    fail_auto_commit: bool,
    fail_commit: bool,
    fail_rollback: bool,
    fail_close: bool,
    fail_xa: bool,
}

#[derive(Default)]
struct Shared {
    /// Track operations per connection number
    operations: Mutex<HashMap<usize, Vec<String>>>,
    behaviour: Mutex<Behaviour>,
}

impl Shared {
    fn record(&self, conn_id: usize, op: impl Into<String>) {
        let mut ops = self.operations.lock().unwrap();
        ops.entry(conn_id).or_default().push(op.into());
    }
}

pub struct MockDataSource {
    name: &'static str,
    shared: Arc<Shared>,
    acquired: AtomicUsize,
    xa_requests: AtomicUsize,
}

impl MockDataSource {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            shared: Arc::new(Shared::default()),
            acquired: AtomicUsize::new(0),
            xa_requests: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_get = fail;
    }

    pub fn set_fail_auto_commit(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_auto_commit = fail;
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_commit = fail;
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_rollback = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_close = fail;
    }

    pub fn set_fail_xa(&self, fail: bool) {
        self.shared.behaviour.lock().unwrap().fail_xa = fail;
    }

    /// Number of physical connections handed out
    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn xa_request_count(&self) -> usize {
        self.xa_requests.load(Ordering::SeqCst)
    }

    /// Operations recorded on connection `conn_id`
    pub fn operations(&self, conn_id: usize) -> Vec<String> {
        self.shared
            .operations
            .lock()
            .unwrap()
            .get(&conn_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn get_connection(&self) -> Result<Box<dyn Connection>, BoxError> {
        if self.shared.behaviour.lock().unwrap().fail_get {
            return Err("Mock connection refused".into());
        }
        let id = self.acquired.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(MockConnection {
            id,
            auto_commit: true,
            shared: self.shared.clone(),
        }))
    }

    fn xa_resource(&self, _conn: &dyn Connection) -> Result<Arc<dyn XaResource>, BoxError> {
        let n = self.xa_requests.fetch_add(1, Ordering::SeqCst) + 1;
        if self.shared.behaviour.lock().unwrap().fail_xa {
            return Err("Mock XA resource unavailable".into());
        }
        Ok(Arc::new(MockResource::new(format!("{}-xa-{}", self.name, n))))
    }
}

pub struct MockConnection {
    id: usize,
    auto_commit: bool,
    shared: Arc<Shared>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), BoxError> {
        self.shared
            .record(self.id, format!("set_auto_commit({})", auto_commit));
        if self.shared.behaviour.lock().unwrap().fail_auto_commit {
            return Err("Mock autocommit failure".into());
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    async fn execute(&mut self, sql: &str) -> Result<u64, BoxError> {
        self.shared.record(self.id, format!("execute({})", sql));
        Ok(self.id as u64)
    }

    async fn commit(&mut self) -> Result<(), BoxError> {
        self.shared.record(self.id, "commit");
        if self.shared.behaviour.lock().unwrap().fail_commit {
            return Err("Mock commit failure".into());
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), BoxError> {
        self.shared.record(self.id, "rollback");
        if self.shared.behaviour.lock().unwrap().fail_rollback {
            return Err("Mock rollback failure".into());
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), BoxError> {
        self.shared.record(self.id, "close");
        if self.shared.behaviour.lock().unwrap().fail_close {
            return Err("Mock close failure".into());
        }
        Ok(())
    }
}

pub struct MockResource {
    name: String,
}

impl MockResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl XaResource for MockResource {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_connections_are_numbered() {
        let ds = MockDataSource::new("dm");

        let mut first = ds.get_connection().await.unwrap();
        let mut second = ds.get_connection().await.unwrap();

        assert_eq!(first.execute("SELECT 1").await.unwrap(), 1);
        assert_eq!(second.execute("SELECT 1").await.unwrap(), 2);
        assert_eq!(ds.acquired_count(), 2);
        assert_eq!(ds.operations(1), vec!["execute(SELECT 1)"]);
    }

    #[tokio::test]
    async fn test_mock_failure_toggles() {
        let ds = MockDataSource::new("dm");
        let conn = ds.get_connection().await.unwrap();
        ds.set_fail_close(true);

        assert!(conn.close().await.is_err());
        assert_eq!(ds.operations(1), vec!["close"]);

        ds.set_fail_get(true);
        assert!(ds.get_connection().await.is_err());
        assert_eq!(ds.acquired_count(), 1);
    }
}
