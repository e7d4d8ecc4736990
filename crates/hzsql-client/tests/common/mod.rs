//! Shared fixtures: an in-memory "cluster" provider with controllable
//! latency, failures and member liveness. Connects slower than the
//! configured `connectionTimeout` fail with a timeout.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hzsql_client::{ConnectError, ConnectionHandle, ConnectionProvider, ExecuteError, SqlResult, SqlStatement};
use hzsql_core::ClientConfig;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
pub struct MemberConnection {
    pub id: u64,
    pub cluster_name: String,
    pub members: Vec<String>,
    alive: AtomicBool,
    shutdowns: AtomicU64,
    /// Table name → row count, updated by `INSERT` statements.
    tables: Mutex<HashMap<String, u64>>,
}

impl MemberConnection {
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn shutdowns(&self) -> u64 {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl ConnectionHandle for MemberConnection {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn execute(&self, statement: &SqlStatement) -> Result<SqlResult, ExecuteError> {
        if !self.is_alive() {
            return Err(ExecuteError::NotRunning);
        }
        let sql = statement.sql.trim();
        if let Some(table) = sql.strip_prefix("INSERT INTO ") {
            let mut tables = self.tables.lock().unwrap();
            *tables.entry(table.to_string()).or_insert(0) += 1;
            return Ok(SqlResult::UpdateCount(1));
        }
        if let Some(table) = sql.strip_prefix("SELECT COUNT(*) FROM ") {
            let count = self.tables.lock().unwrap().get(table).copied().unwrap_or(0);
            return Ok(SqlResult::Rows {
                columns: vec!["count".to_string()],
                rows: vec![vec![Some(count.to_string())]],
            });
        }
        Err(ExecuteError::Failed(format!("unsupported statement: {sql}")))
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MemoryCluster {
    pub connect_delay: Duration,
    pub refuse: AtomicBool,
    next_id: AtomicU64,
    connections: Mutex<Vec<Arc<MemberConnection>>>,
}

impl MemoryCluster {
    pub fn with_delay(connect_delay: Duration) -> Self {
        Self {
            connect_delay,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn connection(&self, index: usize) -> Arc<MemberConnection> {
        Arc::clone(&self.connections.lock().unwrap()[index])
    }
}

impl ConnectionProvider for MemoryCluster {
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn ConnectionHandle>, ConnectError> {
        let timeout = config.connection_timeout();
        if self.connect_delay > timeout {
            std::thread::sleep(timeout);
            return Err(ConnectError::Timeout {
                members: config.cluster_members.join(","),
                timeout_ms: config.connection_timeout_ms,
            });
        }
        std::thread::sleep(self.connect_delay);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ConnectError::Unreachable {
                cluster: config.cluster_name.clone(),
                members: config.cluster_members.join(","),
                message: "connection refused".to_string(),
            });
        }
        let connection = Arc::new(MemberConnection {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            cluster_name: config.cluster_name.clone(),
            members: config.cluster_members.clone(),
            alive: AtomicBool::new(true),
            shutdowns: AtomicU64::new(0),
            tables: Mutex::new(HashMap::new()),
        });
        self.connections.lock().unwrap().push(Arc::clone(&connection));
        Ok(connection)
    }
}

pub fn same_handle(a: &Arc<dyn ConnectionHandle>, b: &Arc<dyn ConnectionHandle>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
