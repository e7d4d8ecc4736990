//! A caller's view of a shared connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hzsql_core::{ConfigFactory, JdbcUrl};

use crate::cache::ConnectionCache;
use crate::error::ClientError;
use crate::handle::{ConnectionHandle, SqlResult, SqlStatement};

/// SQL client bound to the cached connection for one [`JdbcUrl`].
///
/// Every client for the same url holds the same underlying connection.
/// Shutting a client down shuts that connection down for all of them.
pub struct SqlClient {
    url: JdbcUrl,
    handle: Arc<dyn ConnectionHandle>,
    cache: Arc<ConnectionCache>,
    closed: AtomicBool,
}

impl SqlClient {
    /// Acquire the shared connection for `url` from `cache`.
    pub fn connect(
        url: JdbcUrl,
        cache: Arc<ConnectionCache>,
        configs: &dyn ConfigFactory,
    ) -> Result<Self, ClientError> {
        let handle = cache.acquire(&url, configs)?;
        Ok(Self {
            url,
            handle,
            cache,
            closed: AtomicBool::new(false),
        })
    }

    /// Execute `statement`, defaulting its schema to the url's schema.
    pub fn execute(&self, mut statement: SqlStatement) -> Result<SqlResult, ClientError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::ClientShutdown(self.url.raw().to_string()));
        }
        statement
            .schema
            .get_or_insert_with(|| self.url.schema().to_string());
        tracing::trace!(sql = %statement.sql, schema = ?statement.schema, "executing statement");
        Ok(self.handle.execute(&statement)?)
    }

    /// Shut down this client's connection and drop it from the cache.
    ///
    /// Only the connection this client holds is shut down. If the cache has
    /// since replaced it, the newer connection stays cached and running.
    /// Later calls are no-ops.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cache.shutdown_handle(&self.url, &self.handle);
    }

    /// Whether this client's connection is alive.
    pub fn is_running(&self) -> bool {
        self.handle.is_alive()
    }

    pub fn handle(&self) -> &Arc<dyn ConnectionHandle> {
        &self.handle
    }

    pub fn url(&self) -> &JdbcUrl {
        &self.url
    }
}

impl std::fmt::Debug for SqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlClient")
            .field("authority", &self.url.authority())
            .field("schema", &self.url.schema())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
