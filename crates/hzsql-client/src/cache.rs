//! Connection cache — one live connection per endpoint identity.
//!
//! Connections are keyed by [`JdbcUrl`] (raw url plus properties) and created
//! lazily through the injected [`ConnectionProvider`].
//!
//! # Architecture
//!
//! ```text
//! acquire(url)
//!   → slots map: find or insert the slot for url   (map lock, never held while connecting)
//!     → slot lock: handle alive?                    (per-key, serializes same-url callers)
//!       → yes → reuse
//!       → no  → build config, connect, store        (only same-url callers wait)
//! shutdown(url)
//!   → slot lock: retire slot, shut handle down, unlink from map
//! shutdown_handle(url, handle)
//!   → same as shutdown, but only if the slot still holds `handle`
//! ```
//!
//! A slot is retired when its handle is shut down or its construction fails.
//! Callers that were waiting on a retired slot go back to the map, which by
//! then holds a fresh slot (or none), so a shut-down handle is never handed
//! out again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hzsql_core::{ConfigFactory, JdbcUrl};

use crate::error::ClientError;
use crate::handle::{ConnectionHandle, ConnectionProvider};

/// Per-url cache entry.
#[derive(Debug, Default)]
struct Slot {
    handle: Option<Arc<dyn ConnectionHandle>>,
    /// Set once the slot has been unlinked (or is about to be); never reused.
    retired: bool,
}

type SharedSlot = Arc<Mutex<Slot>>;

#[derive(Debug, Default)]
struct Counters {
    created: AtomicU64,
    reused: AtomicU64,
    replaced: AtomicU64,
    shutdowns: AtomicU64,
    failures: AtomicU64,
}

/// Cache-wide statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Identities currently cached.
    pub entries: usize,
    /// Connections constructed.
    pub created: u64,
    /// Acquires served by an existing live connection.
    pub reused: u64,
    /// Dead connections found and replaced.
    pub replaced: u64,
    /// Cached connections shut down by `shutdown()`, `shutdown_handle()` or `drain()`.
    pub shutdowns: u64,
    /// Failed constructions.
    pub failures: u64,
}

/// Maps endpoint identities to shared live connections.
///
/// Concurrent `acquire` calls for the same url construct at most one
/// connection; calls for different urls never wait on each other.
pub struct ConnectionCache {
    slots: Mutex<HashMap<JdbcUrl, SharedSlot>>,
    provider: Arc<dyn ConnectionProvider>,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConnectionCache {
    /// Create an empty cache that builds connections through `provider`.
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            provider,
            counters: Counters::default(),
        }
    }

    /// Return the live connection for `url`, creating it if absent or dead.
    ///
    /// Construction errors are returned to the caller and leave no entry
    /// behind; the cache does not retry.
    pub fn acquire(
        &self,
        url: &JdbcUrl,
        configs: &dyn ConfigFactory,
    ) -> Result<Arc<dyn ConnectionHandle>, ClientError> {
        loop {
            let slot = self.slot_or_insert(url);
            let mut entry = lock(&slot);
            if entry.retired {
                continue;
            }

            if let Some(handle) = &entry.handle {
                if handle.is_alive() {
                    self.counters.reused.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        authority = %url.authority(),
                        schema = %url.schema(),
                        "reused cached connection"
                    );
                    return Ok(Arc::clone(handle));
                }
                self.counters.replaced.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    authority = %url.authority(),
                    schema = %url.schema(),
                    "replacing dead cached connection"
                );
            }

            return match self.construct(url, configs) {
                Ok(handle) => {
                    entry.handle = Some(Arc::clone(&handle));
                    self.counters.created.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        authority = %url.authority(),
                        schema = %url.schema(),
                        "created new connection"
                    );
                    Ok(handle)
                }
                Err(e) => {
                    entry.handle = None;
                    entry.retired = true;
                    self.unlink(url, &slot);
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        authority = %url.authority(),
                        error = %e,
                        "connection construction failed"
                    );
                    Err(e)
                }
            };
        }
    }

    /// Shut down the connection for `url` and remove its entry.
    ///
    /// Returns `false` if nothing was cached for `url`. An `acquire` racing
    /// with this call either gets the old connection before it is shut down
    /// or a new one created afterwards.
    pub fn shutdown(&self, url: &JdbcUrl) -> bool {
        let Some(slot) = self.slot(url) else {
            return false;
        };
        let mut entry = lock(&slot);
        if entry.retired {
            return false;
        }

        entry.retired = true;
        let handle = entry.handle.take();
        if let Some(handle) = &handle {
            handle.shutdown();
        }
        self.unlink(url, &slot);
        drop(entry);

        if handle.is_some() {
            self.counters.shutdowns.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                authority = %url.authority(),
                schema = %url.schema(),
                "shut down cached connection"
            );
        }
        handle.is_some()
    }

    /// Shut down `handle` and remove the entry for `url` if it still caches `handle`.
    ///
    /// A handle that was already replaced (after a shutdown or because it
    /// died) is shut down on its own; the connection cached in its place is
    /// left untouched. Returns `true` if the entry was removed.
    pub fn shutdown_handle(&self, url: &JdbcUrl, handle: &Arc<dyn ConnectionHandle>) -> bool {
        if let Some(slot) = self.slot(url) {
            let mut entry = lock(&slot);
            let cached = entry
                .handle
                .as_ref()
                .is_some_and(|current| same_handle(current, handle));
            if !entry.retired && cached {
                entry.retired = true;
                entry.handle = None;
                handle.shutdown();
                self.unlink(url, &slot);
                drop(entry);

                self.counters.shutdowns.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    authority = %url.authority(),
                    schema = %url.schema(),
                    "shut down cached connection"
                );
                return true;
            }
        }

        handle.shutdown();
        tracing::debug!(
            authority = %url.authority(),
            schema = %url.schema(),
            "shut down stale connection; cache entry kept"
        );
        false
    }

    /// Whether a connection is cached for `url` and reports itself alive.
    pub fn is_running(&self, url: &JdbcUrl) -> bool {
        let Some(slot) = self.slot(url) else {
            return false;
        };
        let entry = lock(&slot);
        !entry.retired && entry.handle.as_ref().is_some_and(|h| h.is_alive())
    }

    /// Shut down every cached connection and empty the cache.
    ///
    /// Returns the number of connections shut down. The cache stays usable.
    pub fn drain(&self) -> usize {
        let slots = std::mem::take(&mut *lock(&self.slots));
        tracing::info!(entries = slots.len(), "connection cache draining started");

        let mut closed = 0;
        for (url, slot) in slots {
            let mut entry = lock(&slot);
            entry.retired = true;
            if let Some(handle) = entry.handle.take() {
                handle.shutdown();
                closed += 1;
                tracing::debug!(authority = %url.authority(), "closed connection during drain");
            }
        }

        self.counters
            .shutdowns
            .fetch_add(closed as u64, Ordering::Relaxed);
        tracing::info!(closed = closed, "connection cache drain complete");
        closed
    }

    /// Number of cached identities, including ones whose connection is being constructed.
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, url: &JdbcUrl) -> bool {
        lock(&self.slots).contains_key(url)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            created: self.counters.created.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            replaced: self.counters.replaced.load(Ordering::Relaxed),
            shutdowns: self.counters.shutdowns.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Log cache statistics at `tracing::info` level.
    pub fn log_stats(&self) {
        let stats = self.stats();
        tracing::info!(
            entries = stats.entries,
            created = stats.created,
            reused = stats.reused,
            replaced = stats.replaced,
            shutdowns = stats.shutdowns,
            failures = stats.failures,
            "connection cache statistics"
        );
    }

    fn slot(&self, url: &JdbcUrl) -> Option<SharedSlot> {
        lock(&self.slots).get(url).cloned()
    }

    fn slot_or_insert(&self, url: &JdbcUrl) -> SharedSlot {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(url.clone()).or_default())
    }

    /// Remove `slot` from the map if it is still the one registered for `url`.
    fn unlink(&self, url: &JdbcUrl, slot: &SharedSlot) {
        let mut slots = lock(&self.slots);
        if slots.get(url).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(url);
        }
    }

    fn construct(
        &self,
        url: &JdbcUrl,
        configs: &dyn ConfigFactory,
    ) -> Result<Arc<dyn ConnectionHandle>, ClientError> {
        let config = configs
            .client_config(url)
            .map_err(|e| ClientError::construction(url.raw(), e))?;
        self.provider
            .connect(&config)
            .map_err(|e| ClientError::construction(url.raw(), e))
    }
}

fn same_handle(a: &Arc<dyn ConnectionHandle>, b: &Arc<dyn ConnectionHandle>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ── Debug impl (cannot auto-derive due to dyn trait) ────────────────

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
