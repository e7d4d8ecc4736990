//! hzsql-client — connection reuse for `jdbc:hazelcast://` endpoints.
//!
//! - **cache**: [`ConnectionCache`], one live connection per endpoint identity
//! - **handle**: the [`ConnectionProvider`] / [`ConnectionHandle`] seams and request types
//! - **client**: [`SqlClient`], a caller's view of a shared connection
//! - **driver**: [`Driver`], url routing and ownership of the cache

pub mod cache;
pub mod client;
pub mod driver;
pub mod error;
pub mod handle;

pub use cache::{CacheStats, ConnectionCache};
pub use client::SqlClient;
pub use driver::Driver;
pub use error::{ClientError, ConnectError, ConstructionError, ExecuteError};
pub use handle::{ConnectionHandle, ConnectionProvider, SqlResult, SqlStatement};
