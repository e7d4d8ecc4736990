//! Collaborator seams for the connection cache.
//!
//! The cache never talks to a cluster itself. A [`ConnectionProvider`] turns a
//! [`ClientConfig`] into a live [`ConnectionHandle`]; the handle answers
//! liveness checks, executes statements and shuts down. Both are injected so
//! tests can count constructions and flip liveness.

use std::fmt;
use std::sync::Arc;

use hzsql_core::ClientConfig;

use crate::error::{ConnectError, ExecuteError};

/// A live connection shared by every caller of the same endpoint identity.
pub trait ConnectionHandle: Send + Sync + fmt::Debug {
    /// Whether the connection is still usable.
    fn is_alive(&self) -> bool;
    fn execute(&self, statement: &SqlStatement) -> Result<SqlResult, ExecuteError>;
    /// Tear the connection down. Called at most once per handle by the cache.
    fn shutdown(&self);
}

/// Creates connections from configuration. May block on the network.
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self, config: &ClientConfig) -> Result<Arc<dyn ConnectionHandle>, ConnectError>;
}

/// A SQL statement passed through to the connection as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    /// Positional parameters, rendered as text.
    pub parameters: Vec<String>,
    /// Schema to resolve unqualified names against.
    pub schema: Option<String>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Builder method: append a positional parameter.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    /// Builder method: set the schema.
    pub fn with_schema(self, schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..self
        }
    }
}

/// Outcome of a statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlResult {
    UpdateCount(u64),
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    },
}

impl SqlResult {
    pub fn update_count(&self) -> Option<u64> {
        match self {
            SqlResult::UpdateCount(n) => Some(*n),
            SqlResult::Rows { .. } => None,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            SqlResult::UpdateCount(_) => 0,
            SqlResult::Rows { rows, .. } => rows.len(),
        }
    }
}
