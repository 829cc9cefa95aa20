//! Driver seam.
//!
//! The session talks to the server only through these two traits, so the
//! MySQL driver and in-memory test doubles are interchangeable.

use async_trait::async_trait;
use serde_json::Value;

use common::errors::AppResult;
use common::models::{ConnectParams, QueryResult};

/// One statement with its bound values.
pub type Statement<'a> = (&'a str, &'a [Value]);

/// A live server session.
///
/// Not reentrant: every method takes `&mut self`.
#[async_trait]
pub trait SqlDriver: Send {
    /// Runs one statement and returns the affected row count.
    ///
    /// Without params the text protocol is used (required for `USE`).
    async fn execute(&mut self, sql: &str, params: &[Value]) -> AppResult<u64>;

    /// Runs the statements in one transaction and commits.
    async fn execute_all(&mut self, statements: &[Statement<'_>]) -> AppResult<u64>;

    /// Runs a query and materialises every row.
    ///
    /// Column descriptors are returned even when no row matches.
    async fn fetch(&mut self, sql: &str, params: &[Value]) -> AppResult<QueryResult>;

    /// Ends the server session.
    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// Opens driver sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates against the server.
    async fn connect(&self, params: &ConnectParams) -> AppResult<Box<dyn SqlDriver>>;
}
