//! Connection manager.
//!
//! A [`DbSession`] owns at most one driver handle. Every operation borrows
//! the session mutably, so one statement runs at a time per session.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use common::errors::{AppError, AppResult};
use common::models::{ConnectParams, QueryResult, SessionInfo};
use common::utils::IdentifierValidator;

use crate::driver::{Connector, SqlDriver, Statement};
use crate::mysql::MySqlConnector;

/// An explicitly owned database session.
pub struct DbSession {
    connector: Arc<dyn Connector>,
    driver: Option<Box<dyn SqlDriver>>,
    params: Option<ConnectParams>,
    scope: Option<String>,
}

impl DbSession {
    /// Creates a disconnected session that opens handles through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            driver: None,
            params: None,
            scope: None,
        }
    }

    /// Creates a disconnected session for a MySQL server.
    pub fn mysql() -> Self {
        Self::new(Arc::new(MySqlConnector))
    }

    /// Authenticates and stores the handle.
    ///
    /// Any handle already held is closed first, so a failed attempt leaves
    /// the session disconnected.
    pub async fn try_connect(&mut self, params: &ConnectParams) -> AppResult<()> {
        self.close().await;

        match self.connector.connect(params).await {
            Ok(driver) => {
                info!(
                    host = %params.host,
                    port = params.port,
                    user = %params.username,
                    "Successfully connected to database server"
                );
                self.driver = Some(driver);
                self.scope = params.database.clone();
                self.params = Some(params.clone());
                Ok(())
            }
            Err(e) => {
                error!(host = %params.host, user = %params.username, error = %e, "Connection failed");
                Err(e)
            }
        }
    }

    /// Boolean form of [`DbSession::try_connect`].
    pub async fn connect(&mut self, params: &ConnectParams) -> bool {
        self.try_connect(params).await.is_ok()
    }

    /// Releases the handle if one is held.
    pub async fn close(&mut self) {
        self.params = None;
        self.scope = None;
        if let Some(driver) = self.driver.take() {
            match driver.close().await {
                Ok(()) => info!("Connection closed"),
                Err(e) => warn!(error = %e, "Connection closed with error"),
            }
        }
    }

    /// Whether a handle is held.
    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    /// Last database selected on this handle.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Session state without credentials.
    pub fn info(&self) -> SessionInfo {
        match (&self.driver, &self.params) {
            (Some(_), Some(params)) => SessionInfo {
                connected: true,
                host: Some(params.host.clone()),
                port: Some(params.port),
                username: Some(params.username.clone()),
                scope: self.scope.clone(),
                role: None,
            },
            _ => SessionInfo::disconnected(),
        }
    }

    /// Makes `database` the active scope for later statements.
    pub async fn use_database(&mut self, database: &str) -> AppResult<()> {
        let sql = format!("USE {}", IdentifierValidator::quote(database)?);
        self.driver()?.execute(&sql, &[]).await?;
        self.scope = Some(database.to_string());
        Ok(())
    }

    pub(crate) async fn execute(&mut self, sql: &str, params: &[Value]) -> AppResult<u64> {
        self.driver()?.execute(sql, params).await
    }

    pub(crate) async fn execute_all(&mut self, statements: &[Statement<'_>]) -> AppResult<u64> {
        self.driver()?.execute_all(statements).await
    }

    pub(crate) async fn fetch(&mut self, sql: &str, params: &[Value]) -> AppResult<QueryResult> {
        self.driver()?.fetch(sql, params).await
    }

    fn driver(&mut self) -> AppResult<&mut (dyn SqlDriver + 'static)> {
        self.driver.as_deref_mut().ok_or(AppError::NotConnected)
    }
}
