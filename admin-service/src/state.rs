//! Application state for the admin service.

use std::sync::Arc;

use admin_core::DbSession;
use common::config::AppConfig;
use common::models::{SessionInfo, UserRole};
use tokio::sync::Mutex;

/// The one database session this process drives, plus the role chosen at
/// login.
pub struct Workspace {
    pub db: DbSession,
    pub role: Option<UserRole>,
}

impl Workspace {
    pub fn info(&self) -> SessionInfo {
        let mut info = self.db.info();
        if info.connected {
            info.role = self.role;
        }
        info
    }
}

/// Application state shared across handlers.
///
/// Handlers lock the workspace for the whole operation, so statements from
/// concurrent requests never interleave on the session.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub workspace: Arc<Mutex<Workspace>>,
}

impl AppState {
    /// Creates a new application state with a disconnected session.
    pub fn new(config: AppConfig, db: DbSession) -> Self {
        Self {
            config,
            workspace: Arc::new(Mutex::new(Workspace { db, role: None })),
        }
    }
}
