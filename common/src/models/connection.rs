//! Session and login models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Which screens a user gets after login.
///
/// The role only selects a presentation; the database layer grants the same
/// rights to both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum UserRole {
    /// Generic schema and row administration.
    #[default]
    Admin,
    /// Fixed farm schema with analytics.
    Farmer,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "Admin"),
            UserRole::Farmer => write!(f, "Farmer"),
        }
    }
}

/// Parameters for opening a session.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Initial database, if any.
    pub database: Option<String>,
}

impl ConnectParams {
    /// Creates parameters with the default MySQL port and no database.
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: crate::config::DEFAULT_DB_PORT,
            username: username.into(),
            password: password.into(),
            database: None,
        }
    }

    /// Sets the initial database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Request body for logging in.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Server host.
    #[validate(length(min = 1, max = 255, message = "Host must be 1-255 characters"))]
    pub host: String,
    /// Server port (uses the configured default if not specified).
    pub port: Option<u16>,
    /// Login user.
    #[validate(length(min = 1, max = 128, message = "Username must be 1-128 characters"))]
    pub username: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
    /// Initial database.
    pub database: Option<String>,
    /// Screens to show after login.
    #[serde(default)]
    pub role: UserRole,
}

impl LoginRequest {
    /// Converts the request into connection parameters.
    pub fn into_params(self, default_port: u16) -> (ConnectParams, UserRole) {
        let params = ConnectParams {
            host: self.host,
            port: self.port.unwrap_or(default_port),
            username: self.username,
            password: self.password,
            database: self.database.filter(|d| !d.is_empty()),
        };
        (params, self.role)
    }
}

/// Current session state, without credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SessionInfo {
    /// Whether a handle is held.
    pub connected: bool,
    /// Server host.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Server port.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Login user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Last selected database scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Role chosen at login.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl SessionInfo {
    /// State of a session with no handle.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            host: None,
            port: None,
            username: None,
            scope: None,
            role: None,
        }
    }
}
