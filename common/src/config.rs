//! Service configuration.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the working directory.

/// Default HTTP bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default MySQL port used when a login omits one.
pub const DEFAULT_DB_PORT: u16 = 3306;
/// Schema the farm screens and reports run against.
pub const DEFAULT_FARM_DATABASE: &str = "farmer_schema";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Service name, used in logs and response metadata.
    pub service_name: String,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// MySQL port assumed when a login does not give one.
    pub db_port: u16,
    /// Database holding the Product/Inventory/Sale/Customer tables.
    pub farm_database: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "admin-service".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_port: DEFAULT_DB_PORT,
            farm_database: DEFAULT_FARM_DATABASE.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn load_with_service(service_name: &str) -> Self {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: lookup("SERVER_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            db_port: lookup("DB_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.db_port),
            farm_database: lookup("FARM_DATABASE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.farm_database),
        }
    }
}

/// Parses `.env` style content into key/value pairs.
///
/// Blank lines and `#` comments are skipped.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Loads `.env` from the working directory (best-effort, no error if missing).
///
/// Variables already present in the environment win.
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for (key, value) in parse_dotenv(&content) {
        if std::env::var(&key).is_err() {
            std::env::set_var(key, value);
        }
    }
}
