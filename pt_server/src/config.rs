//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use poker_tables::{TableConfig, entities::Chips};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Template for every table created on startup
    pub table_defaults: TableConfig,
    /// Number of tables to create on startup
    pub num_tables: usize,
    /// Balance a player starts with the first time the ledger sees them
    pub starting_balance: Chips,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `num_tables_override` - Optional number of tables override (from CLI args)
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        num_tables_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_required_or("SERVER_BIND", "127.0.0.1:6969")?,
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{raw}' is not a socket address"),
            })?),
            Err(_) => None,
        };

        let defaults = TableConfig::default();
        let table_defaults = TableConfig {
            name: std::env::var("TABLE_NAME").unwrap_or(defaults.name),
            small_blind: parse_env_or("TABLE_SMALL_BLIND", defaults.small_blind),
            big_blind: parse_env_or("TABLE_BIG_BLIND", defaults.big_blind),
            rake_percent: parse_env_or("TABLE_RAKE_PERCENT", defaults.rake_percent),
            rake_cap: parse_env_or("TABLE_RAKE_CAP", defaults.rake_cap),
            max_seats: parse_env_or("TABLE_MAX_SEATS", defaults.max_seats),
            turn_time_secs: parse_env_or("TABLE_TURN_TIME_SECS", defaults.turn_time_secs),
            disconnect_grace_secs: parse_env_or(
                "DISCONNECT_GRACE_SECS",
                defaults.disconnect_grace_secs,
            ),
            ..defaults
        };

        let num_tables = num_tables_override.unwrap_or_else(|| parse_env_or("MAX_TABLES", 1));

        Ok(ServerConfig {
            bind,
            metrics_bind,
            table_defaults,
            num_tables,
            starting_balance: parse_env_or("STARTING_BALANCE", 10_000),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_tables == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_TABLES".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if self.starting_balance == 0 {
            return Err(ConfigError::Invalid {
                var: "STARTING_BALANCE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        // Blinds, rake and seat limits are the table's own rules.
        self.table_defaults
            .validate()
            .map_err(|e| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason: e.to_string(),
            })
    }

    /// Config for the `index`th table created on startup.
    pub fn table_config(&self, index: usize) -> TableConfig {
        TableConfig {
            name: format!("{} {}", self.table_defaults.name, index + 1),
            ..self.table_defaults.clone()
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like `parse_env_or`, but a value that is set and unparseable is an error.
fn parse_required_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("cannot parse '{raw}'"),
    })
}
