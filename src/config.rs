//! Session store configuration

use rusqlite::Connection;
use std::time::Duration;

/// Default name of the session table
pub const DEFAULT_TABLE_NAME: &str = "sessions";

/// Configuration for [`SqliteStore`](crate::SqliteStore)
///
/// `connection` and `ttl` are required; [`SqliteStore::new`](crate::SqliteStore::new)
/// rejects a configuration missing either of them before touching the database.
#[derive(Debug)]
pub struct SqliteStoreConfig {
    /// Already-open database connection the store takes ownership of
    pub connection: Option<Connection>,

    /// Name of the session table (default: "sessions")
    pub table_name: String,

    /// Time-to-live. Also the interval between expiry sweeps.
    pub ttl: Option<Duration>,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            connection: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            ttl: None,
        }
    }
}

impl SqliteStoreConfig {
    /// Create a configuration from a connection and a TTL
    pub fn new(connection: Connection, ttl: Duration) -> Self {
        Self {
            connection: Some(connection),
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    /// Set the database connection
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Set the session table name (default: "sessions")
    pub fn with_table_name<S: Into<String>>(mut self, table_name: S) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Set the time-to-live
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the time-to-live in milliseconds
    pub fn with_ttl_ms(self, ttl_ms: u64) -> Self {
        self.with_ttl(Duration::from_millis(ttl_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SqliteStoreConfig::default();
        assert!(config.connection.is_none());
        assert!(config.ttl.is_none());
        assert_eq!(config.table_name, "sessions");
    }

    #[test]
    fn test_builder() {
        let conn = Connection::open_in_memory().unwrap();
        let config = SqliteStoreConfig::default()
            .with_connection(conn)
            .with_table_name("web_sessions")
            .with_ttl_ms(1500);

        assert!(config.connection.is_some());
        assert_eq!(config.table_name, "web_sessions");
        assert_eq!(config.ttl, Some(Duration::from_millis(1500)));
        assert!(format!("{:?}", config).contains("web_sessions"));
    }
}
