//! SQL text for the session table
//!
//! Every statement is built once per store and handed to the connection's
//! prepared statement cache, so each call reuses an already compiled query.

use rusqlite::Connection;

use crate::error::SessionError;

/// SQLite's clock as epoch milliseconds
const NOW_MS: &str = "CAST(ROUND((julianday('now') - 2440587.5) * 86400000) AS INTEGER)";

/// Reject table names that are not plain identifiers.
///
/// The name is interpolated into SQL text, so anything beyond
/// `[A-Za-z_][A-Za-z0-9_]*` is refused.
pub(crate) fn validate_table_name(name: &str) -> Result<(), SessionError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(SessionError::config(format!(
            "invalid table name {:?}: expected [A-Za-z_][A-Za-z0-9_]*",
            name
        )))
    }
}

/// Parameterized statements for one session table
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub create_table: String,
    pub set: String,
    pub get: String,
    pub destroy: String,
    pub touch: String,
    pub length: String,
    pub clear: String,
    pub all: String,
    pub sweep: String,
}

impl Statements {
    /// Build the statements for `table`. The name must already be validated.
    pub fn new(table: &str) -> Self {
        Self {
            create_table: format!(
                "CREATE TABLE IF NOT EXISTS {table} (\
                 sid TEXT PRIMARY KEY, \
                 expires TIMESTAMP NOT NULL, \
                 data JSON NOT NULL)"
            ),
            set: format!("INSERT OR REPLACE INTO {table} (sid, expires, data) VALUES (?1, ?2, ?3)"),
            get: format!("SELECT data FROM {table} WHERE sid = ?1 AND {NOW_MS} < expires"),
            destroy: format!("DELETE FROM {table} WHERE sid = ?1"),
            touch: format!("UPDATE {table} SET expires = ?1 WHERE sid = ?2"),
            length: format!("SELECT COUNT(*) FROM {table}"),
            clear: format!("DELETE FROM {table}"),
            all: format!("SELECT data FROM {table} ORDER BY rowid"),
            sweep: format!("DELETE FROM {table} WHERE expires < {NOW_MS}"),
        }
    }

    /// Statements run through the prepared statement cache
    fn cached(&self) -> [&str; 8] {
        [
            &self.set,
            &self.get,
            &self.destroy,
            &self.touch,
            &self.length,
            &self.clear,
            &self.all,
            &self.sweep,
        ]
    }

    /// Compile every cached statement once.
    ///
    /// The table must exist. The cache is sized so none of them is evicted.
    pub fn prepare(&self, conn: &Connection) -> Result<(), SessionError> {
        let cached = self.cached();
        conn.set_prepared_statement_cache_capacity(cached.len().max(16));
        for sql in cached {
            conn.prepare_cached(sql)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("sessions").is_ok());
        assert!(validate_table_name("_web_sessions2").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2sessions").is_err());
        assert!(validate_table_name("sessions; DROP TABLE users").is_err());
        assert!(validate_table_name("my-sessions").is_err());
    }

    #[test]
    fn test_statements_use_table_name() {
        let statements = Statements::new("web_sessions");
        assert!(statements.create_table.contains("IF NOT EXISTS web_sessions"));
        assert!(statements.set.starts_with("INSERT OR REPLACE INTO web_sessions"));
        assert!(statements.sweep.contains("expires <"));
    }

    #[test]
    fn test_prepare_compiles_everything() {
        let conn = Connection::open_in_memory().unwrap();
        let statements = Statements::new("sessions");

        // Table missing: compilation fails
        assert!(statements.prepare(&conn).is_err());

        conn.execute_batch(&statements.create_table).unwrap();
        statements.prepare(&conn).unwrap();
    }

    #[test]
    fn test_engine_clock_is_epoch_millis() {
        let conn = Connection::open_in_memory().unwrap();
        let engine_now: i64 = conn
            .query_row(&format!("SELECT {NOW_MS}"), [], |row| row.get(0))
            .unwrap();
        let now = chrono::Utc::now().timestamp_millis();
        assert!((engine_now - now).abs() < 5_000);
    }
}
