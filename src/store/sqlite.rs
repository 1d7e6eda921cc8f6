//! SQLite session store compatible with express-session stores
//!
//! One row per session:
//! - `sid`: session ID (primary key)
//! - `expires`: absolute expiry in epoch milliseconds
//! - `data`: JSON serialized session data
//!
//! Reads only see rows whose `expires` is still ahead of SQLite's clock.
//! Expired rows stay in the table until the background sweep removes them.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::statements::{validate_table_name, Statements};
use super::sweep::Sweeper;
use super::SessionStore;
use crate::config::SqliteStoreConfig;
use crate::error::{Failed, SessionError, WriteAck, WriteResult};
use crate::session::SessionData;

/// State shared between store handles and the sweep task
pub(crate) struct Shared {
    conn: Mutex<Connection>,
    statements: Statements,
    pub(crate) table_name: String,
}

impl Shared {
    /// Delete every row whose expiry has passed
    pub(crate) fn sweep_expired(&self) -> Result<usize, SessionError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.statements.sweep)?;
        let removed = stmt.execute([])?;
        Ok(removed)
    }
}

/// SQLite session store
///
/// Handles are cheap to clone and share one connection and one expiry sweep.
/// The sweep stops once the last handle is dropped, or earlier through
/// [`SqliteStore::stop_sweep`].
///
/// # Example
///
/// ```rust,ignore
/// use salvo_sqlite_session::{SessionStore, SqliteStore, SqliteStoreConfig};
/// use std::time::Duration;
///
/// let conn = rusqlite::Connection::open("sessions.db")?;
/// let store = SqliteStore::new(SqliteStoreConfig::new(conn, Duration::from_secs(900)))?;
/// let session = store.get("some-sid").await.unwrap_or_else(|e| e.fallback);
/// ```
#[derive(Clone)]
pub struct SqliteStore {
    shared: Arc<Shared>,
    sweeper: Arc<Sweeper>,
    ttl: Duration,
}

impl SqliteStore {
    /// Create a store from a configuration
    ///
    /// Validates the configuration first, then creates the session table if
    /// needed, compiles every statement and starts the expiry sweep. Must be
    /// called from within a Tokio runtime.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SessionError> {
        let SqliteStoreConfig {
            connection,
            table_name,
            ttl,
        } = config;

        let conn = connection.ok_or_else(|| SessionError::config("a database connection is required"))?;
        let ttl = validate_ttl(ttl)?;
        validate_table_name(&table_name)?;
        let runtime = Handle::try_current()
            .map_err(|_| SessionError::config("a Tokio runtime is required to run the expiry sweep"))?;

        let statements = Statements::new(&table_name);
        conn.execute_batch(&statements.create_table)?;
        statements.prepare(&conn)?;

        let shared = Arc::new(Shared {
            conn: Mutex::new(conn),
            statements,
            table_name,
        });
        let sweeper = Sweeper::spawn(&runtime, ttl, Arc::downgrade(&shared));

        let ttl_ms = ttl.as_millis() as u64;
        info!(table = %shared.table_name, ttl_ms, "SQLite session store ready");

        Ok(Self {
            shared,
            sweeper: Arc::new(sweeper),
            ttl,
        })
    }

    /// Open (or create) a database file and build a store on it
    pub fn open<P: AsRef<Path>>(path: P, ttl: Duration) -> Result<Self, SessionError> {
        validate_ttl(Some(ttl))?;
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::new(SqliteStoreConfig::new(conn, ttl))
    }

    /// Build a store on a private in-memory database
    pub fn open_in_memory(ttl: Duration) -> Result<Self, SessionError> {
        let conn = Connection::open_in_memory()?;
        Self::new(SqliteStoreConfig::new(conn, ttl))
    }

    /// Name of the session table
    pub fn table_name(&self) -> &str {
        &self.shared.table_name
    }

    /// Configured time-to-live, also the sweep interval
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Remove expired sessions now, returning how many were deleted
    pub fn sweep_expired(&self) -> Result<usize, SessionError> {
        self.shared.sweep_expired()
    }

    /// Cancel the background sweep for every handle of this store
    pub fn stop_sweep(&self) {
        self.sweeper.stop();
    }

    /// Whether the background sweep is still scheduled
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Run `f` against the store's connection while holding its lock
    pub fn with_connection<R>(&self, f: impl FnOnce(&Connection) -> R) -> R {
        let conn = self.shared.conn.lock();
        f(&conn)
    }

    fn write(&self, sql: &str, params: impl rusqlite::Params) -> Result<WriteAck, SessionError> {
        let conn = self.shared.conn.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let changes = stmt.execute(params)?;
        Ok(WriteAck { changes })
    }

    fn read_data(&self, sid: &str) -> Result<SessionData, SessionError> {
        let conn = self.shared.conn.lock();
        let mut stmt = conn.prepare_cached(&self.shared.statements.get)?;
        let json: Option<String> = stmt
            .query_row(params![sid], |row| row.get(0))
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(SessionData::default()),
        }
    }

    fn count(&self) -> Result<u64, SessionError> {
        let conn = self.shared.conn.lock();
        let mut stmt = conn.prepare_cached(&self.shared.statements.length)?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn read_all(&self) -> Result<Vec<SessionData>, SessionError> {
        let conn = self.shared.conn.lock();
        let mut stmt = conn.prepare_cached(&self.shared.statements.all)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sessions = Vec::with_capacity(rows.len());
        for json in rows {
            sessions.push(serde_json::from_str(&json)?);
        }
        Ok(sessions)
    }
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("table_name", &self.shared.table_name)
            .field("ttl", &self.ttl)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}

fn validate_ttl(ttl: Option<Duration>) -> Result<Duration, SessionError> {
    match ttl {
        Some(ttl) if !ttl.is_zero() => Ok(ttl),
        Some(_) => Err(SessionError::config("ttl must be greater than zero")),
        None => Err(SessionError::config("a ttl is required")),
    }
}

/// Log a failed operation and pair its error with the fallback value
fn failed<F>(op: &'static str, fallback: F) -> impl FnOnce(SessionError) -> Failed<F> {
    move |err| {
        warn!(op, error = %err, "Session store operation failed");
        Failed::new(err, fallback)
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, sid: &str) -> Result<SessionData, Failed<SessionData>> {
        debug!(sid, "Loading session");
        self.read_data(sid)
            .map_err(failed("get", SessionData::default()))
    }

    async fn set(&self, sid: &str, session: &SessionData) -> WriteResult {
        let write = || -> Result<WriteAck, SessionError> {
            let json = serde_json::to_string(session)?;
            let expires = session.expires_at(Utc::now().timestamp_millis());
            debug!(sid, expires, "Saving session");
            self.write(&self.shared.statements.set, params![sid, expires, json])
        };
        write().map_err(failed("set", ()))
    }

    async fn destroy(&self, sid: &str) -> WriteResult {
        debug!(sid, "Destroying session");
        self.write(&self.shared.statements.destroy, params![sid])
            .map_err(failed("destroy", ()))
    }

    async fn touch(&self, sid: &str, session: &SessionData) -> WriteResult {
        let expires = session.expires_at(Utc::now().timestamp_millis());
        debug!(sid, expires, "Touching session");
        self.write(&self.shared.statements.touch, params![expires, sid])
            .map_err(failed("touch", ()))
    }

    async fn length(&self) -> Result<u64, Failed<f64>> {
        self.count().map_err(failed("length", f64::INFINITY))
    }

    async fn clear(&self) -> WriteResult {
        debug!(table = %self.shared.table_name, "Clearing sessions");
        self.write(&self.shared.statements.clear, [])
            .map_err(failed("clear", ()))
    }

    async fn all(&self) -> Result<Vec<SessionData>, Failed<Vec<SessionData>>> {
        self.read_all().map_err(failed("all", Vec::new()))
    }
}
