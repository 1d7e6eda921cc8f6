//! # salvo-sqlite-session
//!
//! Express-session compatible session store backed by SQLite.
//!
//! Sessions live in a single table keyed by session ID, with an absolute
//! expiry and the JSON serialized session object. Any middleware speaking the
//! express-session store contract can use it through the [`SessionStore`]
//! trait.
//!
//! ## Features
//!
//! - **Express-session compatible storage**: Session objects are stored as JSON, expiry comes from `cookie.maxAge`
//! - **Prepared statements**: Every query is compiled once and reused
//! - **Expiry sweep**: A background task removes expired rows every TTL, and stops with the store
//! - **Safe fallbacks**: Failed operations return the error alongside a usable default value
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo_sqlite_session::{SessionData, SessionStore, SqliteStore, SqliteStoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let conn = rusqlite::Connection::open("sessions.db")?;
//!     let config = SqliteStoreConfig::new(conn, Duration::from_secs(900))
//!         .with_table_name("sessions");
//!     let store = SqliteStore::new(config)?;
//!
//!     let mut session = SessionData::with_max_age(5_000);
//!     session.set("user", 1);
//!     store.set("abc", &session).await?;
//!
//!     let loaded = store.get("abc").await.unwrap_or_else(|e| e.fallback);
//!     assert_eq!(loaded.get::<i32>("user"), Some(1));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod session;
pub mod store;

pub use config::SqliteStoreConfig;
pub use error::{Failed, SessionError, WriteAck, WriteResult};
pub use session::{SessionCookie, SessionData};
pub use store::{SessionStore, SqliteStore};
