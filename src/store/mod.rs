//! Session store implementations

mod sqlite;
mod statements;
mod sweep;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::SessionStore;
