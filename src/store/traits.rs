//! Session store trait

use async_trait::async_trait;

use crate::error::{Failed, WriteResult};
use crate::session::SessionData;

/// Trait for session storage backends
///
/// Mirrors the express-session store interface. Operations never panic on a
/// storage failure: each error comes back as a [`Failed`] carrying the value
/// a caller may substitute for the missing result.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Get a live session by ID
    ///
    /// A missing or expired session yields an empty `SessionData` (`{}`).
    async fn get(&self, sid: &str) -> Result<SessionData, Failed<SessionData>>;

    /// Create or fully replace a session
    ///
    /// The expiry is derived from the session cookie's `maxAge`.
    async fn set(&self, sid: &str, session: &SessionData) -> WriteResult;

    /// Destroy/delete a session, expired or not
    async fn destroy(&self, sid: &str) -> WriteResult;

    /// Touch a session - update its expiry without modifying data
    async fn touch(&self, sid: &str, session: &SessionData) -> WriteResult;

    /// Count every stored session, including expired ones not yet swept
    ///
    /// Falls back to `f64::INFINITY` on failure.
    async fn length(&self) -> Result<u64, Failed<f64>>;

    /// Delete all sessions
    async fn clear(&self) -> WriteResult;

    /// Get every stored session, including expired ones not yet swept
    async fn all(&self) -> Result<Vec<SessionData>, Failed<Vec<SessionData>>>;
}
