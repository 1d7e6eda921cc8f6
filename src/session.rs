//! Session data structure compatible with express-session

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Cookie data structure compatible with express-session
///
/// Only `maxAge` matters to the store. Every other attribute (`expires`,
/// `httpOnly`, `originalMaxAge`, ...) is kept as-is so the cookie round-trips
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Remaining lifetime in milliseconds
    #[serde(rename = "maxAge", default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,

    /// Remaining cookie attributes
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl SessionCookie {
    /// Create a cookie with the given max age in milliseconds
    pub fn new(max_age_ms: i64) -> Self {
        Self {
            max_age: Some(max_age_ms),
            attributes: Map::new(),
        }
    }
}

/// Session object as stored in the `data` column
///
/// An empty `SessionData` serializes as `{}`, which is also what a lookup of a
/// missing or expired session yields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    /// Cookie information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<SessionCookie>,

    /// Additional session data (flattened at same level as cookie)
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl SessionData {
    /// Create an empty session whose cookie lives for `max_age_ms`
    pub fn with_max_age(max_age_ms: i64) -> Self {
        Self {
            cookie: Some(SessionCookie::new(max_age_ms)),
            data: Map::new(),
        }
    }

    /// Cookie max age in milliseconds, if the session carries one
    pub fn max_age(&self) -> Option<i64> {
        self.cookie.as_ref().and_then(|c| c.max_age)
    }

    /// Absolute expiry in epoch milliseconds for a write happening at `now_ms`.
    ///
    /// A session without a cookie max age expires immediately.
    pub fn expires_at(&self, now_ms: i64) -> i64 {
        now_ms.saturating_add(self.max_age().unwrap_or(0))
    }

    /// Get a value from session data
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value in session data
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.to_string(), v);
        }
    }

    /// Remove a value from session data
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Clear all session data (except cookie)
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Check if session data is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_session_serializes_as_empty_object() {
        let json = serde_json::to_string(&SessionData::default()).unwrap();
        assert_eq!(json, "{}");

        let parsed: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, SessionData::default());
    }

    #[test]
    fn test_cookie_attributes_round_trip() {
        let raw = json!({
            "cookie": {
                "maxAge": 5000,
                "originalMaxAge": 5000,
                "httpOnly": true,
                "path": "/"
            },
            "user": 1
        });

        let session: SessionData = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(session.max_age(), Some(5000));
        assert_eq!(session.get::<i64>("user"), Some(1));

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_expires_at() {
        let session = SessionData::with_max_age(5000);
        assert_eq!(session.expires_at(1_000), 6_000);

        // No cookie means already expired
        assert_eq!(SessionData::default().expires_at(1_000), 1_000);

        let mut no_max_age = SessionData::default();
        no_max_age.cookie = Some(SessionCookie::default());
        assert_eq!(no_max_age.expires_at(1_000), 1_000);
    }

    #[test]
    fn test_data_helpers() {
        let mut session = SessionData::with_max_age(1000);
        assert!(session.is_empty());

        session.set("user", "alice");
        assert!(session.contains("user"));
        assert_eq!(session.get::<String>("user"), Some("alice".to_string()));

        assert_eq!(session.remove("user"), Some(json!("alice")));
        session.set("views", 3);
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.max_age(), Some(1000));
    }
}
