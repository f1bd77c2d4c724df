use chrono::{DateTime, Utc};

/// A session resolved from a valid token.
///
/// Sessions are never stored server-side: the token carries the user id and
/// the window is measured from the user's last login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The ID of the user this session belongs to.
    pub user_id: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The timestamp of the login that opened the session.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Milliseconds left until the session expires, as seen at `now`.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_milliseconds().max(0)
    }
}
