use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Represents a user in the static roster.
///
/// Only the identity and display name are ever serialized outward.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The unique identifier for the user.
    pub id: String,
    /// The user's first name.
    pub first_name: String,
    /// The user's last name.
    pub last_name: String,
    /// The user's email address.
    #[serde(skip_serializing, default)]
    pub email: Option<String>,
    /// The user's secret: plain text, or an Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: Zeroizing<String>,
    /// The timestamp of the user's last successful login.
    #[serde(skip)]
    pub session_start: Option<DateTime<Utc>>,
}

impl User {
    /// Creates a user who has never logged in.
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            password: Zeroizing::new(password.into()),
            session_start: None,
        }
    }
}
