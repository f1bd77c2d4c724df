use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// The wire tag of the login command.
pub const LOGIN: &str = "login";
/// The wire tag of the logout command.
pub const LOGOUT: &str = "logout";
/// The wire tag of the continue command.
pub const CONTINUE: &str = "continue";
/// The wire tag of the delete-slot command.
pub const DELETE_SLOT: &str = "delete-slot";

/// The inbound command envelope as it appears on the wire.
///
/// `from`, `to` and `data` are accepted for forward compatibility; no
/// command reads them yet.
#[derive(Deserialize, Default)]
pub struct CommandEnvelope {
    #[serde(rename = "command", default)]
    pub kind: Option<String>,
    #[serde(rename = "user", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: Option<sonic_rs::Value>,
}

impl CommandEnvelope {
    /// Parses an envelope from a request body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        sonic_rs::from_slice(body).map_err(|e| AppError::Decode(e.to_string()))
    }
}

/// A decoded command.
pub enum Command {
    /// Check `secret` against the stored secret of `user_id`.
    Login { user_id: String, secret: String },
    /// Clear the session cookie.
    Logout,
    /// Report the state of the current session.
    Continue,
    /// Delete the document stored under `key`.
    DeleteSlot { key: String },
    /// Any other tag, including an absent one.
    Unknown(String),
}

impl Command {
    /// The tag mirrored into the reply's `type`.
    pub fn tag(&self) -> &str {
        match self {
            Command::Login { .. } => LOGIN,
            Command::Logout => LOGOUT,
            Command::Continue => CONTINUE,
            Command::DeleteSlot { .. } => DELETE_SLOT,
            Command::Unknown(tag) => tag.as_str(),
        }
    }
}

impl From<CommandEnvelope> for Command {
    fn from(envelope: CommandEnvelope) -> Self {
        let kind = envelope.kind.unwrap_or_default();
        match kind.as_str() {
            LOGIN => Command::Login {
                user_id: envelope.user_id.unwrap_or_default(),
                secret: envelope.text.unwrap_or_default(),
            },
            LOGOUT => Command::Logout,
            CONTINUE => Command::Continue,
            DELETE_SLOT => Command::DeleteSlot {
                key: envelope.text.unwrap_or_default(),
            },
            _ => Command::Unknown(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(body: &str) -> Command {
        Command::from(CommandEnvelope::parse(body.as_bytes()).unwrap())
    }

    #[test]
    fn login_takes_user_and_text() {
        match command(r#"{"command":"login","user":"alpha","text":"omega"}"#) {
            Command::Login { user_id, secret } => {
                assert_eq!(user_id, "alpha");
                assert_eq!(secret, "omega");
            }
            other => panic!("unexpected command {}", other.tag()),
        }
    }

    #[test]
    fn client_envelopes_with_null_data_parse() {
        assert!(matches!(command(r#"{"command":"logout","data":null}"#), Command::Logout));
        assert!(matches!(command(r#"{"command":"continue","data":null}"#), Command::Continue));
    }

    #[test]
    fn delete_slot_takes_text_as_key() {
        match command(r#"{"command":"delete-slot","text":"slot-42"}"#) {
            Command::DeleteSlot { key } => assert_eq!(key, "slot-42"),
            other => panic!("unexpected command {}", other.tag()),
        }
    }

    #[test]
    fn timestamps_and_data_are_accepted() {
        let envelope = CommandEnvelope::parse(
            br#"{"command":"continue","from":"2024-01-01T00:00:00Z","to":"2024-01-02T00:00:00Z","data":{"a":[1,2]}}"#,
        )
        .unwrap();
        assert!(envelope.from.is_some());
        assert!(envelope.to.is_some());
        assert!(envelope.data.is_some());
    }

    #[test]
    fn unknown_and_missing_tags_are_kept() {
        assert_eq!(command(r#"{"command":"reboot"}"#).tag(), "reboot");
        assert_eq!(command(r#"{}"#).tag(), "");
        assert_eq!(command(r#"{"command":null}"#).tag(), "");
    }

    #[test]
    fn malformed_bodies_fail_to_decode() {
        for body in ["", "{", "42", r#"{"command":5}"#, r#"{"from":"yesterday"}"#] {
            assert!(matches!(
                CommandEnvelope::parse(body.as_bytes()),
                Err(AppError::Decode(_))
            ));
        }
    }
}
