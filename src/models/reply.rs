use serde::Serialize;

use crate::error::AppError;

/// Payload of the default reply.
pub const UNIMPLEMENTED: &str = "unimplemented";
/// Payload sent when a session is absent, forged or expired.
pub const DENIED: &str = "denied";

/// Reply status.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// What an authenticated `continue` reports.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub first_name: String,
    pub last_name: String,
    /// Milliseconds until the session expires.
    pub session_expires_in: i64,
}

/// Reply payload.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReplyData {
    Text(String),
    Session(SessionInfo),
}

/// The outbound reply envelope.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReplyData>,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            kind: String::new(),
            status: Status::Error,
            data: Some(ReplyData::Text(UNIMPLEMENTED.to_string())),
        }
    }
}

impl Reply {
    /// The default (`error` / `"unimplemented"`) reply tagged with `kind`.
    pub fn for_command(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Marks the reply successful with `data` as payload.
    pub fn ok(mut self, data: Option<ReplyData>) -> Self {
        self.status = Status::Ok;
        self.data = data;
        self
    }

    /// Marks the reply failed with a text payload.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.status = Status::Error;
        self.data = Some(ReplyData::Text(message.into()));
        self
    }

    /// The reply for a body that could not be decoded.
    pub fn decoding_failed(err: &AppError) -> Self {
        Self::default().error(err.to_string())
    }

    /// Whether the status is `ok`.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl From<&str> for ReplyData {
    fn from(text: &str) -> Self {
        ReplyData::Text(text.to_string())
    }
}
