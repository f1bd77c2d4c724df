//! The session guard.
//!
//! A request is authenticated when its `session` cookie decodes under the
//! process keys, the embedded id names a known user, and the current time is
//! before that user's last login plus [`SESSION_WINDOW_SECS`]. The window is
//! fixed from the login; nothing here extends it.

use chrono::{DateTime, Duration, Utc};
use tower_cookies::Cookies;

use crate::{
    crypto::token::{Claims, TokenCodec},
    error::{AppError, Result},
    models::session::Session,
    state::AppState,
};

/// The name of the session cookie, also the token name.
pub const SESSION_COOKIE: &str = "session";
/// The session window in seconds.
pub const SESSION_WINDOW_SECS: i64 = 5 * 60;

const ID_CLAIM: &str = "id";

/// The session window.
pub fn session_window() -> Duration {
    Duration::seconds(SESSION_WINDOW_SECS)
}

/// The outcome of running the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    Granted(Session),
    Denied,
}

impl Authentication {
    /// Whether the request is authenticated.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Granted(_))
    }

    /// The resolved user id, when authenticated.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Authentication::Granted(session) => Some(session.user_id.as_str()),
            Authentication::Denied => None,
        }
    }
}

/// Mints a session token embedding `user_id`.
pub fn issue_token(codec: &TokenCodec, user_id: &str) -> Result<String> {
    let mut claims = Claims::new();
    claims.insert(ID_CLAIM.to_string(), user_id.to_string());
    codec.encode(SESSION_COOKIE, &claims)
}

/// Extracts the session token from the request cookies.
pub fn token_from(cookies: &Cookies) -> Option<String> {
    cookies
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Runs the guard against `token` at the state's current time.
///
/// Absent, forged, unknown and expired tokens all yield
/// [`Authentication::Denied`].
pub async fn authenticate(state: &AppState, token: Option<&str>) -> Authentication {
    let now = state.clock.now();
    match resolve(state, token, now).await {
        Ok(session) => {
            tracing::debug!("✅ Session valid for user: {}", session.user_id);
            Authentication::Granted(session)
        }
        Err(e) => {
            tracing::debug!("❌ Session rejected: {}", e);
            Authentication::Denied
        }
    }
}

async fn resolve(state: &AppState, token: Option<&str>, now: DateTime<Utc>) -> Result<Session> {
    let token = token.ok_or(AppError::InvalidToken)?;
    let claims = state.codec.decode(SESSION_COOKIE, token)?;
    let user_id = claims.get(ID_CLAIM).ok_or(AppError::InvalidToken)?;

    let user = state
        .directory
        .lookup(user_id)
        .await
        .ok_or(AppError::InvalidToken)?;
    let created_at = user.session_start.ok_or(AppError::InvalidToken)?;

    let expires_at = created_at + session_window();
    if now >= expires_at {
        tracing::debug!("Session expired for user: {}", user.id);
        return Err(AppError::InvalidToken);
    }

    Ok(Session {
        user_id: user.id,
        first_name: user.first_name,
        last_name: user.last_name,
        created_at,
        expires_at,
    })
}
