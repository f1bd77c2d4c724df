use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::{SameSite, time::Duration};

use crate::{
    error::AppError,
    models::{
        command::{Command, CommandEnvelope},
        reply::Reply,
    },
    services::{
        dispatcher::{self, Carrier, Outcome},
        session::{self, SESSION_COOKIE, SESSION_WINDOW_SECS},
    },
    state::AppState,
};

/// Builds the session cookie.
///
/// The cookie is HTTP-only and lives exactly one session window. It is only
/// marked `Secure` when `secure` is set (production deployments).
fn create_session_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");
    cookie
}

fn apply_carrier(cookies: &Cookies, carrier: Carrier, secure: bool) {
    match carrier {
        Carrier::Issue(token) => {
            cookies.add(create_session_cookie(token, SESSION_WINDOW_SECS, secure));
            tracing::debug!("✅ Session cookie issued");
        }
        Carrier::Clear => {
            cookies.add(create_session_cookie(String::new(), 0, secure));
            tracing::debug!("✅ Session cookie cleared");
        }
    }
}

/// Handles one command posted to `/xhr`.
///
/// Always answers `200 OK` with a reply envelope; command failures travel in
/// the envelope's `status` and `data`.
pub async fn api_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Bytes,
) -> Response {
    let outcome = match CommandEnvelope::parse(&body) {
        Ok(envelope) => {
            let command = Command::from(envelope);
            tracing::info!("📨 Got {:?} command", command.tag());
            let token = session::token_from(&cookies);
            dispatcher::dispatch(&state, token.as_deref(), command).await
        }
        Err(e) => {
            tracing::warn!("❌ {}", e);
            Outcome::reply(Reply::decoding_failed(&e))
        }
    };

    if let Some(carrier) = outcome.carrier {
        apply_carrier(&cookies, carrier, state.config.secure_cookies);
    }

    let body = match sonic_rs::to_string(&outcome.reply) {
        Ok(body) => body,
        Err(e) => {
            return AppError::Internal(format!("Reply serialization failed: {}", e))
                .into_response();
        }
    };

    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json; charset=UTF-8"),
            ),
        ],
        body,
    )
        .into_response()
}
