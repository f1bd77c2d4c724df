use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::repositories::user::UserDirectory;
use crate::services::session;
use crate::state::AppState;
use argon2::{
    password_hash::{PasswordHash, PasswordVerifier},
    Argon2,
};
use subtle::ConstantTimeEq;

/// Login failure message for an unknown id.
pub const ID_NOT_FOUND: &str = "id doesn't exist";
/// Login failure message for a wrong secret.
pub const PASSWORD_MISMATCH: &str = "password doesn't match";

const ARGON2_PREFIX: &str = "$argon2";

/// Verifies a submitted password against the stored secret.
///
/// Secrets stored as Argon2 PHC strings are verified with Argon2; anything
/// else must match exactly, compared in constant time.
///
/// # Arguments
///
/// * `password` - The submitted password.
/// * `stored` - The stored secret.
///
/// # Returns
///
/// A `Result` containing `true` if the password is valid, `false` otherwise.
fn verify_password(password: &str, stored: &str) -> Result<bool> {
    if stored.starts_with(ARGON2_PREFIX) {
        let parsed_hash = PasswordHash::new(stored)
            .map_err(|e| AppError::Encryption(format!("Hash parse error: {}", e)))?;
        return Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok());
    }

    Ok(password.as_bytes().ct_eq(stored.as_bytes()).into())
}

/// Authenticates a user.
///
/// # Returns
///
/// The user on success, or [`AppError::CredentialMismatch`] naming whether
/// the id or the password was wrong.
pub async fn authenticate_user(
    directory: &UserDirectory,
    user_id: &str,
    password: &str,
) -> Result<User> {
    tracing::debug!("🔐 Authenticating user: {}", user_id);

    let user = directory
        .lookup(user_id)
        .await
        .ok_or_else(|| AppError::CredentialMismatch(ID_NOT_FOUND.to_string()))?;

    if !verify_password(password, &user.password)? {
        return Err(AppError::CredentialMismatch(PASSWORD_MISMATCH.to_string()));
    }

    Ok(user)
}

/// Logs a user in.
///
/// Checks the credentials, mints a session token and records the login time
/// as the start of the session window. A failed check mutates nothing.
///
/// # Returns
///
/// A `Result` containing the session token.
pub async fn login(state: &AppState, user_id: &str, password: &str) -> Result<String> {
    let user = authenticate_user(&state.directory, user_id, password).await?;

    let token = session::issue_token(&state.codec, &user.id)?;
    let now = state.clock.now();
    if !state.directory.record_login(&user.id, now).await {
        return Err(AppError::Internal(format!("User vanished during login: {}", user.id)));
    }

    tracing::info!("✅ User logged in: {}", user.id);
    Ok(token)
}
