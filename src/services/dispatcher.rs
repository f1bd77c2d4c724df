//! The command state machine.
//!
//! Each request makes exactly one transition. Per-session state lives in the
//! user directory (`session_start`) and in the token; the dispatcher itself
//! holds none. Every reply starts as [`Reply::for_command`], so a command
//! that does not set a result answers `error` / `"unimplemented"`.

use crate::{
    error::AppError,
    models::{
        command::Command,
        reply::{DENIED, Reply, ReplyData, SessionInfo},
    },
    services::{
        auth as auth_service,
        session::{self, Authentication},
    },
    state::AppState,
};

/// What the transport should do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Carrier {
    /// Set the cookie to this token.
    Issue(String),
    /// Expire the cookie immediately.
    Clear,
}

/// The result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub reply: Reply,
    pub carrier: Option<Carrier>,
}

impl Outcome {
    /// An outcome that leaves the cookie untouched.
    pub fn reply(reply: Reply) -> Self {
        Self { reply, carrier: None }
    }
}

/// Dispatches `command`, with `token` taken from the session cookie.
pub async fn dispatch(state: &AppState, token: Option<&str>, command: Command) -> Outcome {
    let reply = Reply::for_command(command.tag());

    match command {
        Command::Login { user_id, secret } => login(state, reply, &user_id, &secret).await,
        Command::Logout => {
            tracing::info!("👋 Logout requested");
            Outcome {
                reply: reply.ok(None),
                carrier: Some(Carrier::Clear),
            }
        }
        Command::Continue => Outcome::reply(continue_session(state, reply, token).await),
        Command::DeleteSlot { key } => Outcome::reply(delete_slot(state, reply, &key).await),
        Command::Unknown(tag) => {
            tracing::debug!("Unimplemented command: {:?}", tag);
            Outcome::reply(reply)
        }
    }
}

async fn login(state: &AppState, reply: Reply, user_id: &str, secret: &str) -> Outcome {
    tracing::info!("🔐 Login attempt for: {}", user_id);

    match auth_service::login(state, user_id, secret).await {
        Ok(token) => Outcome {
            reply: reply.ok(None),
            carrier: Some(Carrier::Issue(token)),
        },
        Err(AppError::CredentialMismatch(message)) => {
            tracing::warn!("❌ Login failed for {}: {}", user_id, message);
            Outcome::reply(reply.error(message))
        }
        Err(e) => {
            tracing::error!("❌ Login error for {}: {}", user_id, e);
            Outcome::reply(reply.error("login failed"))
        }
    }
}

async fn continue_session(state: &AppState, reply: Reply, token: Option<&str>) -> Reply {
    match session::authenticate(state, token).await {
        Authentication::Granted(session) => {
            let remaining = session.remaining_ms(state.clock.now());
            reply.ok(Some(ReplyData::Session(SessionInfo {
                first_name: session.first_name,
                last_name: session.last_name,
                session_expires_in: remaining,
            })))
        }
        // Status stays `ok`; the client tells denial apart by payload.
        Authentication::Denied => reply.ok(Some(ReplyData::from(DENIED))),
    }
}

// No session check: any caller may delete a slot.
async fn delete_slot(state: &AppState, reply: Reply, key: &str) -> Reply {
    if key.chars().count() <= 1 {
        return reply;
    }

    match state.slots.delete_one(key).await {
        Ok(count) => {
            tracing::info!("🗑️ Removed {} document(s) for slot {}", count, key);
            reply.ok(Some(ReplyData::from(key)))
        }
        Err(e) => {
            tracing::error!("❌ delete-slot {} failed: {}", key, e);
            reply.error(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        config::Config,
        crypto::token::{SessionKeys, TokenCodec},
        error::Result,
        models::{
            command::{CommandEnvelope, CONTINUE},
            reply::{Status, UNIMPLEMENTED},
            user::User,
        },
        repositories::{
            slots::{MemorySlotStore, SlotStore},
            user::UserDirectory,
        },
        services::{
            auth::{ID_NOT_FOUND, PASSWORD_MISMATCH},
            session::session_window,
        },
    };
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    struct BrokenStore;

    #[async_trait]
    impl SlotStore for BrokenStore {
        async fn delete_one(&self, _key: &str) -> Result<u64> {
            Err(AppError::Collaborator("server selection timeout".to_string()))
        }
    }

    struct Harness {
        state: AppState,
        clock: Arc<ManualClock>,
        slots: MemorySlotStore,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let slots = MemorySlotStore::new();
        let state = AppState::from_parts(
            Config::default(),
            UserDirectory::from_users([User::new("alpha", "Ada", "Lovelace", "omega")]),
            TokenCodec::new(SessionKeys::generate()),
            Arc::new(slots.clone()),
            clock.clone(),
        );
        Harness { state, clock, slots }
    }

    fn login_command(user_id: &str, secret: &str) -> Command {
        Command::Login {
            user_id: user_id.to_string(),
            secret: secret.to_string(),
        }
    }

    async fn log_in(state: &AppState) -> String {
        match dispatch(state, None, login_command("alpha", "omega")).await.carrier {
            Some(Carrier::Issue(token)) => token,
            other => panic!("expected a token, got {:?}", other),
        }
    }

    fn session_info(reply: &Reply) -> &SessionInfo {
        match &reply.data {
            Some(ReplyData::Session(info)) => info,
            other => panic!("expected session info, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn login_then_continue() {
        let h = harness();

        let login = dispatch(&h.state, None, login_command("alpha", "omega")).await;
        assert_eq!(login.reply, Reply::for_command("login").ok(None));
        let token = match login.carrier {
            Some(Carrier::Issue(token)) => token,
            other => panic!("expected a token, got {:?}", other),
        };

        h.clock.advance(Duration::seconds(30));
        let reply = dispatch(&h.state, Some(&token), Command::Continue).await.reply;
        assert_eq!(reply.kind, CONTINUE);
        assert!(reply.is_ok());

        let info = session_info(&reply);
        assert_eq!(info.first_name, "Ada");
        assert_eq!(info.last_name, "Lovelace");
        assert_eq!(
            info.session_expires_in,
            (session_window() - Duration::seconds(30)).num_milliseconds()
        );
    }

    #[tokio::test]
    async fn wrong_password_changes_nothing() {
        let h = harness();

        let outcome = dispatch(&h.state, None, login_command("alpha", "wrong")).await;
        assert_eq!(outcome.reply, Reply::for_command("login").error(PASSWORD_MISMATCH));
        assert_eq!(outcome.carrier, None);
        assert!(h.state.directory.lookup("alpha").await.unwrap().session_start.is_none());
    }

    #[tokio::test]
    async fn wrong_password_keeps_existing_session_start() {
        let h = harness();
        log_in(&h.state).await;
        let started = h.state.directory.lookup("alpha").await.unwrap().session_start;

        h.clock.advance(Duration::seconds(10));
        dispatch(&h.state, None, login_command("alpha", "wrong")).await;
        assert_eq!(h.state.directory.lookup("alpha").await.unwrap().session_start, started);
    }

    #[tokio::test]
    async fn corrupt_stored_hash_refuses_login() {
        let h = harness();
        let state = AppState {
            directory: UserDirectory::from_users([User::new(
                "gamma",
                "Grace",
                "Hopper",
                "$argon2id$garbage",
            )]),
            ..h.state.clone()
        };

        let outcome = dispatch(&state, None, login_command("gamma", "omega")).await;
        assert_eq!(outcome.reply.status, Status::Error);
        assert_eq!(outcome.carrier, None);
        assert!(state.directory.lookup("gamma").await.unwrap().session_start.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_reported() {
        let h = harness();
        let outcome = dispatch(&h.state, None, login_command("ghost", "x")).await;
        assert_eq!(outcome.reply, Reply::for_command("login").error(ID_NOT_FOUND));
        assert_eq!(outcome.carrier, None);
    }

    #[tokio::test]
    async fn continue_without_token_is_denied_but_ok() {
        let h = harness();
        let reply = dispatch(&h.state, None, Command::Continue).await.reply;
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.data, Some(ReplyData::from(DENIED)));
    }

    #[tokio::test]
    async fn continue_does_not_slide_the_window() {
        let h = harness();
        let token = log_in(&h.state).await;

        for _ in 0..4 {
            h.clock.advance(Duration::seconds(60));
            let reply = dispatch(&h.state, Some(&token), Command::Continue).await.reply;
            assert!(matches!(reply.data, Some(ReplyData::Session(_))));
        }

        h.clock.advance(Duration::seconds(60));
        let reply = dispatch(&h.state, Some(&token), Command::Continue).await.reply;
        assert_eq!(reply.data, Some(ReplyData::from(DENIED)));
    }

    #[tokio::test]
    async fn relogin_restarts_the_window() {
        let h = harness();
        log_in(&h.state).await;

        h.clock.advance(Duration::seconds(290));
        let token = log_in(&h.state).await;

        h.clock.advance(Duration::seconds(60));
        let reply = dispatch(&h.state, Some(&token), Command::Continue).await.reply;
        assert_eq!(
            session_info(&reply).session_expires_in,
            Duration::seconds(240).num_milliseconds()
        );
    }

    #[tokio::test]
    async fn logout_clears_the_cookie() {
        let h = harness();
        let outcome = dispatch(&h.state, None, Command::Logout).await;
        assert_eq!(outcome.reply, Reply::for_command("logout").ok(None));
        assert_eq!(outcome.carrier, Some(Carrier::Clear));
    }

    #[tokio::test]
    async fn unknown_commands_get_the_default_reply() {
        let h = harness();
        for body in [r#"{"command":"reboot"}"#, r#"{}"#] {
            let command = Command::from(CommandEnvelope::parse(body.as_bytes()).unwrap());
            let outcome = dispatch(&h.state, None, command).await;
            assert_eq!(outcome.reply.status, Status::Error);
            assert_eq!(outcome.reply.data, Some(ReplyData::from(UNIMPLEMENTED)));
            assert_eq!(outcome.carrier, None);
        }
    }

    #[tokio::test]
    async fn delete_slot_removes_the_document() {
        let h = harness();
        h.slots.insert("slot-42", sonic_rs::json!({"day": 3})).await;

        let command = Command::DeleteSlot { key: "slot-42".to_string() };
        let reply = dispatch(&h.state, None, command).await.reply;
        assert_eq!(reply, Reply::for_command("delete-slot").ok(Some(ReplyData::from("slot-42"))));
        assert!(!h.slots.contains("slot-42").await);
    }

    #[tokio::test]
    async fn delete_slot_ignores_short_keys() {
        let h = harness();

        for key in ["", "x", "é"] {
            h.slots.insert(key, sonic_rs::json!({})).await;
            let command = Command::DeleteSlot { key: key.to_string() };
            let reply = dispatch(&h.state, None, command).await.reply;
            assert_eq!(reply, Reply::for_command("delete-slot"));
            assert!(h.slots.contains(key).await);
        }
    }

    #[tokio::test]
    async fn delete_slot_with_an_expired_session_still_deletes() {
        let h = harness();
        h.slots.insert("slot-42", sonic_rs::json!({})).await;
        let token = log_in(&h.state).await;
        h.clock.advance(session_window());

        let command = Command::DeleteSlot { key: "slot-42".to_string() };
        let reply = dispatch(&h.state, Some(&token), command).await.reply;
        assert_eq!(reply, Reply::for_command("delete-slot").ok(Some(ReplyData::from("slot-42"))));
        assert!(!h.slots.contains("slot-42").await);
    }

    #[tokio::test]
    async fn delete_slot_of_a_missing_key_succeeds() {
        let h = harness();
        let command = Command::DeleteSlot { key: "slot-404".to_string() };
        let reply = dispatch(&h.state, None, command).await.reply;
        assert_eq!(reply, Reply::for_command("delete-slot").ok(Some(ReplyData::from("slot-404"))));
    }

    #[tokio::test]
    async fn delete_slot_surfaces_store_errors() {
        let h = harness();
        let state = AppState {
            slots: Arc::new(BrokenStore),
            ..h.state.clone()
        };
        let command = Command::DeleteSlot { key: "slot-42".to_string() };
        let reply = dispatch(&state, None, command).await.reply;
        assert_eq!(
            reply,
            Reply::for_command("delete-slot").error("server selection timeout")
        );
    }
}
