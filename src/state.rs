use std::sync::Arc;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crypto::token::{SessionKeys, TokenCodec};
use crate::error::Result;
use crate::models::user::User;
use crate::repositories::slots::{MemorySlotStore, SlotStore};
use crate::repositories::user::{self as user_repo, UserDirectory};

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The user roster.
    pub directory: UserDirectory,
    /// The session token codec, keyed once per process.
    pub codec: Arc<TokenCodec>,
    /// The document collection behind `delete-slot`.
    pub slots: Arc<dyn SlotStore>,
    /// The source of "now" for session windows.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// Loads the roster named by the configuration (or seeds a demo user),
    /// generates fresh session keys and starts with an empty slot store.
    pub async fn new(config: &Config) -> Result<Self> {
        let users = match &config.users_file {
            Some(path) => user_repo::load_roster(path).await?,
            None => {
                tracing::warn!("⚠️  USERS_FILE not set, seeding demo user 'alpha'");
                vec![User::new("alpha", "Demo", "User", "omega")]
            }
        };
        let directory = UserDirectory::from_users(users);
        tracing::info!("✅ User directory loaded with {} users", directory.len().await);

        let codec = TokenCodec::new(SessionKeys::generate());
        tracing::info!("✅ Session keys generated");

        Ok(Self::from_parts(
            config.clone(),
            directory,
            codec,
            Arc::new(MemorySlotStore::new()),
            Arc::new(SystemClock),
        ))
    }

    /// Assembles a state from already-built parts.
    pub fn from_parts(
        config: Config,
        directory: UserDirectory,
        codec: TokenCodec,
        slots: Arc<dyn SlotStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            directory,
            codec: Arc::new(codec),
            slots,
            clock,
        }
    }
}
