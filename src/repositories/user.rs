use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{
    error::{AppError, Result},
    models::user::User,
};

/// The in-memory user roster, shared by every request handler.
#[derive(Clone, Default)]
pub struct UserDirectory {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl UserDirectory {
    /// Creates a directory from a roster. Later duplicates replace earlier ones.
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Finds a user by their ID.
    pub async fn lookup(&self, user_id: &str) -> Option<User> {
        let users = self.users.read().await;
        users.get(user_id).cloned()
    }

    /// Records a successful login at `at`.
    ///
    /// # Returns
    ///
    /// `false` if no user has that ID.
    pub async fn record_login(&self, user_id: &str, at: DateTime<Utc>) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(user) => {
                user.session_start = Some(at);
                true
            }
            None => false,
        }
    }

    /// The number of users in the roster.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

/// Loads a roster from a JSON array of
/// `{id, firstName, lastName, email?, password}` objects.
pub async fn load_roster(path: &Path) -> Result<Vec<User>> {
    let bytes = tokio::fs::read(path).await?;
    let users: Vec<User> = sonic_rs::from_slice(&bytes)
        .map_err(|e| AppError::Decode(format!("{}: {}", path.display(), e)))?;
    tracing::debug!("Roster {} holds {} users", path.display(), users.len());
    Ok(users)
}
