//! Failure-tolerant access to the session store.

use parley_core::{Session, SessionStore, UserId, UserSummary};
use tracing::warn;

/// Wraps a [`SessionStore`] so storage errors are logged and replaced by a
/// safe default instead of reaching the caller.
pub struct SessionAccess<S> {
    store: S,
}

impl<S: SessionStore> SessionAccess<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn exists(&self, user_id: UserId) -> bool {
        self.store.exists(user_id).await.unwrap_or_else(|e| {
            warn!("Error checking user existence for {user_id}: {e}");
            false
        })
    }

    pub async fn create(&self, user_id: UserId) -> bool {
        match self.store.create(user_id).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("User with ID {user_id} already exists in the database.");
                false
            }
            Err(e) => {
                warn!("Error adding user {user_id}: {e}");
                false
            }
        }
    }

    pub async fn delete(&self, user_id: UserId) -> bool {
        self.store.delete(user_id).await.unwrap_or_else(|e| {
            warn!("Error deleting user {user_id}: {e}");
            false
        })
    }

    pub async fn fetch(&self, user_id: UserId) -> Option<Session> {
        self.store.fetch(user_id).await.unwrap_or_else(|e| {
            warn!("Error retrieving user {user_id}: {e}");
            None
        })
    }

    pub async fn list_all(&self) -> Vec<UserSummary> {
        self.store.list_all().await.unwrap_or_else(|e| {
            warn!("Error retrieving users: {e}");
            Vec::new()
        })
    }

    /// Current session, or a blank one when the row is missing or unreadable.
    pub async fn session(&self, user_id: UserId) -> Session {
        self.fetch(user_id)
            .await
            .unwrap_or_else(|| Session::new(user_id))
    }

    pub async fn set_context(&self, user_id: UserId, context: &str) {
        if let Err(e) = self.store.set_context(user_id, context).await {
            warn!("Error updating context for {user_id}: {e}");
        }
    }

    pub async fn increment_turn_count(&self, user_id: UserId) {
        if let Err(e) = self.store.increment_turn_count(user_id).await {
            warn!("Error updating conversation count for {user_id}: {e}");
        }
    }

    pub async fn reset_turn_count(&self, user_id: UserId) {
        if let Err(e) = self.store.reset_turn_count(user_id).await {
            warn!("Error clearing conversation count for {user_id}: {e}");
        }
    }

    /// Empties the context and zeroes the counter.
    pub async fn clear(&self, user_id: UserId) {
        self.reset_turn_count(user_id).await;
        self.set_context(user_id, "").await;
    }
}
