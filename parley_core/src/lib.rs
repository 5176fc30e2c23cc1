#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use std::fmt;
use std::path::Path;

pub mod util;

/// Telegram user identifier, also the primary key of a session row.
pub type UserId = i64;

/// Persisted per-user conversation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub turn_count: u32,
    pub context: String,
}

impl Session {
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            turn_count: 0,
            context: String::new(),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User ID: {}, Conversation Count: {}, Context: {}",
            self.user_id, self.turn_count, self.context
        )
    }
}

/// Session header as returned by listing, without the context blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSummary {
    pub user_id: UserId,
    pub turn_count: u32,
}

impl fmt::Display for UserSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User ID: {}, Conversation Count: {}, Context: ",
            self.user_id, self.turn_count
        )
    }
}

/// Durable storage of sessions keyed by user id.
///
/// Every operation touches a single row. Callers decide how to degrade on
/// failure; implementations just report it.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, user_id: UserId) -> anyhow::Result<bool>;
    /// Creates an empty session. Returns `false` when the user already exists.
    async fn create(&self, user_id: UserId) -> anyhow::Result<bool>;
    async fn delete(&self, user_id: UserId) -> anyhow::Result<bool>;
    async fn fetch(&self, user_id: UserId) -> anyhow::Result<Option<Session>>;
    async fn list_all(&self) -> anyhow::Result<Vec<UserSummary>>;
    async fn set_context(&self, user_id: UserId, context: &str) -> anyhow::Result<()>;
    async fn increment_turn_count(&self, user_id: UserId) -> anyhow::Result<()>;
    async fn reset_turn_count(&self, user_id: UserId) -> anyhow::Result<()>;
}

/// A single prompt-in/text-out call against a remote completion model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
    fn model(&self) -> &str;
}

/// Outbound side of the chat transport for one conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn reply_text(&self, text: &str) -> anyhow::Result<()>;
    /// Sends `text` as a monospace block.
    async fn reply_code(&self, text: &str) -> anyhow::Result<()>;
    async fn reply_document(&self, path: &Path) -> anyhow::Result<()>;
}

/// An uploaded document that can be fetched to local storage.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn file_name(&self) -> &str;
    fn file_size(&self) -> u64;
    async fn download_to(&self, dest: &Path) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for std::sync::Arc<T> {
    async fn exists(&self, user_id: UserId) -> anyhow::Result<bool> {
        (**self).exists(user_id).await
    }
    async fn create(&self, user_id: UserId) -> anyhow::Result<bool> {
        (**self).create(user_id).await
    }
    async fn delete(&self, user_id: UserId) -> anyhow::Result<bool> {
        (**self).delete(user_id).await
    }
    async fn fetch(&self, user_id: UserId) -> anyhow::Result<Option<Session>> {
        (**self).fetch(user_id).await
    }
    async fn list_all(&self) -> anyhow::Result<Vec<UserSummary>> {
        (**self).list_all().await
    }
    async fn set_context(&self, user_id: UserId, context: &str) -> anyhow::Result<()> {
        (**self).set_context(user_id, context).await
    }
    async fn increment_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        (**self).increment_turn_count(user_id).await
    }
    async fn reset_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        (**self).reset_turn_count(user_id).await
    }
}

#[async_trait]
impl<T: CompletionProvider + ?Sized> CompletionProvider for std::sync::Arc<T> {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        (**self).complete(prompt).await
    }
    fn model(&self) -> &str {
        (**self).model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_renders_all_fields() {
        let session = Session {
            user_id: 42,
            turn_count: 3,
            context: "hi".to_string(),
        };
        assert_eq!(
            session.to_string(),
            "User ID: 42, Conversation Count: 3, Context: hi"
        );
    }

    #[test]
    fn summary_renders_empty_context() {
        let summary = UserSummary {
            user_id: 7,
            turn_count: 0,
        };
        assert_eq!(
            summary.to_string(),
            "User ID: 7, Conversation Count: 0, Context: "
        );
    }

    #[test]
    fn new_session_is_blank() {
        let session = Session::new(1);
        assert_eq!(session.turn_count, 0);
        assert!(session.context.is_empty());
    }
}
