//! Administrative operations. Callers are expected to have checked that the
//! requester is a super admin.

use parley_core::util::{LOG_TAIL_LINES, char_len, tail_file};
use parley_core::{CompletionProvider, ReplySink, SessionStore, UserId};
use std::path::Path;
use tracing::{error, info};

use crate::delivery::{INLINE_LIMIT, QUERY_FILE_NAME};
use crate::manager::ConversationManager;
use crate::{ConversationError, Result};

const LOG_READ_FAILED: &str = "An error occurred while reading the log file.";
const USER_LIST_FILE_NAME: &str = "users.txt";
const LOG_TAIL_FILE_NAME: &str = "log.txt";

async fn send(sink: &dyn ReplySink, text: &str) -> Result<()> {
    sink.reply_text(text)
        .await
        .map_err(ConversationError::Transport)
}

fn not_found(user_id: UserId) -> String {
    format!("User not found with ID: {user_id}")
}

impl<P, S> ConversationManager<P, S>
where
    P: CompletionProvider + Send + Sync,
    S: SessionStore + Send + Sync,
{
    /// Puts `user_id` on the allow-list with an empty session.
    pub async fn add_user(&self, user_id: UserId, sink: &dyn ReplySink) -> Result<()> {
        if self.store.create(user_id).await {
            info!("Added user {user_id}");
        }
        send(sink, &format!("User added with ID: {user_id}")).await
    }

    pub async fn delete_user(&self, user_id: UserId, sink: &dyn ReplySink) -> Result<()> {
        if self.store.delete(user_id).await {
            info!("Deleted user {user_id}");
            send(sink, &format!("User deleted with ID: {user_id}")).await
        } else {
            send(sink, &not_found(user_id)).await
        }
    }

    pub async fn list_users(&self, sink: &dyn ReplySink) -> Result<()> {
        let users = self.store.list_all().await;
        if users.is_empty() {
            return send(sink, "No users found.").await;
        }

        let listing = users
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.send_code(sink, &listing, USER_LIST_FILE_NAME).await
    }

    /// Sends one user's full session, as `query.log` when it is long.
    pub async fn search_user(&self, user_id: UserId, sink: &dyn ReplySink) -> Result<()> {
        match self.store.fetch(user_id).await {
            Some(session) => {
                self.delivery
                    .deliver_as(sink, &session.to_string(), QUERY_FILE_NAME)
                    .await?;
                Ok(())
            }
            None => send(sink, &not_found(user_id)).await,
        }
    }

    /// Sends the last lines of the operational log.
    pub async fn tail_log(&self, log_file: &Path, sink: &dyn ReplySink) -> Result<()> {
        match tail_file(log_file, LOG_TAIL_LINES).await {
            Ok(tail) if tail.trim().is_empty() => send(sink, "Log is empty.").await,
            Ok(tail) => self.send_code(sink, &tail, LOG_TAIL_FILE_NAME).await,
            Err(e) => {
                error!("Error while reading log file {}: {e}", log_file.display());
                send(sink, LOG_READ_FAILED).await
            }
        }
    }

    /// Monospace when short, otherwise attached as `file_name`.
    async fn send_code(&self, sink: &dyn ReplySink, text: &str, file_name: &str) -> Result<()> {
        if char_len(text) < INLINE_LIMIT {
            return sink
                .reply_code(text)
                .await
                .map_err(ConversationError::Transport);
        }
        self.delivery.deliver_as(sink, text, file_name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::delivery::INLINE_LIMIT;
    use crate::guard::FileSlot;
    use crate::manager::{ConversationConfig, ConversationManager};
    use crate::staging::StagingArea;
    use crate::test_support::{MemoryStore, RecordingSink, Reply, ScriptedProvider};
    use parley_core::Session;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager(
        store: MemoryStore,
        staging: &TempDir,
    ) -> ConversationManager<ScriptedProvider, Arc<MemoryStore>> {
        ConversationManager::new(
            ScriptedProvider::always("unused"),
            Arc::new(store),
            StagingArea::new(staging.path()),
            FileSlot::new(),
            ConversationConfig::default(),
        )
    }

    #[tokio::test]
    async fn add_then_delete_user() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::default(), &staging);
        let sink = RecordingSink::default();

        m.add_user(11, &sink).await.unwrap();
        assert!(m.is_allowed(11).await);
        m.add_user(11, &sink).await.unwrap();

        m.delete_user(11, &sink).await.unwrap();
        m.delete_user(11, &sink).await.unwrap();
        assert!(!m.is_allowed(11).await);

        assert_eq!(
            sink.texts(),
            vec![
                "User added with ID: 11",
                "User added with ID: 11",
                "User deleted with ID: 11",
                "User not found with ID: 11",
            ]
        );
    }

    #[tokio::test]
    async fn list_users_renders_one_line_each() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::with_users(&[2, 1]), &staging);
        let sink = RecordingSink::default();

        m.list_users(&sink).await.unwrap();

        assert_eq!(
            sink.replies(),
            vec![Reply::Code(
                "User ID: 1, Conversation Count: 0, Context: \n\
                 User ID: 2, Conversation Count: 0, Context: "
                    .to_string()
            )]
        );
    }

    #[tokio::test]
    async fn list_users_when_empty() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::default(), &staging);
        let sink = RecordingSink::default();

        m.list_users(&sink).await.unwrap();
        assert_eq!(sink.texts(), vec!["No users found."]);
    }

    #[tokio::test]
    async fn search_user_inline_or_attached() {
        let staging = TempDir::new().unwrap();
        let short = Session {
            user_id: 3,
            turn_count: 1,
            context: "short".to_string(),
        };
        let m = manager(MemoryStore::with_session(short.clone()), &staging);
        let sink = RecordingSink::default();

        m.search_user(3, &sink).await.unwrap();
        m.search_user(4, &sink).await.unwrap();
        assert_eq!(
            sink.texts(),
            vec![short.to_string(), "User not found with ID: 4".to_string()]
        );

        let long = Session {
            user_id: 5,
            turn_count: 2,
            context: "c".repeat(INLINE_LIMIT),
        };
        let m = manager(MemoryStore::with_session(long.clone()), &staging);
        let sink = RecordingSink::default();

        m.search_user(5, &sink).await.unwrap();
        let replies = sink.replies();
        let [Reply::Document { path, contents }] = replies.as_slice() else {
            panic!("expected one document, got {replies:?}");
        };
        assert_eq!(path.file_name().unwrap(), "query.log");
        assert_eq!(contents, &long.to_string());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn tail_log_sends_last_twenty_lines() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::default(), &staging);
        let sink = RecordingSink::default();

        let log = staging.path().join("bot.log");
        let body: String = (1..=25).map(|i| format!("entry {i}\n")).collect();
        std::fs::write(&log, body).unwrap();

        m.tail_log(&log, &sink).await.unwrap();

        let replies = sink.replies();
        let [Reply::Code(tail)] = replies.as_slice() else {
            panic!("expected one code block, got {replies:?}");
        };
        assert_eq!(tail.lines().count(), 20);
        assert!(tail.starts_with("entry 6\n"));
    }

    #[tokio::test]
    async fn long_log_tail_is_attached() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::default(), &staging);
        let sink = RecordingSink::default();

        let log = staging.path().join("bot.log");
        let line = format!("{}\n", "m".repeat(500));
        std::fs::write(&log, line.repeat(20)).unwrap();

        m.tail_log(&log, &sink).await.unwrap();

        let replies = sink.replies();
        let [Reply::Document { path, contents }] = replies.as_slice() else {
            panic!("expected one document, got {replies:?}");
        };
        assert_eq!(path.file_name().unwrap(), super::LOG_TAIL_FILE_NAME);
        assert_eq!(contents, &line.repeat(20));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn long_user_list_is_attached() {
        let staging = TempDir::new().unwrap();
        let ids: Vec<i64> = (1..=100).collect();
        let m = manager(MemoryStore::with_users(&ids), &staging);
        let sink = RecordingSink::default();

        m.list_users(&sink).await.unwrap();

        let replies = sink.replies();
        let [Reply::Document { path, contents }] = replies.as_slice() else {
            panic!("expected one document, got {replies:?}");
        };
        assert_eq!(path.file_name().unwrap(), super::USER_LIST_FILE_NAME);
        assert_eq!(contents.lines().count(), 100);
    }

    #[tokio::test]
    async fn tail_log_reports_unreadable_file() {
        let staging = TempDir::new().unwrap();
        let m = manager(MemoryStore::default(), &staging);
        let sink = RecordingSink::default();

        m.tail_log(&staging.path().join("missing.log"), &sink)
            .await
            .unwrap();
        assert_eq!(sink.texts(), vec![super::LOG_READ_FAILED]);
    }
}
