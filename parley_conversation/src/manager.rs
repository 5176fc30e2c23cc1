//! Conversation manager: the turn and document pipelines.

use parley_core::util::char_len;
use parley_core::{CompletionProvider, DocumentSource, ReplySink, SessionStore, UserId};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};

use crate::delivery::{Delivery, DeliverySelector};
use crate::document::{Rejection, validate_document};
use crate::guard::{FileSlot, UserLocks};
use crate::history;
use crate::retry::{MAX_TRIES, retry_until_text};
use crate::staging::StagingArea;
use crate::store::SessionAccess;
use crate::{ConversationError, Result};

/// Configuration for conversation management.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Attempts per turn against the completion provider
    pub max_tries: usize,
    /// Serialize turns of the same user. Off by default, in which case two
    /// simultaneous turns from one user may overwrite each other's context.
    pub per_user_lock: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_tries: MAX_TRIES,
            per_user_lock: false,
        }
    }
}

impl ConversationConfig {
    #[must_use]
    pub const fn with_per_user_lock(mut self, enabled: bool) -> Self {
        self.per_user_lock = enabled;
        self
    }
}

/// What became of one inbound turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Delivered(Delivery),
    Rejected(Rejection),
    /// An internal fault; logged, and the user gets no reply.
    Failed,
}

pub struct ConversationManager<P = Arc<dyn CompletionProvider>, S = Arc<dyn SessionStore>>
where
    P: Send + Sync,
    S: Send + Sync,
{
    provider: P,
    pub(crate) store: SessionAccess<S>,
    pub(crate) delivery: DeliverySelector,
    file_slot: FileSlot,
    user_locks: Option<UserLocks>,
    config: ConversationConfig,
}

impl<P, S> ConversationManager<P, S>
where
    P: CompletionProvider + Send + Sync,
    S: SessionStore + Send + Sync,
{
    pub fn new(
        provider: P,
        store: S,
        staging: StagingArea,
        file_slot: FileSlot,
        config: ConversationConfig,
    ) -> Self {
        info!(
            "Creating conversation manager: model={}, max_tries={}, per_user_lock={}",
            provider.model(),
            config.max_tries,
            config.per_user_lock
        );
        let user_locks = config.per_user_lock.then(UserLocks::new);
        Self {
            provider,
            store: SessionAccess::new(store),
            delivery: DeliverySelector::new(staging),
            file_slot,
            user_locks,
            config,
        }
    }

    #[must_use]
    pub const fn file_slot(&self) -> &FileSlot {
        &self.file_slot
    }

    /// Whether `user_id` is on the allow-list.
    pub async fn is_allowed(&self, user_id: UserId) -> bool {
        self.store.exists(user_id).await
    }

    /// Empties the user's context and turn counter.
    pub async fn clear(&self, user_id: UserId) {
        self.store.clear(user_id).await;
        info!("Cleared context for user {user_id}");
    }

    pub async fn accumulate(&self, user_id: UserId, text: &str) -> String {
        history::accumulate(&self.store, user_id, text).await
    }

    /// Appends `text` to the user's context once, then asks the provider
    /// until it answers, counting every attempt against the session.
    pub async fn resolve(&self, user_id: UserId, text: &str) -> Option<String> {
        let _turn = self.lock_user(user_id).await;
        let context = self.accumulate(user_id, text).await;

        retry_until_text(
            self.config.max_tries,
            || self.provider.complete(&context),
            |_| self.store.increment_turn_count(user_id),
        )
        .await
    }

    /// Runs a text turn end to end. Never fails; faults are logged.
    pub async fn handle_turn(
        &self,
        user_id: UserId,
        text: &str,
        sink: &dyn ReplySink,
    ) -> TurnOutcome {
        info!("Turn from user {user_id}: {} chars", char_len(text));
        match self.run_turn(user_id, text, sink).await {
            Ok(delivery) => TurnOutcome::Delivered(delivery),
            Err(e) => {
                error!("Error processing conversation for user {user_id}: {e}");
                TurnOutcome::Failed
            }
        }
    }

    /// Runs an uploaded document as a turn, one document at a time
    /// process-wide.
    pub async fn handle_document(
        &self,
        user_id: UserId,
        document: &dyn DocumentSource,
        sink: &dyn ReplySink,
    ) -> TurnOutcome {
        info!(
            "Document from user {user_id}: {} ({} bytes)",
            document.file_name(),
            document.file_size()
        );

        if let Err(rejection) = validate_document(document.file_name(), document.file_size()) {
            return Self::reject(sink, rejection).await;
        }

        let Some(_permit) = self.file_slot.try_enter() else {
            return Self::reject(sink, Rejection::Busy).await;
        };

        match self.run_document(user_id, document, sink).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error processing file conversation for user {user_id}: {e}");
                TurnOutcome::Failed
            }
        }
    }

    async fn run_turn(
        &self,
        user_id: UserId,
        text: &str,
        sink: &dyn ReplySink,
    ) -> Result<Delivery> {
        let reply = self.resolve(user_id, text).await.unwrap_or_default();
        self.delivery.deliver(sink, &reply).await
    }

    async fn run_document(
        &self,
        user_id: UserId,
        document: &dyn DocumentSource,
        sink: &dyn ReplySink,
    ) -> Result<TurnOutcome> {
        let staged = self
            .delivery
            .staging()
            .reserve(document.file_name())
            .await?;
        document
            .download_to(staged.path())
            .await
            .map_err(ConversationError::Transport)?;

        let content = tokio::fs::read_to_string(staged.path()).await;
        staged.remove().await;
        let content = content?;
        if content.is_empty() {
            return Ok(Self::reject(sink, Rejection::EmptyDocument).await);
        }

        let delivery = self.run_turn(user_id, &content, sink).await?;
        Ok(TurnOutcome::Delivered(delivery))
    }

    async fn reject(sink: &dyn ReplySink, rejection: Rejection) -> TurnOutcome {
        info!("Rejected: {rejection:?}");
        if let Err(e) = sink.reply_text(rejection.message()).await {
            warn!("Failed to send rejection notice: {e}");
        }
        TurnOutcome::Rejected(rejection)
    }

    async fn lock_user(&self, user_id: UserId) -> Option<OwnedMutexGuard<()>> {
        match &self.user_locks {
            Some(locks) => Some(locks.lock(user_id).await),
            None => None,
        }
    }
}
