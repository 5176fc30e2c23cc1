//! Inline vs. attachment delivery of a reply.

use parley_core::ReplySink;
use parley_core::util::char_len;
use tracing::info;

use crate::staging::StagingArea;
use crate::{ConversationError, Result};

/// Telegram's message limit; replies this long or longer go out as a file.
pub const INLINE_LIMIT: usize = 2000;

pub const EMPTY_RESPONSE_NOTICE: &str = "Empty response from Claude";

/// Attachment name for conversation replies.
pub const RESULT_FILE_NAME: &str = "result.txt";
/// Attachment name for the admin `/search` dump.
pub const QUERY_FILE_NAME: &str = "query.log";

/// How a reply was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing to send, so the fixed notice went out instead.
    EmptyNotice,
    Inline,
    Attachment,
}

impl Delivery {
    #[must_use]
    pub fn for_text(text: &str) -> Self {
        if text.is_empty() {
            Self::EmptyNotice
        } else if char_len(text) < INLINE_LIMIT {
            Self::Inline
        } else {
            Self::Attachment
        }
    }
}

pub struct DeliverySelector {
    staging: StagingArea,
}

impl DeliverySelector {
    #[must_use]
    pub const fn new(staging: StagingArea) -> Self {
        Self { staging }
    }

    #[must_use]
    pub const fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Sends a conversation reply, attaching it as `result.txt` when long.
    pub async fn deliver(&self, sink: &dyn ReplySink, text: &str) -> Result<Delivery> {
        self.deliver_as(sink, text, RESULT_FILE_NAME).await
    }

    /// Sends `text`, attaching it under `file_name` when long. The staged
    /// file is gone by the time this returns, whether or not sending worked.
    pub async fn deliver_as(
        &self,
        sink: &dyn ReplySink,
        text: &str,
        file_name: &str,
    ) -> Result<Delivery> {
        let delivery = Delivery::for_text(text);
        match delivery {
            Delivery::EmptyNotice => sink
                .reply_text(EMPTY_RESPONSE_NOTICE)
                .await
                .map_err(ConversationError::Transport)?,
            Delivery::Inline => sink
                .reply_text(text)
                .await
                .map_err(ConversationError::Transport)?,
            Delivery::Attachment => {
                let staged = self.staging.stage(file_name, text).await?;
                info!(
                    "Reply of {} chars sent as attachment {file_name}",
                    char_len(text)
                );
                let sent = sink.reply_document(staged.path()).await;
                staged.remove().await;
                sent.map_err(ConversationError::Transport)?;
            }
        }
        Ok(delivery)
    }
}
