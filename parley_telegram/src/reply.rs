//! `teloxide`-backed implementations of the engine's transport traits.

use async_trait::async_trait;
use parley_core::{DocumentSource, ReplySink};
use std::path::Path;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, InputFile, ParseMode};

/// Escapes text for a `MarkdownV2` code block, where only `` ` `` and `\`
/// are special.
#[must_use]
fn escape_code(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '`' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Replies into the chat a message came from.
#[derive(Clone)]
pub struct TelegramReply {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramReply {
    #[must_use]
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ReplySink for TelegramReply {
    async fn reply_text(&self, text: &str) -> anyhow::Result<()> {
        self.bot.send_message(self.chat_id, text).await?;
        Ok(())
    }

    async fn reply_code(&self, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, format!("```\n{}\n```", escape_code(text)))
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        Ok(())
    }

    async fn reply_document(&self, path: &Path) -> anyhow::Result<()> {
        self.bot
            .send_document(self.chat_id, InputFile::file(path.to_path_buf()))
            .await?;
        Ok(())
    }
}

/// A document attached to an incoming message.
pub struct TelegramDocument {
    bot: Bot,
    document: Document,
}

impl TelegramDocument {
    #[must_use]
    pub const fn new(bot: Bot, document: Document) -> Self {
        Self { bot, document }
    }
}

#[async_trait]
impl DocumentSource for TelegramDocument {
    fn file_name(&self) -> &str {
        self.document.file_name.as_deref().unwrap_or_default()
    }

    fn file_size(&self) -> u64 {
        u64::from(self.document.file.size)
    }

    async fn download_to(&self, dest: &Path) -> anyhow::Result<()> {
        let file = self.bot.get_file(self.document.file.id.clone()).await?;
        let mut dst = tokio::fs::File::create(dest).await?;
        self.bot.download_file(&file.path, &mut dst).await?;
        Ok(())
    }
}
