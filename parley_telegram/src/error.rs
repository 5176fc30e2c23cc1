use parley_core::UserId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Conversation error: {0}")]
    Conversation(#[from] parley_conversation::ConversationError),

    #[error("Unauthorized command from user_id: {0}")]
    Unauthorized(UserId),

    #[error("Configuration error: {0}")]
    Config(String),
}
