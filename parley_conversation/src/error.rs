use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversationError>;

/// Faults that escape a single pipeline step.
///
/// Remote failures and storage failures never show up here: the first are
/// retried and the second degrade to defaults inside [`crate::SessionAccess`].
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(anyhow::Error),
}
