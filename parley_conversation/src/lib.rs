#![warn(
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

//! Per-user conversation engine.
//!
//! Each turn flows through the same pipeline:
//! - append the message to the user's stored context, resetting it first once
//!   the turn counter reaches [`RESET_THRESHOLD`]
//! - ask the completion provider up to [`MAX_TRIES`] times
//! - reply inline, or as a staged file when the text is too long for one
//!   Telegram message
//!
//! Uploaded documents go through the same pipeline behind a single
//! process-wide [`FileSlot`].

mod admin;
mod delivery;
mod document;
mod error;
mod guard;
mod history;
mod manager;
mod retry;
mod staging;
mod store;

#[cfg(test)]
mod test_support;

pub use delivery::{
    Delivery, DeliverySelector, EMPTY_RESPONSE_NOTICE, INLINE_LIMIT, QUERY_FILE_NAME,
    RESULT_FILE_NAME,
};
pub use document::{MAX_DOCUMENT_SIZE, MIN_DOCUMENT_SIZE, Rejection, validate_document};
pub use error::{ConversationError, Result};
pub use guard::{FilePermit, FileSlot, UserLocks};
pub use history::{RESET_THRESHOLD, append_turn, needs_reset};
pub use manager::{ConversationConfig, ConversationManager, TurnOutcome};
pub use retry::{MAX_TRIES, retry_until_text};
pub use staging::{StagedFile, StagingArea};
pub use store::SessionAccess;
