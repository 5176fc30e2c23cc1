//! Context accumulation.
//!
//! A user's context is one growing string in the text-completions format:
//! every turn is appended as `HUMAN_PROMPT + text + AI_PROMPT`, and the whole
//! string is the prompt. The only bound on its size is the reset that happens
//! once the turn counter reaches [`RESET_THRESHOLD`].

use parley_core::{SessionStore, UserId};
use parley_providers::{AI_PROMPT, HUMAN_PROMPT};
use tracing::info;

use crate::store::SessionAccess;

/// Turn count at which the next turn starts from an empty context.
pub const RESET_THRESHOLD: u32 = 50;

#[must_use]
pub const fn needs_reset(turn_count: u32) -> bool {
    turn_count >= RESET_THRESHOLD
}

/// Appends one human turn and opens the assistant turn.
pub fn append_turn(context: &mut String, text: &str) {
    context.reserve(HUMAN_PROMPT.len() + text.len() + AI_PROMPT.len());
    context.push_str(HUMAN_PROMPT);
    context.push_str(text);
    context.push_str(AI_PROMPT);
}

/// Resets the session if due, appends `text`, persists and returns the new
/// context.
pub async fn accumulate<S: SessionStore>(
    store: &SessionAccess<S>,
    user_id: UserId,
    text: &str,
) -> String {
    let session = store.session(user_id).await;

    let mut context = if needs_reset(session.turn_count) {
        info!(
            "User {user_id} reached {} turns, resetting context",
            session.turn_count
        );
        store.clear(user_id).await;
        String::new()
    } else {
        session.context
    };

    append_turn(&mut context, text);
    store.set_context(user_id, &context).await;
    context
}
