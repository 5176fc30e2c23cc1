use std::future::Future;
use tracing::{error, warn};

/// Attempts made against the completion provider for one turn.
pub const MAX_TRIES: usize = 3;

/// Runs `operation` until it yields non-empty text, at most `max_tries` times.
///
/// `after_attempt` runs after every attempt, whatever its result, with the
/// 1-based attempt number. Errors and empty strings are both retried; there is
/// no delay between attempts.
///
/// # Returns
/// The first non-empty text, or `None` once every attempt has failed
pub async fn retry_until_text<F, Fut, A, AFut>(
    max_tries: usize,
    mut operation: F,
    mut after_attempt: A,
) -> Option<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<String>>,
    A: FnMut(usize) -> AFut,
    AFut: Future<Output = ()>,
{
    for attempt in 1..=max_tries {
        let result = operation().await;
        after_attempt(attempt).await;

        match result {
            Ok(text) if !text.is_empty() => return Some(text),
            Ok(_) => warn!("Empty completion (attempt {attempt}/{max_tries})"),
            Err(e) => warn!("Completion failed (attempt {attempt}/{max_tries}): {e}"),
        }
    }

    error!("Failed to get a response after {max_tries} attempts");
    None
}
