//! Small text and file helpers shared across crates.

use std::path::Path;

/// Number of log lines returned by the `/log` admin command.
pub const LOG_TAIL_LINES: usize = 20;

/// Length in characters, which is what Telegram's message limit counts.
#[must_use]
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Returns the last `n` lines of `text`, keeping their line endings.
#[must_use]
pub fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].concat()
}

/// Reads a file and returns its last `n` lines.
pub async fn tail_file(path: &Path, n: usize) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(last_lines(&String::from_utf8_lossy(&bytes), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_counts_scalars_not_bytes() {
        assert_eq!(char_len("héllo"), 5);
        assert_eq!(char_len("对话"), 2);
    }

    #[test]
    fn last_lines_keeps_tail() {
        let text = "a\nb\nc\nd\n";
        assert_eq!(last_lines(text, 2), "c\nd\n");
        assert_eq!(last_lines(text, 10), text);
        assert_eq!(last_lines("", 3), "");
    }

    #[tokio::test]
    async fn tail_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.log");
        let body: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        tokio::fs::write(&path, body).await.unwrap();

        let tail = tail_file(&path, LOG_TAIL_LINES).await.unwrap();
        assert_eq!(tail.lines().count(), 20);
        assert!(tail.starts_with("line 11\n"));
        assert!(tail.ends_with("line 30\n"));
    }

    #[tokio::test]
    async fn tail_file_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(tail_file(&dir.path().join("nope.log"), 5).await.is_err());
    }
}
