//! In-memory collaborators for the engine's unit tests.

use async_trait::async_trait;
use parley_core::{
    CompletionProvider, DocumentSource, ReplySink, Session, SessionStore, UserId, UserSummary,
};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<UserId, Session>>,
    fail: bool,
}

impl MemoryStore {
    pub fn with_users(ids: &[UserId]) -> Self {
        let store = Self::default();
        {
            let mut sessions = store.sessions.lock().unwrap();
            for id in ids {
                sessions.insert(*id, Session::new(*id));
            }
        }
        store
    }

    pub fn with_session(session: Session) -> Self {
        let store = Self::default();
        store
            .sessions
            .lock()
            .unwrap()
            .insert(session.user_id, session);
        store
    }

    pub fn failing() -> Self {
        Self {
            sessions: Mutex::default(),
            fail: true,
        }
    }

    pub fn snapshot(&self, user_id: UserId) -> Option<Session> {
        self.sessions.lock().unwrap().get(&user_id).cloned()
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("database is locked");
        }
        Ok(())
    }

    fn update(&self, user_id: UserId, change: impl FnOnce(&mut Session)) -> anyhow::Result<()> {
        self.check()?;
        if let Some(session) = self.sessions.lock().unwrap().get_mut(&user_id) {
            change(session);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn exists(&self, user_id: UserId) -> anyhow::Result<bool> {
        self.check()?;
        Ok(self.sessions.lock().unwrap().contains_key(&user_id))
    }

    async fn create(&self, user_id: UserId) -> anyhow::Result<bool> {
        self.check()?;
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(&user_id) {
            return Ok(false);
        }
        sessions.insert(user_id, Session::new(user_id));
        Ok(true)
    }

    async fn delete(&self, user_id: UserId) -> anyhow::Result<bool> {
        self.check()?;
        Ok(self.sessions.lock().unwrap().remove(&user_id).is_some())
    }

    async fn fetch(&self, user_id: UserId) -> anyhow::Result<Option<Session>> {
        self.check()?;
        Ok(self.snapshot(user_id))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<UserSummary>> {
        self.check()?;
        let mut users: Vec<UserSummary> = self
            .sessions
            .lock()
            .unwrap()
            .values()
            .map(|s| UserSummary {
                user_id: s.user_id,
                turn_count: s.turn_count,
            })
            .collect();
        users.sort_by_key(|u| u.user_id);
        Ok(users)
    }

    async fn set_context(&self, user_id: UserId, context: &str) -> anyhow::Result<()> {
        self.update(user_id, |s| s.context = context.to_string())
    }

    async fn increment_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        self.update(user_id, |s| s.turn_count += 1)
    }

    async fn reset_turn_count(&self, user_id: UserId) -> anyhow::Result<()> {
        self.update(user_id, |s| s.turn_count = 0)
    }
}

/// Replays a fixed script of results, then keeps returning `fallback`.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: Result<String, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl ScriptedProvider {
    pub fn always(text: &str) -> Self {
        Self::new(Vec::new(), Ok(text.to_string()))
    }

    pub fn always_failing() -> Self {
        Self::new(Vec::new(), Err("overloaded".to_string()))
    }

    pub fn new(script: Vec<Result<String, String>>, fallback: Result<String, String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::default(),
            gate: None,
        }
    }

    /// Each call signals `entered`, then waits for `release` before answering.
    pub fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        next.map_err(|e| anyhow::anyhow!(e))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Code(String),
    /// Path sent, plus what the file held at send time.
    Document { path: PathBuf, contents: String },
}

#[derive(Default)]
pub struct RecordingSink {
    replies: Mutex<Vec<Reply>>,
    fail_documents: bool,
}

impl RecordingSink {
    pub fn failing_documents() -> Self {
        Self {
            replies: Mutex::default(),
            fail_documents: true,
        }
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.replies()
            .into_iter()
            .filter_map(|r| match r {
                Reply::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn reply_text(&self, text: &str) -> anyhow::Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push(Reply::Text(text.to_string()));
        Ok(())
    }

    async fn reply_code(&self, text: &str) -> anyhow::Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push(Reply::Code(text.to_string()));
        Ok(())
    }

    async fn reply_document(&self, path: &Path) -> anyhow::Result<()> {
        let contents = std::fs::read_to_string(path).unwrap_or_default();
        self.replies.lock().unwrap().push(Reply::Document {
            path: path.to_path_buf(),
            contents,
        });
        if self.fail_documents {
            anyhow::bail!("Bad Request: file upload failed");
        }
        Ok(())
    }
}

/// An upload whose download can be held open until the test releases it.
pub struct StubDocument {
    name: String,
    size: u64,
    contents: Vec<u8>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
    fail_download: bool,
    downloaded_to: Mutex<Option<PathBuf>>,
}

impl StubDocument {
    pub fn new(name: &str, contents: &str) -> Self {
        Self {
            name: name.to_string(),
            size: contents.len() as u64,
            contents: contents.as_bytes().to_vec(),
            gate: None,
            fail_download: false,
            downloaded_to: Mutex::default(),
        }
    }

    /// Declares `size` regardless of the actual contents.
    pub const fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Signals `entered` once the download starts, then waits for `release`.
    pub fn gated(mut self, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        self.gate = Some((entered, release));
        self
    }

    pub const fn failing(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub fn downloaded_to(&self) -> Option<PathBuf> {
        self.downloaded_to.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for StubDocument {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn file_size(&self) -> u64 {
        self.size
    }

    async fn download_to(&self, dest: &Path) -> anyhow::Result<()> {
        *self.downloaded_to.lock().unwrap() = Some(dest.to_path_buf());
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        if self.fail_download {
            anyhow::bail!("download interrupted");
        }
        tokio::fs::write(dest, &self.contents).await?;
        Ok(())
    }
}
