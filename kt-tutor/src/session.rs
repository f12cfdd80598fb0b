//! Tutoring sessions and their store.
//!
//! There is at most one session per project name. Starting a project again
//! replaces its session, so two learners on the same project share (and
//! clobber) one walkthrough. Each session sits behind its own mutex so turns
//! on one project never wait on another.

use crate::provider::Conversation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Walkthrough state for one project.
#[derive(Debug)]
pub struct Session {
    pub project: String,
    pub chunks: Vec<String>,
    /// Index of the chunk currently being explained; equals `chunks.len()`
    /// once the walkthrough is complete.
    pub cursor: usize,
    pub conversation: Conversation,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(project: impl Into<String>, chunks: Vec<String>, conversation: Conversation) -> Self {
        let now = Utc::now();
        Self {
            project: project.into(),
            chunks,
            cursor: 0,
            conversation,
            created_at: now,
            last_activity: now,
        }
    }

    /// The chunk at the cursor, or `None` when the walkthrough is done.
    pub fn current_chunk(&self) -> Option<&str> {
        self.chunks.get(self.cursor).map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.chunks.len()
    }

    /// Move to the next chunk. Never moves past `chunks.len()`.
    pub fn advance(&mut self) {
        if self.cursor < self.chunks.len() {
            self.cursor += 1;
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Storage for sessions keyed by project name.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Look up the session for a project.
    async fn get(&self, project: &str) -> Option<SessionHandle>;

    /// Store a session, replacing any existing one for the same project.
    async fn put(&self, session: Session) -> SessionHandle;

    /// Drop a project's session. Returns whether one existed.
    async fn remove(&self, project: &str) -> bool;

    /// Number of live sessions.
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Process-local session store. Sessions are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn get(&self, project: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(project).cloned()
    }

    async fn put(&self, session: Session) -> SessionHandle {
        let project = session.project.clone();
        let handle = Arc::new(Mutex::new(session));
        let replaced = self
            .sessions
            .write()
            .await
            .insert(project.clone(), handle.clone())
            .is_some();

        if replaced {
            tracing::info!(project = %project, "Replaced existing session");
        }
        handle
    }

    async fn remove(&self, project: &str) -> bool {
        self.sessions.write().await.remove(project).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
