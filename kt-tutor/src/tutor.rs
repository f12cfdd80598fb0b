//! The tutoring workflow.
//!
//! `start` loads a project's document, splits it into chunks and seeds a
//! conversation with the whole text, then explains the first chunk. Each
//! `reply` either advances to the next chunk or asks the model to clarify
//! the current one. Model failures never reach the caller: every call site
//! degrades to a fixed apology and leaves the cursor where it was.

use crate::chunker::{split_into_chunks, DEFAULT_MAX_CHARS};
use crate::documents::DocumentLoader;
use crate::intent::{Intent, IntentClassifier, KeywordClassifier};
use crate::provider::{Conversation, ConversationSettings, Message, Provider};
use crate::session::{InMemorySessionRepository, Session, SessionRepository};
use kt_common::{Config, Error, Result};
use std::sync::Arc;

pub const MISSING_PROJECT: &str = "Project name is required.";
pub const DOCUMENT_NOT_FOUND: &str =
    "Project document not found. Please check the file name and try again.";
pub const SESSION_NOT_FOUND: &str = "Session not found. Please start a new session.";

pub const SEED_ACKNOWLEDGEMENT: &str = "Understood. I'm ready to begin the KT session.";
pub const COMPLETION_MESSAGE: &str =
    "✅ You've completed the KT session! Let me know if you want to review anything.";
pub const EXPLAIN_TRAILER: &str =
    "\n\n**Did you understand this part?** (You can say 'yes' or ask a question.)";
pub const CLARIFY_TRAILER: &str = "\n\n**Ready to move on?**";
pub const EXPLAIN_FALLBACK: &str =
    "I'm sorry, I ran into a problem while processing that chunk. Let's try again.";
pub const CLARIFY_FALLBACK: &str =
    "I'm sorry, I couldn't process your clarification request. Please try again.";

/// Instruction that opens every session. Carries the full document so the
/// model can answer questions about parts not yet shown.
fn seed_prompt(project: &str, document: &str) -> String {
    format!(
        "You are an AI assistant tasked with explaining a Knowledge Transfer document \
         for the '{project}' project to a new employee. Explain the document in a simple, \
         professional way, one section at a time, and do not give every detail at once. \
         Start with the client name, the client's background, and the company's contract \
         with that client: in which field and for how many years. \
         The document text is:\n\n{document}"
    )
}

fn explain_prompt(chunk: &str) -> String {
    format!("Explain this part of the document in simple terms:\n\n{chunk}")
}

fn clarify_prompt(reply: &str) -> String {
    format!(
        "The user asked: '{reply}'. Please clarify or explain it again, \
         considering the previous explanation and the document."
    )
}

/// Drives tutoring sessions.
pub struct Tutor {
    sessions: Arc<dyn SessionRepository>,
    provider: Arc<dyn Provider>,
    loader: DocumentLoader,
    classifier: Arc<dyn IntentClassifier>,
    settings: ConversationSettings,
    max_chunk_chars: usize,
}

impl Tutor {
    /// Create a tutor with an in-memory session store and the default
    /// keyword classifier.
    pub fn new(
        loader: DocumentLoader,
        provider: Arc<dyn Provider>,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            provider,
            loader,
            classifier: Arc::new(KeywordClassifier::default()),
            settings,
            max_chunk_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Create a tutor from service configuration.
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>) -> Self {
        Self::new(
            DocumentLoader::new(&config.documents.dir),
            provider,
            ConversationSettings::from(&config.llm),
        )
        .with_classifier(Arc::new(KeywordClassifier::new(
            &config.tutor.affirmative_tokens,
        )))
        .with_max_chunk_chars(config.documents.max_chunk_chars)
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionRepository>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_chunk_chars(mut self, max_chunk_chars: usize) -> Self {
        self.max_chunk_chars = max_chunk_chars;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionRepository> {
        &self.sessions
    }

    pub fn loader(&self) -> &DocumentLoader {
        &self.loader
    }

    /// Start (or restart) the walkthrough for a project and explain its
    /// first chunk.
    pub async fn start(&self, project: &str) -> Result<String> {
        let project = project.trim();
        if project.is_empty() {
            return Err(Error::InvalidInput(MISSING_PROJECT.into()));
        }

        let loader = self.loader.clone();
        let name = project.to_string();
        let document = tokio::task::spawn_blocking(move || loader.load(&name))
            .await
            .map_err(|e| {
                Error::Internal(e.to_string())
                    .with_context("An error occurred while starting the session")
            })?
            .ok_or_else(|| Error::NotFound(DOCUMENT_NOT_FOUND.into()))?;

        let chunks = split_into_chunks(&document, self.max_chunk_chars);
        tracing::info!(
            project = %project,
            chunks = chunks.len(),
            max_chunk_chars = self.max_chunk_chars,
            "Starting KT session"
        );

        let conversation = Conversation::new(
            self.provider.clone(),
            self.settings.clone(),
            vec![
                Message::user(seed_prompt(project, &document)),
                Message::assistant(SEED_ACKNOWLEDGEMENT),
            ],
        );

        let handle = self
            .sessions
            .put(Session::new(project, chunks, conversation))
            .await;
        let mut session = handle.lock().await;
        Ok(explain(&mut session).await)
    }

    /// Handle a learner reply for a project's active session.
    pub async fn reply(&self, project: &str, user_reply: &str) -> Result<String> {
        let project = project.trim();
        let user_reply = user_reply.trim();

        let handle = self
            .sessions
            .get(project)
            .await
            .ok_or_else(|| Error::NotFound(SESSION_NOT_FOUND.into()))?;
        let mut session = handle.lock().await;
        session.touch();

        let intent = self.classifier.classify(user_reply);
        tracing::debug!(project = %project, ?intent, cursor = session.cursor, "Classified reply");

        let reply = match intent {
            Intent::Acknowledge => {
                session.advance();
                explain(&mut session).await
            }
            Intent::Clarify => clarify(&mut session, user_reply).await,
        };
        Ok(reply)
    }

    /// Every document in the documents directory, by filename.
    pub async fn list_projects(&self) -> Result<Vec<String>> {
        let loader = self.loader.clone();
        tokio::task::spawn_blocking(move || loader.list_projects())
            .await
            .map_err(|e| Error::Internal(e.to_string()))?
    }
}

/// Explain the chunk at the cursor. Never advances the cursor.
async fn explain(session: &mut Session) -> String {
    let Some(chunk) = session.current_chunk() else {
        return COMPLETION_MESSAGE.to_string();
    };
    let prompt = explain_prompt(chunk);
    let cursor = session.cursor;

    match session.conversation.send(prompt).await {
        Ok(text) => {
            tracing::info!(
                project = %session.project,
                chunk = cursor + 1,
                of = session.chunks.len(),
                "Explained chunk"
            );
            text + EXPLAIN_TRAILER
        }
        Err(e) => {
            tracing::error!(project = %session.project, chunk = cursor + 1, error = %e, "Error explaining chunk");
            EXPLAIN_FALLBACK.to_string()
        }
    }
}

async fn clarify(session: &mut Session, user_reply: &str) -> String {
    match session.conversation.send(clarify_prompt(user_reply)).await {
        Ok(text) => text + CLARIFY_TRAILER,
        Err(e) => {
            tracing::error!(project = %session.project, error = %e, "Error answering clarification");
            CLARIFY_FALLBACK.to_string()
        }
    }
}
