//! Conversation sessions and the session registry
//!
//! A [`ChatSession`] owns its history and a reference to the retrieval
//! chain (and therefore the index snapshot) it was created against.
//! [`SessionStore`] is an explicit registry passed by reference wherever
//! sessions are needed; there is no process-wide singleton. Exactly one
//! session is active at a time.

use crate::chat::RetrievalChain;
use crate::errors::{ChatError, Result};
use crate::eval::EvaluationReport;
use crate::types::{Message, Role};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Title shown before the first user message arrives
const DEFAULT_TITLE: &str = "New Chat";

/// Characters of the first user message used for auto-titling
const TITLE_LEN: usize = 30;

/// One conversation thread
pub struct ChatSession {
    pub id: Uuid,
    title: String,
    history: Vec<Message>,
    chain: Option<Arc<RetrievalChain>>,
    eval_report: Option<EvaluationReport>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    fn new(title: Option<String>, chain: Option<Arc<RetrievalChain>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            history: Vec::new(),
            chain,
            eval_report: None,
            created_at: Utc::now(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn chain(&self) -> Option<&Arc<RetrievalChain>> {
        self.chain.as_ref()
    }

    /// Bind a retrieval chain; used when resuming over a persisted index
    pub fn set_chain(&mut self, chain: Arc<RetrievalChain>) {
        self.chain = Some(chain);
    }

    pub fn eval_report(&self) -> Option<&EvaluationReport> {
        self.eval_report.as_ref()
    }

    pub fn set_eval_report(&mut self, report: EvaluationReport) {
        self.eval_report = Some(report);
    }

    /// Append a message; the first user message titles an untitled session
    pub fn push(&mut self, message: Message) {
        if message.role == Role::User && self.title == DEFAULT_TITLE {
            self.title = derive_title(&message.content);
        }
        self.history.push(message);
    }
}

/// Derive a session title from the first 30 characters of a message
fn derive_title(content: &str) -> String {
    if content.chars().count() > TITLE_LEN {
        let head: String = content.chars().take(TITLE_LEN).collect();
        format!("{}...", head)
    } else if content.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        content.to_string()
    }
}

/// Registry of sessions plus the currently active one
pub struct SessionStore {
    sessions: HashMap<Uuid, ChatSession>,
    /// Creation order, for listing
    order: Vec<Uuid>,
    active: Uuid,
}

impl SessionStore {
    /// Start with one default empty session, which becomes active
    pub fn new() -> Self {
        let session = ChatSession::new(None, None);
        let id = session.id;
        let mut sessions = HashMap::new();
        sessions.insert(id, session);
        Self {
            sessions,
            order: vec![id],
            active: id,
        }
    }

    /// Create a session and make it active.
    ///
    /// Document processing passes the document name as title and the
    /// freshly built chain; "new chat" passes neither.
    pub fn create(
        &mut self,
        title: Option<String>,
        chain: Option<Arc<RetrievalChain>>,
    ) -> Uuid {
        let session = ChatSession::new(title, chain);
        let id = session.id;
        info!(session = %id, title = session.title(), "created session");
        self.sessions.insert(id, session);
        self.order.push(id);
        self.active = id;
        id
    }

    /// Switch the active session. An unknown id is a caller precondition
    /// violation.
    pub fn switch_to(&mut self, id: Uuid) -> Result<()> {
        if !self.sessions.contains_key(&id) {
            return Err(ChatError::InvalidSessionReference(id));
        }
        self.active = id;
        Ok(())
    }

    pub fn active_id(&self) -> Uuid {
        self.active
    }

    pub fn active(&self) -> &ChatSession {
        // The active id always names a live session; sessions are never
        // removed.
        &self.sessions[&self.active]
    }

    pub fn get(&self, id: Uuid) -> Result<&ChatSession> {
        self.sessions
            .get(&id)
            .ok_or(ChatError::InvalidSessionReference(id))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut ChatSession> {
        self.sessions
            .get_mut(&id)
            .ok_or(ChatError::InvalidSessionReference(id))
    }

    /// Sessions in creation order as (id, title) pairs
    pub fn list(&self) -> Vec<(Uuid, String)> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| (s.id, s.title().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
