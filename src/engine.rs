//! Engine facade: document processing, turns, and evaluation runs
//!
//! [`DocChat`] owns the session registry, the index store, and the
//! providers, and exposes the three core operations the user-facing
//! surface calls: `process_document`, `submit_turn`, `run_evaluation`.
//!
//! Index replacement is an atomic swap of an `Arc` snapshot: processing a
//! new document builds and persists a fresh snapshot and binds it to a
//! fresh session, while sessions created earlier keep the snapshot they
//! were born with.

use crate::chat::RetrievalChain;
use crate::config::Config;
use crate::document::{loader_for, TextChunker};
use crate::errors::{ChatError, Result};
use crate::eval::{default_questions, EvaluationReport, Evaluator};
use crate::index::{IndexBuilder, IndexStore, VectorIndex};
use crate::providers::{EmbeddingProvider, GenerativeProvider, OllamaProvider};
use crate::session::SessionStore;
use crate::types::Message;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Top-level document chat engine
pub struct DocChat {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerativeProvider>,
    judge: Arc<dyn GenerativeProvider>,
    index_store: IndexStore,
    sessions: SessionStore,
    /// Latest built snapshot; sessions keep their own Arc
    current_index: Option<Arc<VectorIndex>>,
}

impl DocChat {
    /// Build an engine with explicit providers (tests inject fakes here)
    pub fn new(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerativeProvider>,
        judge: Arc<dyn GenerativeProvider>,
    ) -> Result<Self> {
        let index_dir = config
            .index_dir()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self {
            config,
            embedder,
            generator,
            judge,
            index_store: IndexStore::new(index_dir),
            sessions: SessionStore::new(),
            current_index: None,
        })
    }

    /// Build an engine wired to a local Ollama server
    pub fn with_ollama(config: Config) -> Result<Self> {
        let provider = Arc::new(OllamaProvider::new(&config.ollama)?);
        let judge = Arc::new(provider.with_chat_model(&config.ollama.judge_model));
        Self::new(config, provider.clone(), provider, judge)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    /// Process an uploaded document: load, chunk, embed, persist, and
    /// create a session bound to the fresh snapshot.
    ///
    /// Any failure aborts with no session created and no index swap.
    pub async fn process_document(&mut self, bytes: &[u8], name: &str) -> Result<Uuid> {
        let pages = loader_for(name).load(bytes, name)?;

        let chunker = TextChunker::new(
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        );
        let chunks = chunker.chunk(&pages, name);

        let version = self
            .index_store
            .next_version()
            .map_err(|e| ChatError::IndexBuildFailure(e.to_string()))?;

        let builder = IndexBuilder::new(
            self.embedder.clone(),
            self.config.retrieval.embed_batch_size,
        );
        let index = builder.build(chunks, name, version).await?;
        self.index_store.save(&index)?;

        let snapshot = Arc::new(index);
        self.current_index = Some(snapshot.clone());

        let chain = Arc::new(self.chain_for(snapshot));
        let session_id = self.sessions.create(Some(name.to_string()), Some(chain));

        info!(document = name, session = %session_id, version, "document processed");
        Ok(session_id)
    }

    /// Start an empty conversation with no bound document
    pub fn new_chat(&mut self) -> Uuid {
        self.sessions.create(None, None)
    }

    /// Bind the persisted current snapshot to the active session if it has
    /// no chain yet. Lets a restarted process resume chatting over the
    /// last indexed document. Returns whether a chain was bound.
    pub fn bind_persisted_index(&mut self) -> Result<bool> {
        let active = self.sessions.active_id();
        if self.sessions.get(active)?.chain().is_some() {
            return Ok(false);
        }

        let snapshot = match &self.current_index {
            Some(snapshot) => snapshot.clone(),
            None => match self.index_store.load_current()? {
                Some(index) => Arc::new(index),
                None => return Ok(false),
            },
        };

        self.current_index = Some(snapshot.clone());
        let chain = Arc::new(self.chain_for(snapshot));
        self.sessions.get_mut(active)?.set_chain(chain);
        Ok(true)
    }

    /// Run one conversational turn in a session.
    ///
    /// The user message is appended before the pipeline runs; on failure
    /// it is the only thing that stays, so the exchange can be retried.
    /// A session with no bound document fails with `IndexEmpty` and
    /// appends nothing.
    pub async fn submit_turn(&mut self, session_id: Uuid, text: &str) -> Result<Message> {
        let session = self.sessions.get(session_id)?;
        let Some(chain) = session.chain().cloned() else {
            return Err(ChatError::IndexEmpty);
        };
        let history: Vec<Message> = session.history().to_vec();

        let session = self.sessions.get_mut(session_id)?;
        session.push(Message::user(text));

        let outcome = chain.run_turn(&history, text).await?;

        let reply = Message::assistant(outcome.answer, outcome.sources);
        self.sessions.get_mut(session_id)?.push(reply.clone());
        Ok(reply)
    }

    /// Evaluate the session's chain against the built-in question set and
    /// store the report on the session
    pub async fn run_evaluation(&mut self, session_id: Uuid) -> Result<EvaluationReport> {
        let session = self.sessions.get(session_id)?;
        let Some(chain) = session.chain().cloned() else {
            return Err(ChatError::IndexEmpty);
        };

        let evaluator = Evaluator::new(self.judge.clone());
        let report = evaluator.evaluate(&chain, &default_questions()).await;

        self.sessions
            .get_mut(session_id)?
            .set_eval_report(report.clone());
        Ok(report)
    }

    fn chain_for(&self, snapshot: Arc<VectorIndex>) -> RetrievalChain {
        RetrievalChain::new(
            snapshot,
            self.embedder.clone(),
            self.generator.clone(),
            self.config.retrieval.top_k,
        )
    }
}
