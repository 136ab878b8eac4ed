//! History-aware query rewriting
//!
//! Follow-up questions ("what about its drawbacks?") are useless as search
//! queries on their own. The rewriter hands the transcript and the new
//! question to the generative model and gets back a standalone query.
//! With no history there is nothing to resolve, so the input passes
//! through without a model call.

use crate::providers::{GenerateRequest, GenerativeProvider, PromptMessage};
use crate::types::{Message, Role};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed instruction appended after the transcript and new question
const REWRITE_INSTRUCTION: &str = "Given the above conversation, generate a search query to \
    look up in order to get information relevant to the conversation. Respond with only the \
    search query, nothing else.";

/// Rewrites follow-up questions into standalone search queries
pub struct QueryRewriter {
    generator: Arc<dyn GenerativeProvider>,
}

impl QueryRewriter {
    pub fn new(generator: Arc<dyn GenerativeProvider>) -> Self {
        Self { generator }
    }

    /// Produce a standalone search query for `input`.
    ///
    /// Falls back to the raw input when the model call fails: a degraded
    /// search beats an aborted turn.
    pub async fn rewrite(&self, history: &[Message], input: &str) -> String {
        if history.is_empty() {
            return input.to_string();
        }

        let mut messages: Vec<PromptMessage> = history
            .iter()
            .map(|m| match m.role {
                Role::User => PromptMessage::user(&m.content),
                Role::Assistant => PromptMessage::assistant(&m.content),
            })
            .collect();
        messages.push(PromptMessage::user(input));
        messages.push(PromptMessage::user(REWRITE_INSTRUCTION));

        match self.generator.generate(GenerateRequest::new(messages)).await {
            Ok(query) => {
                let query = query.trim().to_string();
                if query.is_empty() {
                    warn!("rewriter returned empty query, using raw input");
                    return input.to_string();
                }
                debug!(input, rewritten = %query, "rewrote query");
                query
            }
            Err(e) => {
                warn!(error = %e, "query rewriting failed, using raw input");
                input.to_string()
            }
        }
    }
}
