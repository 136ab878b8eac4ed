//! Grounded answer composition
//!
//! Builds the final generation request: retrieved chunks become a context
//! block in the system prompt, prior turns carry the conversation, and the
//! exact chunks placed in context come back as the citation set. Whether
//! the model actually sticks to the context is not verified here; the
//! evaluator is the only check on that.

use crate::errors::Result;
use crate::providers::{GenerateRequest, GenerativeProvider, PromptMessage};
use crate::types::{Chunk, Message, Role};
use std::sync::Arc;
use tracing::debug;

/// System prompt template; `{context}` is replaced with the chunk block
const SYSTEM_PROMPT: &str = "You are an assistant for question-answering tasks. \
    Answer the user's questions based only on the context below. If the context does \
    not contain the answer, say that you don't know.\n\nContext:\n{context}";

/// A generated answer plus the chunks that were placed in context
#[derive(Debug, Clone)]
pub struct ComposedAnswer {
    pub answer: String,
    pub used_chunks: Vec<Chunk>,
}

/// Generates answers grounded in retrieved context
pub struct AnswerComposer {
    generator: Arc<dyn GenerativeProvider>,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn GenerativeProvider>) -> Self {
        Self { generator }
    }

    /// Generate an answer to `question` from `chunks` and `history`.
    ///
    /// Model failure propagates as `GenerationFailure`; the caller aborts
    /// the turn.
    pub async fn compose(
        &self,
        chunks: &[Chunk],
        history: &[Message],
        question: &str,
    ) -> Result<ComposedAnswer> {
        let context = build_context_block(chunks);
        let system = SYSTEM_PROMPT.replace("{context}", &context);

        let mut messages = vec![PromptMessage::system(system)];
        messages.extend(history.iter().map(|m| match m.role {
            Role::User => PromptMessage::user(&m.content),
            Role::Assistant => PromptMessage::assistant(&m.content),
        }));
        messages.push(PromptMessage::user(question));

        let answer = self
            .generator
            .generate(GenerateRequest::new(messages))
            .await?;

        debug!(
            question,
            context_chunks = chunks.len(),
            "composed answer"
        );

        Ok(ComposedAnswer {
            answer: answer.trim().to_string(),
            used_chunks: chunks.to_vec(),
        })
    }
}

/// Concatenate chunk texts, each tagged with its source page
fn build_context_block(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return "(no relevant passages found)".to_string();
    }
    chunks
        .iter()
        .map(|c| format!("[page {}] {}", c.page, c.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ChatError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the request back so tests can inspect what was sent
    struct CapturingGenerator {
        seen: Mutex<Vec<GenerateRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl GenerativeProvider for CapturingGenerator {
        async fn generate(&self, request: GenerateRequest) -> Result<String> {
            if self.fail {
                return Err(ChatError::GenerationFailure("model down".to_string()));
            }
            self.seen.lock().unwrap().push(request);
            Ok("  The answer is Paris.  ".to_string())
        }
    }

    fn chunk(text: &str, page: u32) -> Chunk {
        Chunk {
            text: text.to_string(),
            page,
            source_id: "doc".to_string(),
        }
    }

    #[tokio::test]
    async fn test_compose_returns_used_chunks() {
        let generator = Arc::new(CapturingGenerator {
            seen: Mutex::new(vec![]),
            fail: false,
        });
        let composer = AnswerComposer::new(generator.clone());

        let chunks = vec![chunk("The capital of France is Paris.", 2)];
        let composed = composer
            .compose(&chunks, &[], "What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(composed.answer, "The answer is Paris.");
        assert_eq!(composed.used_chunks, chunks);

        // Context block must land in the system prompt with the page tag
        let seen = generator.seen.lock().unwrap();
        let system = &seen[0].messages[0];
        assert!(system.content.contains("[page 2] The capital of France is Paris."));
    }

    #[tokio::test]
    async fn test_compose_includes_history() {
        let generator = Arc::new(CapturingGenerator {
            seen: Mutex::new(vec![]),
            fail: false,
        });
        let composer = AnswerComposer::new(generator.clone());

        let history = vec![
            Message::user("first question"),
            Message::assistant("first answer", vec![]),
        ];
        composer
            .compose(&[chunk("ctx", 1)], &history, "follow-up")
            .await
            .unwrap();

        let seen = generator.seen.lock().unwrap();
        // system + 2 history turns + new question
        assert_eq!(seen[0].messages.len(), 4);
        assert_eq!(seen[0].messages[1].content, "first question");
        assert_eq!(seen[0].messages[3].content, "follow-up");
    }

    #[tokio::test]
    async fn test_compose_propagates_failure() {
        let composer = AnswerComposer::new(Arc::new(CapturingGenerator {
            seen: Mutex::new(vec![]),
            fail: true,
        }));
        let err = composer.compose(&[], &[], "q").await.unwrap_err();
        assert!(matches!(err, ChatError::GenerationFailure(_)));
    }

    #[test]
    fn test_context_block_empty() {
        assert!(build_context_block(&[]).contains("no relevant passages"));
    }

    #[test]
    fn test_context_block_joins_pages() {
        let block = build_context_block(&[chunk("one", 1), chunk("two", 5)]);
        assert!(block.contains("[page 1] one"));
        assert!(block.contains("[page 5] two"));
    }
}
