//! Query-time retrieval over an index snapshot
//!
//! Embeds the query with the same provider the index was built with and
//! runs the similarity search. An embedding-model mismatch would silently
//! corrupt scores, so it is rejected here before any search happens.

use crate::errors::{ChatError, Result};
use crate::index::{ScoredChunk, VectorIndex};
use crate::providers::EmbeddingProvider;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the top-k chunks for a text query from one index snapshot
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `query` and return the nearest chunks, best first.
    ///
    /// An empty index yields an empty vec, not an error.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let index_model = &self.index.metadata().embedding_model;
        if self.embedder.model_name() != index_model {
            return Err(ChatError::RetrievalFailure(format!(
                "index built with embedding model '{}' but queried with '{}'",
                index_model,
                self.embedder.model_name()
            )));
        }

        let query_text = [query.to_string()];
        let embeddings = self
            .embedder
            .embed(&query_text)
            .await
            .map_err(|e| ChatError::RetrievalFailure(e.to_string()))?;

        let query_vector = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::RetrievalFailure("empty query embedding".to_string()))?;

        let results = self.index.search(&query_vector, self.top_k);
        debug!(query, results = results.len(), "retrieved chunks");
        Ok(results)
    }
}
