//! Index construction: batch-embed chunks and assemble a snapshot

use crate::errors::{ChatError, Result};
use crate::index::{IndexEntry, IndexMetadata, VectorIndex};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds [`VectorIndex`] snapshots from chunked document text
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every chunk and assemble an index snapshot.
    ///
    /// Zero input chunks is an `IndexBuildFailure`; the caller must not
    /// create a session from a failed build.
    pub async fn build(
        &self,
        chunks: Vec<Chunk>,
        document_name: &str,
        version: u64,
    ) -> Result<VectorIndex> {
        if chunks.is_empty() {
            return Err(ChatError::IndexBuildFailure(
                "no chunks to index".to_string(),
            ));
        }

        info!(
            document = document_name,
            chunks = chunks.len(),
            version,
            "building index"
        );

        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let batch_embeddings = self.embedder.embed(&texts).await?;
            debug!(batch = batch_embeddings.len(), "embedded chunk batch");
            embeddings.extend(batch_embeddings);
        }

        if embeddings.len() != chunks.len() {
            return Err(ChatError::IndexBuildFailure(format!(
                "embedded {} of {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimension = embeddings[0].len();
        if embeddings.iter().any(|e| e.len() != dimension) {
            return Err(ChatError::IndexBuildFailure(
                "inconsistent embedding dimensions".to_string(),
            ));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        Ok(VectorIndex::new(
            entries,
            IndexMetadata {
                embedding_model: self.embedder.model_name().to_string(),
                dimension,
                version,
                document_name: document_name.to_string(),
                built_at: Utc::now(),
            },
        ))
    }
}
