//! Similarity-searchable vector index
//!
//! A [`VectorIndex`] is an immutable snapshot of (chunk, embedding) pairs
//! built for one document. Sessions hold an `Arc` to the snapshot they were
//! created against; building a new index never mutates an old one, so a
//! later upload cannot silently redirect an existing conversation.

pub mod builder;
pub mod retriever;
pub mod store;

pub use builder::IndexBuilder;
pub use retriever::Retriever;
pub use store::IndexStore;

use crate::types::Chunk;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One indexed chunk with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// Metadata recorded with every built index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Embedding model the index was built with; queries must use the same
    pub embedding_model: String,
    /// Embedding dimensionality
    pub dimension: usize,
    /// Monotonic build sequence number, also the persistence version
    pub version: u64,
    /// Name of the source document
    pub document_name: String,
    pub built_at: DateTime<Utc>,
}

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Immutable snapshot of an embedded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    metadata: IndexMetadata,
}

impl VectorIndex {
    pub fn new(entries: Vec<IndexEntry>, metadata: IndexMetadata) -> Self {
        Self { entries, metadata }
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` entries nearest to `query` by cosine similarity,
    /// best first. Ties keep insertion order; an empty index returns an
    /// empty vec rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        // Stable sort by descending score; equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect()
    }
}

/// Cosine similarity; zero vectors or mismatched lengths score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, page: u32) -> Chunk {
        Chunk {
            text: text.to_string(),
            page,
            source_id: "doc".to_string(),
        }
    }

    fn metadata() -> IndexMetadata {
        IndexMetadata {
            embedding_model: "test-embed".to_string(),
            dimension: 3,
            version: 1,
            document_name: "doc.pdf".to_string(),
            built_at: Utc::now(),
        }
    }

    fn index_with(entries: Vec<(Chunk, Vec<f32>)>) -> VectorIndex {
        let entries = entries
            .into_iter()
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();
        VectorIndex::new(entries, metadata())
    }

    #[test]
    fn test_cosine_similarity_identity() {
        let v = vec![0.5, 0.5, 0.7];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = index_with(vec![]);
        assert!(index.search(&[1.0, 0.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = index_with(vec![
            (chunk("far", 1), vec![0.0, 1.0, 0.0]),
            (chunk("near", 2), vec![1.0, 0.1, 0.0]),
            (chunk("exact", 3), vec![1.0, 0.0, 0.0]),
        ]);

        let results = index.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "exact");
        assert_eq!(results[1].chunk.text, "near");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let index = index_with(vec![
            (chunk("first", 1), vec![1.0, 0.0, 0.0]),
            (chunk("second", 2), vec![2.0, 0.0, 0.0]), // same direction, same cosine
            (chunk("third", 3), vec![1.0, 0.0, 0.0]),
        ]);

        let results = index.search(&[1.0, 0.0, 0.0], 3);
        let texts: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = index_with(vec![(chunk("only", 1), vec![1.0, 0.0, 0.0])]);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 10).len(), 1);
    }

    #[test]
    fn test_index_serialization_round_trip() {
        let index = index_with(vec![(chunk("persisted", 4), vec![0.1, 0.2, 0.3])]);
        let json = serde_json::to_string(&index).unwrap();
        let back: VectorIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.metadata().embedding_model, "test-embed");
        let results = back.search(&[0.1, 0.2, 0.3], 1);
        assert_eq!(results[0].chunk.page, 4);
    }
}
