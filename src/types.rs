//! Core data types shared across the pipeline
//!
//! `Page` comes out of the document loader, `Chunk` out of the chunker, and
//! `Message` is what conversation histories are made of. All of these are
//! immutable once created.

use serde::{Deserialize, Serialize};

/// One page of extracted document text, as produced by a document loader
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub text: String,
    /// 1-based page number in the source document
    pub page_number: u32,
}

/// A bounded span of document text with page provenance, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    /// Page number of the chunk's first character
    pub page: u32,
    /// Identifies the document this chunk came from
    pub source_id: String,
}

/// Who authored a conversation message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A cited source passage attached to an assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    pub page: u32,
    /// Leading slice of the cited chunk, capped at [`SNIPPET_LEN`] characters
    pub snippet: String,
}

/// Maximum snippet length carried on a citation
pub const SNIPPET_LEN: usize = 200;

impl Source {
    /// Build a citation from a retrieved chunk, truncating the snippet
    /// on a character boundary.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let snippet = if chunk.text.chars().count() > SNIPPET_LEN {
            let truncated: String = chunk.text.chars().take(SNIPPET_LEN).collect();
            format!("{}...", truncated)
        } else {
            chunk.text.clone()
        };
        Self {
            page: chunk.page,
            snippet,
        }
    }
}

/// One conversation message; sources are present only on assistant messages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_short_chunk() {
        let chunk = Chunk {
            text: "short text".to_string(),
            page: 3,
            source_id: "doc".to_string(),
        };
        let source = Source::from_chunk(&chunk);
        assert_eq!(source.page, 3);
        assert_eq!(source.snippet, "short text");
    }

    #[test]
    fn test_source_truncates_long_chunk() {
        let chunk = Chunk {
            text: "x".repeat(500),
            page: 1,
            source_id: "doc".to_string(),
        };
        let source = Source::from_chunk(&chunk);
        assert!(source.snippet.ends_with("..."));
        assert_eq!(source.snippet.chars().count(), SNIPPET_LEN + 3);
    }

    #[test]
    fn test_source_truncation_multibyte_safe() {
        let chunk = Chunk {
            text: "é".repeat(300),
            page: 1,
            source_id: "doc".to_string(),
        };
        let source = Source::from_chunk(&chunk);
        assert_eq!(source.snippet.chars().count(), SNIPPET_LEN + 3);
    }

    #[test]
    fn test_message_serialization_skips_empty_sources() {
        let msg = Message::user("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("sources"));

        let msg = Message::assistant(
            "answer",
            vec![Source {
                page: 2,
                snippet: "evidence".to_string(),
            }],
        );
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("sources"));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sources.len(), 1);
    }
}
