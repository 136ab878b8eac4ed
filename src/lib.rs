//! DocChat - Chat with your documents
//!
//! A local retrieval-augmented conversation engine: upload a document,
//! build a chunked + embedded similarity index over it, and ask questions
//! with page-level citations, history-aware query rewriting, and an
//! LLM-judge evaluation harness.
//!
//! # Architecture
//!
//! - Build time: document loader -> chunker -> index builder -> store
//! - Query time: query rewriter -> retriever -> answer composer, run per
//!   session by the engine
//! - Evaluation: the same query path in batch, scored by a judge model

pub mod errors;
pub mod types;
pub mod config;

pub mod document;
pub mod providers;
pub mod index;
pub mod chat;
pub mod session;
pub mod eval;
pub mod engine;

pub mod cli;
pub mod repl;

// Re-export commonly used types
pub use engine::DocChat;
pub use errors::{ChatError, Result};
