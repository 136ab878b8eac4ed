// Document intake: loading page text and splitting it into chunks.

pub mod chunker;
pub mod loader;

pub use chunker::TextChunker;
pub use loader::{loader_for, DocumentLoader, PdfLoader, PlainTextLoader};
