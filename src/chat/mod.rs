// Query-time conversation pipeline: rewrite -> retrieve -> compose.

pub mod composer;
pub mod pipeline;
pub mod rewriter;

pub use composer::{AnswerComposer, ComposedAnswer};
pub use pipeline::{RetrievalChain, TurnOutcome, TurnStage};
pub use rewriter::QueryRewriter;
