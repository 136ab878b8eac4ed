// CLI argument surface; the interactive loop lives in `repl`.

pub mod args;

pub use args::{Args, Commands};

use crate::config::Config;

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(model) = &args.model {
        config.ollama.chat_model = model.clone();
    }
    if let Some(model) = &args.embedding_model {
        config.ollama.embedding_model = model.clone();
    }
    if let Some(url) = &args.base_url {
        config.ollama.base_url = url.clone();
    }
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k;
    }
}
