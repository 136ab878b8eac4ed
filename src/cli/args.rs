//! Command-line argument parsing
//!
//! Provides clap-based CLI with subcommands and model overrides.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DocChat - chat with your documents using a local Ollama model
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(version)]
#[command(about = "Upload a document and ask questions about it", long_about = None)]
pub struct Args {
    /// Document to process before starting (PDF or plain text)
    #[arg(value_name = "DOCUMENT")]
    pub document: Option<PathBuf>,

    /// Chat model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Embedding model to use
    #[arg(long)]
    pub embedding_model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Chunks retrieved per question
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Verbosity: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,

    /// Ask a single question against the last indexed document
    Ask {
        /// The question to ask
        question: String,
    },

    /// Run the built-in evaluation set against the last indexed document
    Eval,

    /// Display current configuration
    Config,
}

impl Args {
    /// Tracing filter directive for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "docchat=warn",
            1 => "docchat=debug",
            _ => "trace",
        }
    }
}
