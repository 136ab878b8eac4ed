//! DocChat - main CLI entry point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use docchat::cli::{apply_overrides, Args, Commands};
use docchat::config::Config;
use docchat::engine::DocChat;
use docchat::repl;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_target(false)
        .init();

    let mut config = Config::load().context("failed to load configuration")?;
    apply_overrides(&mut config, &args);

    if let Some(Commands::Config) = args.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut engine = DocChat::with_ollama(config)?;

    // Process a document given on the command line before anything else
    if let Some(path) = &args.document {
        let bytes = std::fs::read(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        engine
            .process_document(&bytes, &name)
            .await
            .with_context(|| format!("failed to process {}", name))?;
        println!("{} {}", "Indexed".green(), name);
    }

    match args.command {
        None | Some(Commands::Chat) => {
            repl::run(&mut engine).await?;
        }
        Some(Commands::Ask { question }) => {
            engine.bind_persisted_index()?;
            repl::ask_once(&mut engine, &question).await?;
        }
        Some(Commands::Eval) => {
            engine.bind_persisted_index()?;
            let session = engine.sessions().active_id();
            let report = engine.run_evaluation(session).await?;
            repl::print_report(&report);
        }
        Some(Commands::Config) => unreachable!("handled above"),
    }

    Ok(())
}
