//! Interactive chat loop
//!
//! Thin terminal surface over [`DocChat`]: a rustyline prompt, slash
//! commands for the session/document operations, and colored output with
//! expandable source citations. All pipeline behavior lives in the
//! engine; this module only renders and dispatches.

use crate::engine::DocChat;
use crate::errors::Result;
use crate::eval::EvaluationReport;
use anyhow::Context;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::Path;
use std::time::Duration;

const HELP: &str = "Commands:
  /open <path>    process a document and start a new chat
  /new            start an empty chat
  /sessions       list sessions
  /switch <n>     switch to session n (from /sessions)
  /eval           run the built-in evaluation set
  /help           show this help
  /quit           exit

Anything else is sent as a question.";

/// Run the interactive loop until EOF or /quit
pub async fn run(engine: &mut DocChat) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("failed to initialize input")?;

    println!("{}", "DocChat - ask questions about your documents".bold());
    println!("Type {} for commands.\n", "/help".cyan());

    loop {
        let title = engine.sessions().active().title().to_string();
        let prompt = format!("{} > ", title.green());

        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        if let Some(command) = line.strip_prefix('/') {
            if !dispatch_command(engine, command).await? {
                break;
            }
            continue;
        }

        submit_question(engine, line).await;
    }

    Ok(())
}

/// Handle a slash command; returns false when the loop should exit
async fn dispatch_command(engine: &mut DocChat, command: &str) -> anyhow::Result<bool> {
    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" | "q" => return Ok(false),
        "help" => println!("{}", HELP),
        "open" => open_document(engine, rest).await,
        "new" => {
            engine.new_chat();
            println!("Started a new chat.");
        }
        "sessions" => {
            let active = engine.sessions().active_id();
            for (i, (id, title)) in engine.sessions().list().iter().enumerate() {
                let marker = if *id == active { "*" } else { " " };
                println!("{} {} {}", marker, format!("[{}]", i).cyan(), title);
            }
        }
        "switch" => switch_session(engine, rest),
        "eval" => run_evaluation(engine).await,
        other => println!("{} unknown command '/{}'", "error:".red(), other),
    }

    Ok(true)
}

async fn open_document(engine: &mut DocChat, path: &str) {
    if path.is_empty() {
        println!("{} usage: /open <path>", "error:".red());
        return;
    }

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("{} cannot read {}: {}", "error:".red(), path, e);
            return;
        }
    };
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    let spinner = spinner("Processing document...");
    let outcome = engine.process_document(&bytes, &name).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(_) => println!("{} Started a new chat for {}.", "Document processed!".green(), name),
        Err(e) => println!("{} {}", "error:".red(), e),
    }
}

fn switch_session(engine: &mut DocChat, arg: &str) {
    let sessions = engine.sessions().list();
    let target = arg
        .parse::<usize>()
        .ok()
        .and_then(|i| sessions.get(i).map(|(id, _)| *id));

    match target {
        Some(id) => {
            // Listed ids always exist, so this cannot fail
            engine.sessions_mut().switch_to(id).expect("listed session exists");
            println!("Switched to {}.", engine.sessions().active().title());
        }
        None => println!("{} usage: /switch <n> (see /sessions)", "error:".red()),
    }
}

async fn submit_question(engine: &mut DocChat, question: &str) {
    let session = engine.sessions().active_id();
    let spinner = spinner("Thinking...");
    let outcome = engine.submit_turn(session, question).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(message) => {
            println!("\n{}\n", message.content);
            if !message.sources.is_empty() {
                println!("{}", "Sources:".dimmed());
                for source in &message.sources {
                    println!(
                        "  {} {}",
                        format!("[page {}]", source.page).cyan(),
                        source.snippet.dimmed()
                    );
                }
                println!();
            }
        }
        Err(e) => println!("{} {}", "error:".red(), e),
    }
}

async fn run_evaluation(engine: &mut DocChat) {
    let session = engine.sessions().active_id();
    let spinner = spinner("Running evaluation...");
    let outcome = engine.run_evaluation(session).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(report) => print_report(&report),
        Err(e) => println!("{} {}", "error:".red(), e),
    }
}

/// Render an evaluation report to the terminal
pub fn print_report(report: &EvaluationReport) {
    println!("\n{}", "Evaluation Results".bold());
    for record in &report.records {
        let score = if record.score == 0 {
            format!("{}", record.score).red()
        } else {
            format!("{}", record.score).green()
        };
        println!("\n{} {}", "Q:".bold(), record.question);
        println!("{} {}", "Score:".bold(), score);
        println!("{} {}", "Justification:".bold(), record.justification);
    }
    println!(
        "\nAverage score: {:.1} (scores are generated by an AI judge, 1=poor, 10=excellent)\n",
        report.average_score()
    );
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// One-shot question against the active session, for the `ask` subcommand
pub async fn ask_once(engine: &mut DocChat, question: &str) -> Result<()> {
    let session = engine.sessions().active_id();
    let message = engine.submit_turn(session, question).await?;
    println!("{}", message.content);
    for source in &message.sources {
        println!("{}", format!("[page {}] {}", source.page, source.snippet).dimmed());
    }
    Ok(())
}
