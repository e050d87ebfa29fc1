//! Chat command: one-shot messages and the interactive chat loop.

pub mod commands;

use std::time::Duration;

use anyhow::Result;
use console::{Term, style};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use gumshoe_core::gateway::ChatReply;
use gumshoe_types::error::ChatError;

use self::commands::ChatCommand;
use crate::cli::conversation::print_log;
use crate::state::AppState;

/// Generate a fresh conversation key.
pub fn new_conversation_key() -> String {
    format!("conv_{}", Uuid::now_v7().simple())
}

/// Send one message, or run the interactive loop when `text` is `None`.
pub async fn chat(
    state: &AppState,
    conversation: Option<String>,
    scenario: Option<String>,
    text: Option<String>,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let generated = conversation.is_none();
    let key = conversation.unwrap_or_else(new_conversation_key);

    let Some(text) = text else {
        return run_chat_loop(state, key, scenario).await;
    };

    let reply = send_with_spinner(state, &key, &text, scenario.as_deref(), json || quiet).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    print_reply(&reply);
    if generated && !quiet {
        println!(
            "  {} Continue with: {}",
            style("i").blue().bold(),
            style(format!("gumshoe chat -c {key} \"...\"")).yellow()
        );
        println!();
    }
    Ok(())
}

async fn run_chat_loop(state: &AppState, key: String, mut scenario: Option<String>) -> Result<()> {
    print_banner(state, &key, scenario.as_deref());

    loop {
        let line = tokio::task::spawn_blocking(|| {
            Input::<String>::new()
                .with_prompt(style("you").green().bold().to_string())
                .allow_empty(true)
                .interact_text()
        })
        .await??;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = commands::parse(line) {
            match command {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => Term::stdout().clear_screen()?,
                ChatCommand::Exit => break,
                ChatCommand::History => print_log(&key, &state.gateway.history(&key).await?),
                ChatCommand::Reset => {
                    state.gateway.reset(&key).await?;
                    println!("  {} Case closed. Start over whenever you like.", style("✓").green().bold());
                }
                ChatCommand::Case(id) => {
                    if state.gateway.scenarios().iter().any(|s| s.id == id) {
                        println!("  {} Next message opens '{}'.", style("✓").green().bold(), style(&id).cyan());
                    } else {
                        println!(
                            "  {} Unknown scenario '{}', the default brief will be used.",
                            style("!").yellow().bold(),
                            id
                        );
                    }
                    scenario = Some(id);
                }
                ChatCommand::Scene(text) => {
                    let entry = state.gateway.narrate(&key, &text).await?;
                    println!("  {}", style(format!("* {} *", entry.content)).dim().italic());
                }
                ChatCommand::Unknown(msg) => {
                    println!("  {} {msg}. Type /help for commands.", style("?").yellow().bold());
                }
            }
            continue;
        }

        match send_with_spinner(state, &key, line, scenario.as_deref(), false).await {
            Ok(reply) => print_reply(&reply),
            Err(e) if e.is_backend() => {
                println!("  {} {e}", style("✗").red().bold());
                println!("  {}", style("Your message is on file. Send again to retry.").dim());
            }
            Err(e) => println!("  {} {e}", style("✗").red().bold()),
        }
    }

    println!();
    println!("  {} {}", style("Conversation:").dim(), style(&key).cyan());
    println!();
    Ok(())
}

async fn send_with_spinner(
    state: &AppState,
    key: &str,
    text: &str,
    scenario: Option<&str>,
    hidden: bool,
) -> Result<ChatReply, ChatError> {
    let spinner = if hidden {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.yellow} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message("The detective lights a cigarette...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = state.gateway.chat(key, text, scenario).await;
    spinner.finish_and_clear();
    result
}

fn print_banner(state: &AppState, key: &str, scenario: Option<&str>) {
    let case = scenario
        .and_then(|id| state.gateway.scenarios().into_iter().find(|s| s.id == id))
        .map(|s| s.title)
        .unwrap_or_else(|| "whatever walks through the door".to_string());

    println!();
    println!("  {} Gumshoe v{}", style("◆").yellow().bold(), env!("CARGO_PKG_VERSION"));
    println!("  {} {}", style("Case:").dim(), style(case).cyan());
    println!("  {} {}", style("Conversation:").dim(), style(key).cyan());
    println!("  {}", style("Type /help for commands, /exit to leave.").dim());
    println!();
}

fn print_reply(reply: &ChatReply) {
    println!();
    println!("  {} {}", style("detective").yellow().bold(), reply.assistant_text);
    println!();
}
