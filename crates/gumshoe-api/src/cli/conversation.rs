//! Conversation CLI commands: history, reset, narrate.
//!
//! Provides log browsing with rich tables and reset with a confirmation
//! prompt.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use gumshoe_types::chat::{ChatMessage, ChatRole};

use crate::state::AppState;

/// Show the full log of a conversation.
///
/// # Examples
///
/// ```bash
/// gumshoe history conv_0192
/// gumshoe history conv_0192 --json
/// ```
pub async fn history(state: &AppState, key: &str, json: bool) -> Result<()> {
    let log = state.gateway.history(key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    print_log(key, &log);
    Ok(())
}

/// Render a conversation log as a table.
pub fn print_log(key: &str, log: &[ChatMessage]) {
    if log.is_empty() {
        println!();
        println!(
            "  {} No messages for '{}'. Start one with: {}",
            style("i").blue().bold(),
            style(key).cyan(),
            style(format!("gumshoe chat -c {key}")).yellow()
        );
        println!();
        return;
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Time").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Message").fg(Color::White),
    ]);

    for entry in log {
        let role_cell = match entry.role {
            ChatRole::User => Cell::new("user").fg(Color::Green),
            ChatRole::Assistant => Cell::new("detective").fg(Color::Yellow),
            ChatRole::Narration => Cell::new("narration").fg(Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(entry.sequence.to_string()).fg(Color::DarkGrey),
            Cell::new(entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
                .fg(Color::DarkGrey),
            role_cell,
            Cell::new(&entry.content).fg(Color::White),
        ]);
    }

    println!();
    println!("  Conversation '{}'", style(key).cyan().bold());
    println!();
    println!("{table}");
    println!();
    println!(
        "  {} message{}",
        style(log.len()).bold(),
        if log.len() == 1 { "" } else { "s" }
    );
    println!();
}

/// Discard a conversation's log and scenario binding.
pub async fn reset(state: &AppState, key: &str, force: bool, json: bool, quiet: bool) -> Result<()> {
    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Discard every message in '{}'?",
                style(key).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.gateway.reset(key).await?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "conversation_key": key }));
    } else if !quiet {
        println!();
        println!(
            "  {} Conversation '{}' reset",
            style("✓").green().bold(),
            style(key).cyan()
        );
        println!();
    }
    Ok(())
}

/// Append a narration entry.
pub async fn narrate(state: &AppState, key: &str, text: &str, json: bool, quiet: bool) -> Result<()> {
    let entry = state.gateway.narrate(key, text).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else if !quiet {
        println!();
        println!(
            "  {} Narration #{} added to '{}'",
            style("✓").green().bold(),
            entry.sequence,
            style(key).cyan()
        );
        println!();
    }
    Ok(())
}
