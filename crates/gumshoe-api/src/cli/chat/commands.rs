//! Slash command parsing for the interactive chat loop.
//!
//! Commands start with `/` and control the conversation without sending
//! anything to the detective.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat loop.
    Exit,
    /// Print the conversation log.
    History,
    /// Discard the conversation and start over.
    Reset,
    /// Switch the conversation to another scenario.
    Case(String),
    /// Append narration to the log.
    Scene(String),
    /// Unknown command or missing argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/history" => ChatCommand::History,
        "/reset" => ChatCommand::Reset,
        "/case" if arg.is_empty() => ChatCommand::Unknown("/case requires a scenario id".to_string()),
        "/case" => ChatCommand::Case(arg.to_string()),
        "/scene" if arg.is_empty() => ChatCommand::Unknown("/scene requires narration text".to_string()),
        "/scene" => ChatCommand::Scene(arg.to_string()),
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let entries = [
        ("/help", "Show this help message"),
        ("/clear", "Clear the screen"),
        ("/exit", "Leave the office"),
        ("/history", "Show the conversation so far"),
        ("/reset", "Forget this case and start over"),
        ("/case <id>", "Switch to another scenario"),
        ("/scene <text>", "Add narration to the scene"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, description) in entries {
        println!("  {:<15} {description}", style(cmd).cyan());
    }
    println!();
}
