//! CLI command definitions and dispatch for the `gumshoe` binary.
//!
//! Uses clap derive macros for argument parsing. Every conversation command
//! runs against the same store and session actors the HTTP server uses.

pub mod chat;
pub mod conversation;
pub mod scenario;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Noir detective chat service.
#[derive(Parser)]
#[command(name = "gumshoe", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Port to listen on (defaults to `server.port` from config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (defaults to `server.host` from config.toml).
        #[arg(long)]
        host: Option<String>,

        /// Export tracing spans to stdout through OpenTelemetry.
        #[arg(long)]
        otel: bool,
    },

    /// Chat with the detective. Starts an interactive session without TEXT.
    Chat {
        /// Conversation key (a fresh one is generated when omitted).
        #[arg(short, long)]
        conversation: Option<String>,

        /// Scenario to bind the conversation to.
        #[arg(short, long)]
        scenario: Option<String>,

        /// Send a single message and print the reply.
        text: Option<String>,
    },

    /// Show the message log of a conversation.
    History {
        /// Conversation key.
        conversation: String,
    },

    /// Discard a conversation's log and scenario binding.
    Reset {
        /// Conversation key.
        conversation: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Append scene-setting narration without asking the detective.
    Narrate {
        /// Conversation key.
        conversation: String,

        /// Narration text.
        text: String,
    },

    /// List available scenarios.
    Scenarios,

    /// Store and backend status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

impl Commands {
    /// Whether the command needs a working generative backend.
    pub fn requires_backend(&self) -> bool {
        matches!(self, Commands::Serve { .. } | Commands::Chat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_one_shot_chat() {
        let cli = Cli::parse_from([
            "gumshoe", "chat", "-c", "case-1", "--scenario", "heist", "Who did it?",
        ]);
        match cli.command {
            Commands::Chat {
                conversation,
                scenario,
                text,
            } => {
                assert_eq!(conversation.as_deref(), Some("case-1"));
                assert_eq!(scenario.as_deref(), Some("heist"));
                assert_eq!(text.as_deref(), Some("Who did it?"));
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn test_backend_requirement() {
        let serve = Cli::parse_from(["gumshoe", "serve"]);
        assert!(serve.command.requires_backend());

        let history = Cli::parse_from(["gumshoe", "--json", "history", "case-1"]);
        assert!(history.json);
        assert!(!history.command.requires_backend());
    }
}
