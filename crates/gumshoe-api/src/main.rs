//! Gumshoe CLI and HTTP API entry point.
//!
//! Binary name: `gumshoe`
//!
//! Parses CLI arguments, initializes the database and session actors, then
//! dispatches to the appropriate command handler or starts the HTTP server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "gumshoe", &mut std::io::stdout());
        return Ok(());
    }

    let serving = matches!(cli.command, Commands::Serve { .. });
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 if serving => "info",
        0 => "warn",
        1 => "info,gumshoe=debug,gumshoe_core=debug,gumshoe_infra=debug",
        _ => "trace",
    };
    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    gumshoe_observe::init_tracing(filter, otel).map_err(|e| anyhow::anyhow!(e))?;

    let state = AppState::init(cli.command.requires_backend()).await?;
    let result = run(&cli, &state).await;

    state.shutdown().await;
    gumshoe_observe::shutdown_tracing();
    result
}

async fn run(cli: &Cli, state: &AppState) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Serve { port, host, .. } => {
            let host = host.as_deref().unwrap_or(&state.config.server.host);
            let port = port.unwrap_or(state.config.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} Gumshoe listening on {} ({})",
                    console::style("◆").yellow().bold(),
                    console::style(format!("http://{addr}")).cyan(),
                    state.gateway.provider_name()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Chat {
            conversation,
            scenario,
            text,
        } => {
            cli::chat::chat(
                state,
                conversation.clone(),
                scenario.clone(),
                text.clone(),
                cli.json,
                cli.quiet,
            )
            .await?;
        }

        Commands::History { conversation } => {
            cli::conversation::history(state, conversation, cli.json).await?;
        }

        Commands::Reset {
            conversation,
            force,
        } => {
            cli::conversation::reset(state, conversation, *force, cli.json, cli.quiet).await?;
        }

        Commands::Narrate { conversation, text } => {
            cli::conversation::narrate(state, conversation, text, cli.json, cli.quiet).await?;
        }

        Commands::Scenarios => cli::scenario::list_scenarios(state, cli.json)?,

        Commands::Status => cli::status::status(state, cli.json).await?,

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
