//! Status dashboard command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display store counts, backend and data directory.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.gateway.stats().await?;
    let backend = &state.config.backend;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "provider": state.gateway.provider_name(),
            "model": backend.model,
            "conversations": stats.conversations,
            "messages": stats.messages,
            "scenarios": state.gateway.scenarios().len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Gumshoe v{}", style("◆").yellow().bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Store ──").dim());
    println!("  Conversations: {}", style(stats.conversations).bold());
    println!("  Messages:      {}", style(stats.messages).bold());
    println!();

    println!("  {}", style("── Backend ──").dim());
    println!("  Provider:  {}", style(state.gateway.provider_name()).cyan());
    println!("  Model:     {}", backend.model);
    println!("  Timeout:   {}s", backend.timeout_secs);
    println!();

    println!("  {}", style("── Paths ──").dim());
    println!("  Data dir:  {}", state.data_dir.display());
    println!();
    Ok(())
}
