//! Scenario listing command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// List the scenario catalog, marking the default.
pub fn list_scenarios(state: &AppState, json: bool) -> Result<()> {
    let scenarios = state.gateway.scenarios();

    if json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("").fg(Color::White),
    ]);

    for scenario in &scenarios {
        table.add_row(vec![
            Cell::new(&scenario.id).fg(Color::Cyan),
            Cell::new(&scenario.title).fg(Color::White),
            if scenario.is_default {
                Cell::new("default").fg(Color::Green)
            } else {
                Cell::new("")
            },
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  Pick one with: {}",
        style("gumshoe chat --scenario <id>").yellow()
    );
    println!();
    Ok(())
}
