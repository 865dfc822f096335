mod cli;
mod paths;
mod run;

use anyhow::{Context, Result};
use cli::Command;
use params::{controls, PresetCatalog, CANVAS_OPTIONS};

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Presets { json }) => list_presets(json),
        Some(Command::Canvases) => list_canvases(),
        None => run::run(cli.run),
    }
}

fn list_presets(json: bool) -> Result<()> {
    let catalog = PresetCatalog::builtin();
    if json {
        let presets: Vec<_> = catalog.iter().collect();
        let rendered =
            serde_json::to_string_pretty(&presets).context("failed to serialise presets")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Built-in presets:");
    for (index, preset) in catalog.iter().enumerate() {
        let params = preset.applied_to(&Default::default());
        println!(
            "  F{:<2} {:<10} {}",
            index + 1,
            preset.name,
            controls::summarize(&params)
        );
    }
    Ok(())
}

fn list_canvases() -> Result<()> {
    println!("Canvas sizes:");
    for (dimensions, label) in CANVAS_OPTIONS {
        println!("  {:<10} {label}", dimensions.to_string());
    }
    Ok(())
}
