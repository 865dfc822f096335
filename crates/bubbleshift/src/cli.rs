use std::path::PathBuf;

use clap::{Parser, Subcommand};
use params::CanvasDimensions;
use renderer::ExportFormat;

#[derive(Parser, Debug)]
#[command(
    name = "bubbleshift",
    author,
    version,
    about = "Refract text through animated shader bubbles",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Built-in preset to start from (`bubble`, `vampiric`, `slick`, `minimal`).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Text to render; `\n` starts a new line.
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// System font family (`sans-serif`, `serif`, `monospace` or a family name).
    #[arg(long, value_name = "FAMILY")]
    pub font: Option<String>,

    /// TTF/OTF/WOFF file to load as the custom font.
    #[arg(long, value_name = "FILE")]
    pub font_file: Option<PathBuf>,

    /// Canvas size (e.g. `1080x1350`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_canvas)]
    pub canvas: Option<CanvasDimensions>,

    /// Swap canvas width and height.
    #[arg(long)]
    pub flip: bool,

    /// Display scale of the canvas inside the window.
    #[arg(long, value_name = "FACTOR")]
    pub zoom: Option<f32>,

    /// Frame rate cap (at most 30).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Configuration file; defaults to `config.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory exported frames are written to.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Render, export one frame in this format (`png` or `jpg`), then exit.
    #[arg(long, value_name = "FORMAT", value_parser = parse_export_format)]
    pub export: Option<ExportFormat>,

    /// Frame number to capture for `--export`.
    #[arg(long, value_name = "N", requires = "export")]
    pub export_frame: Option<u64>,

    /// Keep the window hidden (only useful with `--export`).
    #[arg(long, requires = "export")]
    pub hidden: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in presets.
    Presets {
        /// Print the full preset values as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List the canvas size options.
    Canvases,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_canvas(value: &str) -> Result<CanvasDimensions, String> {
    value.parse().map_err(|err| format!("{err}"))
}

pub fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    value.parse().map_err(|err| format!("{err}"))
}
