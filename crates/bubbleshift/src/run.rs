use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use params::{AppConfig, ParamField, ParameterStore, PresetCatalog};
use renderer::{is_font_file, ExportRequest, Renderer, RendererConfig};
use scheduler::FrameScheduler;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

/// Frame captured by `--export` when `--export-frame` is not given.
pub const DEFAULT_EXPORT_FRAME: u64 = 30;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&args, &paths)?;
    let renderer_config = build_renderer_config(&args, config.as_ref())?;
    tracing::info!(
        canvas = ?renderer_config.store.canvas_size(),
        fps = renderer_config.fps,
        export_dir = %renderer_config.export_dir.display(),
        "starting bubble shift"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(args: &RunArgs, paths: &AppPaths) -> Result<Option<AppConfig>> {
    if let Some(path) = &args.config {
        let config = AppConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        return Ok(Some(config));
    }

    let path = paths.config_file();
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    let config = AppConfig::load(&path)
        .with_context(|| format!("failed to load config {}", path.display()))?;
    Ok(Some(config))
}

/// Layers defaults, the config file and command-line flags, in that order.
pub fn build_renderer_config(args: &RunArgs, config: Option<&AppConfig>) -> Result<RendererConfig> {
    let mut store = ParameterStore::default();
    if let Some(config) = config {
        config.apply_to(&mut store)?;
    }

    let catalog = PresetCatalog::builtin();
    if let Some(name) = &args.preset {
        if let Err(err) = store.apply_preset_named(&catalog, name) {
            let available: Vec<_> = catalog.list().collect();
            bail!("{err}; available presets: {}", available.join(", "));
        }
    }
    if let Some(text) = &args.text {
        store.set(ParamField::TextContent, text.replace("\\n", "\n"))?;
    }
    if let Some(font) = &args.font {
        store.set(ParamField::FontFamily, font.as_str())?;
    }
    if let Some(canvas) = args.canvas {
        store.set(ParamField::CanvasWidth, canvas.width)?;
        store.set(ParamField::CanvasHeight, canvas.height)?;
    }
    if args.flip {
        store.set(ParamField::FlipDimensions, true)?;
    }
    if let Some(zoom) = args.zoom {
        if !(zoom > 0.0) {
            bail!("--zoom must be > 0, got {zoom}");
        }
        store.set(ParamField::ZoomLevel, zoom)?;
    }

    let requested_fps = args
        .fps
        .or_else(|| config.and_then(|config| config.fps))
        .unwrap_or(scheduler::MAX_FPS);
    let fps = FrameScheduler::new(requested_fps)
        .context("invalid frame rate")?
        .fps();

    if let Some(path) = &args.font_file {
        if !is_font_file(path) {
            bail!(
                "{} is not a font file; expected .ttf, .otf, .woff or .woff2",
                path.display()
            );
        }
    }

    let export_dir = args
        .export_dir
        .clone()
        .or_else(|| config.and_then(|config| config.export_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("."));

    let export = args.export.map(|format| ExportRequest {
        format,
        after_frames: args.export_frame.unwrap_or(DEFAULT_EXPORT_FRAME),
    });

    Ok(RendererConfig {
        store,
        fps,
        export_dir,
        font_file: args.font_file.clone(),
        export,
        show_window: !args.hidden,
    })
}

#[cfg(test)]
mod tests {
    use params::CanvasDimensions;
    use renderer::ExportFormat;

    use super::*;

    #[test]
    fn defaults_use_bubble_preset() {
        let config = build_renderer_config(&RunArgs::default(), None).unwrap();
        let bubble = PresetCatalog::builtin().get("bubble").unwrap();
        assert_eq!(config.store.get().num_bubbles, bubble.num_bubbles);
        assert_eq!(config.fps, scheduler::MAX_FPS);
        assert_eq!(config.export_dir, PathBuf::from("."));
        assert!(config.export.is_none());
        assert!(config.show_window);
    }

    #[test]
    fn flags_override_config() {
        let file = AppConfig::from_toml_str(
            r#"
            preset = "vampiric"
            fps = 12
            zoom = 0.25
            export_dir = "/tmp/from-config"

            [params]
            font_size = 42
            "#,
        )
        .unwrap();
        let args = RunArgs {
            zoom: Some(0.75),
            export_dir: Some(PathBuf::from("/tmp/from-flag")),
            ..RunArgs::default()
        };

        let config = build_renderer_config(&args, Some(&file)).unwrap();
        let params = config.store.get();
        assert_eq!(params.zoom_level, 0.75);
        assert_eq!(params.font_size, 42.0);
        assert_eq!(config.fps, 12.0);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/from-flag"));
    }

    #[test]
    fn text_flag_expands_newline_escapes() {
        let args = RunArgs {
            text: Some("HELLO\\nWORLD".into()),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None).unwrap();
        assert_eq!(config.store.get().text_content, "HELLO\nWORLD");
    }

    #[test]
    fn canvas_and_flip_combine() {
        let args = RunArgs {
            canvas: Some(CanvasDimensions::new(1080, 1920)),
            flip: true,
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None).unwrap();
        assert_eq!(config.store.canvas_size(), (1920, 1080));
    }

    #[test]
    fn unknown_preset_lists_alternatives() {
        let args = RunArgs {
            preset: Some("nope".into()),
            ..RunArgs::default()
        };
        let err = build_renderer_config(&args, None).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown preset 'nope'"));
        assert!(message.contains("bubble, vampiric, slick, minimal"));
    }

    #[test]
    fn fps_is_clamped_and_validated() {
        let fast = RunArgs {
            fps: Some(120.0),
            ..RunArgs::default()
        };
        assert_eq!(build_renderer_config(&fast, None).unwrap().fps, scheduler::MAX_FPS);

        let invalid = RunArgs {
            fps: Some(0.0),
            ..RunArgs::default()
        };
        assert!(build_renderer_config(&invalid, None).is_err());
    }

    #[test]
    fn export_defaults_to_frame_thirty() {
        let args = RunArgs {
            export: Some(ExportFormat::Png),
            hidden: true,
            ..RunArgs::default()
        };
        let config = build_renderer_config(&args, None).unwrap();
        assert_eq!(
            config.export,
            Some(ExportRequest {
                format: ExportFormat::Png,
                after_frames: DEFAULT_EXPORT_FRAME,
            })
        );
        assert!(!config.show_window);
    }

    #[test]
    fn rejects_non_font_files() {
        let args = RunArgs {
            font_file: Some(PathBuf::from("notes.txt")),
            ..RunArgs::default()
        };
        assert!(build_renderer_config(&args, None).is_err());
    }
}
