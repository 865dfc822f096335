use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use params::ParameterStore;

use crate::export::ExportFormat;

/// Shared view of the text raster at a given generation.
///
/// Cloning is cheap; two handles are equal when they point at the same
/// pixels at the same generation.
#[derive(Debug, Clone)]
pub struct RasterHandle {
    pub image: Arc<RgbaImage>,
    pub generation: u64,
}

impl RasterHandle {
    pub fn new(image: Arc<RgbaImage>, generation: u64) -> Self {
        Self { image, generation }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl PartialEq for RasterHandle {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation && Arc::ptr_eq(&self.image, &other.image)
    }
}

/// A value bound to a named shader uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Texture(RasterHandle),
}

impl UniformValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(value) => Some(*value),
            UniformValue::Int(value) => Some(*value as f32),
            _ => None,
        }
    }
}

/// Non-interactive run: render a fixed number of frames, export, exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Frame number the capture is taken after.
    pub after_frames: u64,
}

/// Start-up configuration for the preview window.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial parameter state, already layered from presets, config and flags.
    pub store: ParameterStore,
    /// Requested frame rate; clamped by the scheduler.
    pub fps: f32,
    /// Directory exported frames are written into.
    pub export_dir: PathBuf,
    /// Optional font file decoded in the background at start-up.
    pub font_file: Option<PathBuf>,
    pub export: Option<ExportRequest>,
    /// Whether the window is shown; hidden windows still render for exports.
    pub show_window: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            store: ParameterStore::default(),
            fps: scheduler::MAX_FPS,
            export_dir: PathBuf::from("."),
            font_file: None,
            export: None,
            show_window: true,
        }
    }
}
