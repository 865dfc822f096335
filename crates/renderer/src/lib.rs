//! Renderer crate for Bubble Shift.
//!
//! Text is rasterised on the CPU, uploaded as a texture and pushed through a
//! fragment shader that refracts it through drifting bubbles. The overall
//! flow is:
//!
//! ```text
//!   CLI / bubbleshift
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ RenderLoop::render_frame()
//!                                                 │
//!          TextRasterCache ◀──────────────────────┤
//!          UniformSynchronizer ──▶ GpuState ◀─────┘
//! ```
//!
//! `RenderLoop` only knows the [`host::GraphicsHost`] and
//! [`host::RasterSurface`] traits, so the per-frame logic is tested without a
//! GPU. `gpu::GpuState` and `text::TextCanvas` are the real implementations
//! used by the preview window.

mod controls;
mod driver;
mod export;
mod fonts;
mod gpu;
mod host;
mod raster;
mod sync;
mod text;
mod types;
mod window;

use anyhow::Result;

pub use controls::{action_for_key, apply_action, window_title, ActionOutcome, ControlAction};
pub use driver::{FrameOutcome, FrameState, RenderLoop};
pub use export::{
    export_filename, save_rgba, Clock, ExportError, ExportFormat, FixedClock, SystemClock,
    FILENAME_PREFIX,
};
pub use fonts::{decode_font, is_font_file, load_font_file, FontLoadError, FontLoader, FONT_EXTENSIONS};
pub use host::{FontRef, GraphicsHost, RasterSurface, ShaderProgram};
pub use raster::{resolve_font, RasterSnapshot, TextRasterCache};
pub use sync::{elapsed_time, highlight_uniform, SyncReport, UniformCache, UniformSynchronizer};
pub use text::TextCanvas;
pub use types::{ExportRequest, RasterHandle, RendererConfig, UniformValue};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Opens the preview window and runs until it is closed, or until the
    /// requested export has been written.
    pub fn run(self) -> Result<()> {
        window::run(self.config)
    }
}
