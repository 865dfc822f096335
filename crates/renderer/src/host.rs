//! Seams between the render loop and whatever draws pixels.
//!
//! The loop only talks to these traits, so the GPU backend and the recording
//! doubles used in tests are interchangeable.

use std::path::Path;

use anyhow::Result;
use params::{Color, LoadedFont};

use crate::export::ExportFormat;
use crate::types::{RasterHandle, UniformValue};

/// Font selection for the next `draw_text` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontRef<'a> {
    /// The platform's default sans-serif face.
    Default,
    /// A font decoded from a user-supplied file.
    Custom(&'a LoadedFont),
    /// A system family looked up by name.
    System(&'a str),
}

/// Offscreen 2D canvas the text is drawn into before the shader samples it.
pub trait RasterSurface {
    fn size(&self) -> (u32, u32);
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self, color: Color);
    fn set_font(&mut self, font: FontRef<'_>);
    fn set_fill(&mut self, color: Color);
    fn set_text_size(&mut self, size: f32);
    /// Distance between baselines, in pixels.
    fn set_leading(&mut self, leading: f32);
    /// While enabled, drawing happens in a space mirrored as `y -> -y`.
    fn set_flip_vertical(&mut self, flipped: bool);
    /// Draws `text` centred both ways on `(x, y)`; `\n` starts a new line.
    fn draw_text(&mut self, text: &str, x: f32, y: f32);
    fn handle(&self) -> RasterHandle;
}

/// Receives uniform values for the bound shader.
pub trait ShaderProgram {
    /// Names the program does not declare are ignored.
    fn set_uniform(&mut self, name: &str, value: &UniformValue);
}

/// The drawing context that owns the shader and the visible canvas.
pub trait GraphicsHost: ShaderProgram {
    fn canvas_size(&self) -> (u32, u32);
    /// The size `resize_canvas` would actually settle on for a request.
    fn fit_canvas(&self, width: u32, height: u32) -> (u32, u32) {
        (width.max(1), height.max(1))
    }
    fn resize_canvas(&mut self, width: u32, height: u32);
    fn bind_shader(&mut self);
    fn draw_fullscreen_quad(&mut self) -> Result<()>;
    /// Renders the current shader state at canvas resolution into `path`.
    fn save_image(&mut self, path: &Path, format: ExportFormat) -> Result<()>;
    /// Display-only scale of the canvas inside the window.
    fn set_zoom(&mut self, _zoom: f32) {}
}
