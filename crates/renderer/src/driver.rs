use std::path::{Path, PathBuf};

use anyhow::Result;
use params::ParameterStore;
use tracing::{debug, info, warn};

use crate::export::{export_filename, Clock, ExportError, ExportFormat};
use crate::host::{GraphicsHost, RasterSurface};
use crate::raster::TextRasterCache;
use crate::sync::{SyncReport, UniformSynchronizer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameState {
    #[default]
    Idle,
    Rendering,
}

/// What happened during one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub frame: u64,
    pub resized: bool,
    pub regenerated: bool,
    pub uniforms: SyncReport,
}

/// Runs the per-frame sequence: viewport sync, raster refresh, shader bind,
/// uniform push, quad draw.
#[derive(Debug, Default)]
pub struct RenderLoop {
    raster: TextRasterCache,
    uniforms: UniformSynchronizer,
    state: FrameState,
    frame: u64,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames started so far; the first frame is number 1.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn raster_cache(&self) -> &TextRasterCache {
        &self.raster
    }

    pub fn synchronizer(&self) -> &UniformSynchronizer {
        &self.uniforms
    }

    /// A new custom font keeps the `custom` family id, so the snapshot
    /// comparison cannot notice it on its own.
    pub fn font_installed(&mut self) {
        self.raster.mark_dirty();
    }

    /// Brings the host canvas and raster surface to the store's canvas size,
    /// as far as the host can hold it.
    pub fn sync_viewport<H, S>(&mut self, store: &ParameterStore, host: &mut H, surface: &mut S) -> bool
    where
        H: GraphicsHost,
        S: RasterSurface,
    {
        let (width, height) = store.canvas_size();
        let target = host.fit_canvas(width, height);
        if host.canvas_size() == target && surface.size() == target {
            return false;
        }
        info!(width = target.0, height = target.1, "canvas resized");
        host.resize_canvas(target.0, target.1);
        surface.resize(target.0, target.1);
        self.raster.mark_dirty();
        self.uniforms.invalidate();
        true
    }

    pub fn render_frame<H, S>(
        &mut self,
        store: &ParameterStore,
        host: &mut H,
        surface: &mut S,
    ) -> Result<FrameOutcome>
    where
        H: GraphicsHost,
        S: RasterSurface,
    {
        self.state = FrameState::Rendering;
        self.frame += 1;

        let resized = self.sync_viewport(store, host, surface);
        let regenerated = self.raster.refresh(store, surface);

        host.bind_shader();
        host.set_zoom(store.get().zoom_level);
        let raster = surface.handle();
        let uniforms = self.uniforms.push_uniforms(
            store.get(),
            self.frame,
            host.canvas_size(),
            &raster,
            host,
        );

        let drawn = host.draw_fullscreen_quad();
        self.state = FrameState::Idle;
        if let Err(err) = drawn {
            warn!(frame = self.frame, error = %err, "frame draw failed");
            return Err(err);
        }

        debug!(frame = self.frame, resized, regenerated, "frame rendered");
        Ok(FrameOutcome {
            frame: self.frame,
            resized,
            regenerated,
            uniforms,
        })
    }

    /// Saves the current frame into `dir` and returns the written path.
    pub fn export_frame<H>(
        &mut self,
        host: &mut H,
        format: ExportFormat,
        dir: &Path,
        clock: &dyn Clock,
    ) -> Result<PathBuf, ExportError>
    where
        H: GraphicsHost,
    {
        let path = dir.join(export_filename(format, clock.now()));
        host.save_image(&path, format)
            .map_err(|err| ExportError::Capture {
                path: path.clone(),
                message: format!("{err:#}"),
            })?;
        info!(path = %path.display(), %format, "frame exported");
        Ok(path)
    }
}
