use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use params::{ParameterStore, PresetCatalog};
use scheduler::FrameScheduler;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowBuilder};

use crate::controls::{action_for_key, apply_action, window_title, ActionOutcome};
use crate::driver::{FrameOutcome, RenderLoop};
use crate::export::{ExportError, ExportFormat, SystemClock};
use crate::fonts::{is_font_file, FontLoader};
use crate::gpu::GpuState;
use crate::text::TextCanvas;
use crate::types::{ExportRequest, RendererConfig};

/// Longest edge of the window opened at start-up.
const MAX_INITIAL_EDGE: u32 = 1280;

/// Window size that shows the whole zoomed canvas, shrunk to fit
/// [`MAX_INITIAL_EDGE`] while keeping its aspect ratio.
pub(crate) fn initial_window_size(canvas: (u32, u32), zoom: f32) -> PhysicalSize<u32> {
    let width = (canvas.0 as f32 * zoom).max(1.0);
    let height = (canvas.1 as f32 * zoom).max(1.0);
    let fit = (MAX_INITIAL_EDGE as f32 / width.max(height)).min(1.0);
    PhysicalSize::new(
        (width * fit).round().max(1.0) as u32,
        (height * fit).round().max(1.0) as u32,
    )
}

struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    canvas: TextCanvas,
    driver: RenderLoop,
    store: ParameterStore,
    catalog: PresetCatalog,
    fonts: FontLoader,
    modifiers: ModifiersState,
    export_dir: PathBuf,
    title: String,
}

impl WindowState {
    fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let store = config.store.clone();
        let canvas_size = store.canvas_size();
        let gpu = GpuState::new(window.clone(), canvas_size)?;
        let canvas = TextCanvas::new(canvas_size.0, canvas_size.1);

        let fonts = FontLoader::new();
        if let Some(path) = &config.font_file {
            fonts.request(path.clone());
        }

        let title = window_title(&store);
        window.set_title(&title);

        Ok(Self {
            window,
            gpu,
            canvas,
            driver: RenderLoop::new(),
            store,
            catalog: PresetCatalog::builtin(),
            fonts,
            modifiers: ModifiersState::empty(),
            export_dir: config.export_dir.clone(),
            title,
        })
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Some(action) = action_for_key(&event.logical_key, self.modifiers) else {
            return;
        };
        match apply_action(&action, &mut self.store, &self.catalog) {
            ActionOutcome::Changed => self.refresh_title(),
            ActionOutcome::Export(format) => {
                if let Err(err) = self.export(format) {
                    error!(error = %err, "export failed");
                }
            }
            ActionOutcome::Ignored => {}
        }
    }

    fn handle_dropped_file(&mut self, path: PathBuf) {
        if is_font_file(&path) {
            info!(path = %path.display(), "loading dropped font");
            self.fonts.request(path);
        } else {
            warn!(path = %path.display(), "dropped file is not a font; ignored");
        }
    }

    fn refresh_title(&mut self) {
        let title = window_title(&self.store);
        if title != self.title {
            self.window.set_title(&title);
            self.title = title;
        }
    }

    fn render(&mut self) -> Result<FrameOutcome> {
        if self.fonts.install_ready(&mut self.store) > 0 {
            self.driver.font_installed();
            self.refresh_title();
        }
        self.driver
            .render_frame(&self.store, &mut self.gpu, &mut self.canvas)
    }

    fn export(&mut self, format: ExportFormat) -> Result<PathBuf, ExportError> {
        let dir = self.export_dir.clone();
        self.driver
            .export_frame(&mut self.gpu, format, &dir, &SystemClock)
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize_surface(size);
    }
}

/// Tells the event loop whether a render error should end the session.
fn is_fatal(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<wgpu::SurfaceError>(),
        Some(wgpu::SurfaceError::OutOfMemory)
    )
}

fn export_is_due(request: Option<&ExportRequest>, outcome: &FrameOutcome) -> bool {
    request.is_some_and(|request| outcome.frame >= request.after_frames.max(1))
}

pub(crate) fn run(config: RendererConfig) -> Result<()> {
    let mut builder = EventLoopBuilder::new();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }
    let event_loop = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let zoom = config.store.get().zoom_level;
    let window_size = initial_window_size(config.store.canvas_size(), zoom);
    let window = WindowBuilder::new()
        .with_title("Bubble Shift")
        .with_inner_size(window_size)
        .with_visible(config.show_window)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err:#}"))?;
    let mut scheduler = FrameScheduler::new(config.fps)?;
    let export_request = config.export.clone();
    if let Some(request) = &export_request {
        info!(
            format = %request.format,
            after_frames = request.after_frames,
            dir = %config.export_dir.display(),
            "non-interactive export requested"
        );
    }
    state.window().request_redraw();

    let mut failure: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::ModifiersChanged(modifiers) => {
                    state.modifiers = modifiers.state();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    state.handle_key(&event);
                }
                WindowEvent::DroppedFile(path) => {
                    state.handle_dropped_file(path);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::ScaleFactorChanged {
                    mut inner_size_writer,
                    ..
                } => {
                    let _ = inner_size_writer.request_inner_size(state.gpu.window_size());
                }
                WindowEvent::RedrawRequested => match state.render() {
                    Ok(outcome) => {
                        if export_is_due(export_request.as_ref(), &outcome) {
                            if let Some(request) = &export_request {
                                if let Err(err) = state.export(request.format) {
                                    failure = Some(err.into());
                                }
                            }
                            elwt.exit();
                        }
                    }
                    Err(err) if is_fatal(&err) => {
                        error!(error = %err, "GPU out of memory; closing preview");
                        failure = Some(err);
                        elwt.exit();
                    }
                    Err(err) => {
                        debug!(error = %err, "frame skipped; retrying next tick");
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            let now = Instant::now();
            if scheduler.ready_for_frame(now) {
                tracing::trace!("scheduler: issuing redraw now");
                state.window().request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            } else {
                let deadline = scheduler.next_deadline(now);
                elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
        }
        _ => {}
    });

    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncReport;

    fn outcome(frame: u64) -> FrameOutcome {
        FrameOutcome {
            frame,
            resized: false,
            regenerated: false,
            uniforms: SyncReport::default(),
        }
    }

    #[test]
    fn initial_window_fits_small_canvases_exactly() {
        assert_eq!(initial_window_size((1080, 1080), 0.5), PhysicalSize::new(540, 540));
    }

    #[test]
    fn initial_window_shrinks_large_canvases() {
        let size = initial_window_size((1080, 1920), 1.0);
        assert_eq!(size.height, MAX_INITIAL_EDGE);
        assert_eq!(size.width, 720);
    }

    #[test]
    fn export_waits_for_requested_frame() {
        let request = ExportRequest {
            format: ExportFormat::Png,
            after_frames: 3,
        };
        assert!(!export_is_due(Some(&request), &outcome(2)));
        assert!(export_is_due(Some(&request), &outcome(3)));
        assert!(!export_is_due(None, &outcome(100)));
    }

    #[test]
    fn zero_frame_request_exports_after_first_frame() {
        let request = ExportRequest {
            format: ExportFormat::Jpg,
            after_frames: 0,
        };
        assert!(export_is_due(Some(&request), &outcome(1)));
    }

    #[test]
    fn only_out_of_memory_is_fatal() {
        assert!(is_fatal(&anyhow::Error::from(wgpu::SurfaceError::OutOfMemory)));
        assert!(!is_fatal(&anyhow::Error::from(wgpu::SurfaceError::Lost)));
        assert!(!is_fatal(&anyhow!("draw failed")));
    }
}
