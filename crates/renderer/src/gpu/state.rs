use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, trace, warn};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::export::{self, ExportFormat};
use crate::host::{GraphicsHost, ShaderProgram};
use crate::sync;
use crate::types::{RasterHandle, UniformValue};

use super::capture;
use super::context::GpuContext;
use super::pipeline::BubblePipeline;
use super::uniforms::{BubbleUniforms, PresentUniforms};

/// Area around the canvas when it does not fill the window.
const WINDOW_BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.08,
    a: 1.0,
};

/// Clamps a requested canvas to what a texture on this adapter can hold.
fn fit_to_limit(width: u32, height: u32, limit: u32) -> (u32, u32) {
    let limit = limit.max(1);
    (width.clamp(1, limit), height.clamp(1, limit))
}

/// GPU copy of the text raster, re-uploaded when its generation moves.
struct RasterTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    generation: Option<u64>,
}

impl RasterTexture {
    fn new(device: &wgpu::Device, pipeline: &BubblePipeline, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("text raster"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = pipeline.raster_bind_group(device, &view);
        Self {
            texture,
            bind_group,
            generation: None,
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Owns the surface, the bubble pipeline and the raster texture, and exposes
/// them to the render loop through [`GraphicsHost`].
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: BubblePipeline,
    uniforms: BubbleUniforms,
    uniform_buffer: wgpu::Buffer,
    screen_present: wgpu::Buffer,
    screen_bind_group: wgpu::BindGroup,
    export_bind_group: wgpu::BindGroup,
    raster: RasterTexture,
    canvas: (u32, u32),
    zoom: f32,
}

impl GpuState {
    pub(crate) fn new(window: Arc<Window>, canvas: (u32, u32)) -> Result<Self> {
        let context = GpuContext::new(window)?;
        let canvas = fit_to_limit(canvas.0, canvas.1, context.max_texture_dimension);
        let device = &context.device;
        let pipeline = BubblePipeline::new(device, context.surface_format);

        let uniforms = BubbleUniforms::new(canvas.0, canvas.1);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("bubble uniforms"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let screen_present = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen placement"),
            contents: bytemuck::bytes_of(&PresentUniforms::full()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let export_present = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("export placement"),
            contents: bytemuck::bytes_of(&PresentUniforms::full()),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let screen_bind_group =
            pipeline.uniform_bind_group(device, "screen bind group", &uniform_buffer, &screen_present);
        let export_bind_group =
            pipeline.uniform_bind_group(device, "export bind group", &uniform_buffer, &export_present);
        let raster = RasterTexture::new(device, &pipeline, canvas.0, canvas.1);

        Ok(Self {
            context,
            pipeline,
            uniforms,
            uniform_buffer,
            screen_present,
            screen_bind_group,
            export_bind_group,
            raster,
            canvas,
            zoom: 1.0,
        })
    }

    pub(crate) fn window_size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn resize_surface(&mut self, size: PhysicalSize<u32>) {
        self.context.resize(size);
    }

    fn upload_raster(&mut self, handle: &RasterHandle) {
        let (width, height) = handle.dimensions();
        let limit = self.context.max_texture_dimension;
        if width > limit || height > limit {
            warn!(width, height, limit, "text raster exceeds GPU texture limit; keeping previous upload");
            return;
        }
        if self.raster.size() != (width, height) {
            debug!(width, height, "reallocating text raster texture");
            self.raster = RasterTexture::new(&self.context.device, &self.pipeline, width, height);
        }
        if self.raster.generation == Some(handle.generation) {
            return;
        }

        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.raster.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            handle.image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.raster.generation = Some(handle.generation);
        trace!(generation = handle.generation, "text raster uploaded");
    }

    fn encode_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        bind_group: &wgpu::BindGroup,
        clear: wgpu::Color,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("bubble pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.set_bind_group(1, &self.raster.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }

    fn flush_uniforms(&self) {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }
}

impl ShaderProgram for GpuState {
    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        match value {
            UniformValue::Texture(handle) if name == sync::TEX1 => self.upload_raster(handle),
            _ => {
                if !self.uniforms.apply(name, value) {
                    debug!(uniform = name, "bubble shader has no such uniform; ignored");
                }
            }
        }
    }
}

impl GraphicsHost for GpuState {
    fn canvas_size(&self) -> (u32, u32) {
        self.canvas
    }

    fn fit_canvas(&self, width: u32, height: u32) -> (u32, u32) {
        fit_to_limit(width, height, self.context.max_texture_dimension)
    }

    fn resize_canvas(&mut self, width: u32, height: u32) {
        let fitted = self.fit_canvas(width, height);
        if fitted != (width, height) {
            warn!(
                width,
                height,
                limit = self.context.max_texture_dimension,
                "canvas outside GPU texture limits; clamping to {}x{}",
                fitted.0,
                fitted.1
            );
        }
        self.canvas = fitted;
    }

    fn bind_shader(&mut self) {
        if self.raster.size() != self.canvas {
            self.raster = RasterTexture::new(
                &self.context.device,
                &self.pipeline,
                self.canvas.0,
                self.canvas.1,
            );
        }
    }

    fn draw_fullscreen_quad(&mut self) -> Result<()> {
        let window = (self.context.size.width, self.context.size.height);
        let present = PresentUniforms::for_zoom(self.canvas, window, self.zoom);
        self.context
            .queue
            .write_buffer(&self.screen_present, 0, bytemuck::bytes_of(&present));
        self.flush_uniforms();

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.context.reconfigure();
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        self.encode_pass(&mut encoder, &view, &self.screen_bind_group, WINDOW_BACKGROUND);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn save_image(&mut self, path: &Path, format: ExportFormat) -> Result<()> {
        let (width, height) = self.canvas;
        let target_format = self.context.surface_format;
        let target = self.context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("export target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        self.flush_uniforms();
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("export encoder"),
            });
        self.encode_pass(&mut encoder, &view, &self.export_bind_group, wgpu::Color::BLACK);
        self.context.queue.submit(std::iter::once(encoder.finish()));

        let image =
            capture::read_texture_rgba(&self.context.device, &self.context.queue, &target, target_format)?;
        export::save_rgba(image, path, format)
    }

    fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_fits_inside_texture_limit() {
        assert_eq!(fit_to_limit(1080, 1350, 8192), (1080, 1350));
        assert_eq!(fit_to_limit(20_000, 500, 8192), (8192, 500));
        assert_eq!(fit_to_limit(0, 0, 8192), (1, 1));
        assert_eq!(fit_to_limit(10, 10, 0), (1, 1));
    }
}
