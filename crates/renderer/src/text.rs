use std::sync::Arc;

use cosmic_text::{
    Align, Attrs, Buffer, Color as GlyphColor, Family, FontSystem, Metrics, Shaping, SwashCache,
    Wrap,
};
use image::{Rgba, RgbaImage};
use params::{Color, DEFAULT_FONT_FAMILY};
use tracing::{trace, warn};

use crate::host::{FontRef, RasterSurface};
use crate::types::RasterHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
enum FaceChoice {
    SansSerif,
    Serif,
    Monospace,
    Named(String),
}

impl FaceChoice {
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | DEFAULT_FONT_FAMILY => FaceChoice::SansSerif,
            "serif" => FaceChoice::Serif,
            "monospace" => FaceChoice::Monospace,
            _ => FaceChoice::Named(name.trim().to_string()),
        }
    }

    fn family(&self) -> Family<'_> {
        match self {
            FaceChoice::SansSerif => Family::SansSerif,
            FaceChoice::Serif => Family::Serif,
            FaceChoice::Monospace => Family::Monospace,
            FaceChoice::Named(name) => Family::Name(name.as_str()),
        }
    }
}

/// CPU text raster backed by cosmic-text.
///
/// Missing families fall back to whatever face cosmic-text picks for the
/// locale, the same way a browser falls back for an unknown CSS family.
pub struct TextCanvas {
    font_system: FontSystem,
    swash_cache: SwashCache,
    image: Arc<RgbaImage>,
    generation: u64,
    face: FaceChoice,
    loaded_fonts: Vec<Arc<Vec<u8>>>,
    fill: Color,
    text_size: f32,
    leading: f32,
    flipped: bool,
}

impl TextCanvas {
    /// Creates a canvas using the fonts installed on the system.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_font_system(FontSystem::new(), width, height)
    }

    pub fn with_font_system(font_system: FontSystem, width: u32, height: u32) -> Self {
        Self {
            font_system,
            swash_cache: SwashCache::new(),
            image: Arc::new(RgbaImage::new(width.max(1), height.max(1))),
            generation: 0,
            face: FaceChoice::SansSerif,
            loaded_fonts: Vec::new(),
            fill: Color::BLACK,
            text_size: 12.0,
            leading: 14.4,
            flipped: false,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn touch(&mut self) -> &mut RgbaImage {
        self.generation += 1;
        Arc::make_mut(&mut self.image)
    }

    fn load_custom(&mut self, data: &Arc<Vec<u8>>) {
        if self.loaded_fonts.iter().any(|loaded| Arc::ptr_eq(loaded, data)) {
            return;
        }
        self.font_system
            .db_mut()
            .load_font_data(data.as_ref().clone());
        self.loaded_fonts.push(data.clone());
    }
}

impl RasterSurface for TextCanvas {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.generation += 1;
        self.image = Arc::new(RgbaImage::new(width.max(1), height.max(1)));
    }

    fn clear(&mut self, color: Color) {
        let pixel = Rgba(color.to_rgba_array());
        for target in self.touch().pixels_mut() {
            *target = pixel;
        }
    }

    fn set_font(&mut self, font: FontRef<'_>) {
        self.face = match font {
            FontRef::Default => FaceChoice::SansSerif,
            FontRef::Custom(font) => {
                self.load_custom(&font.data);
                FaceChoice::Named(font.family.clone())
            }
            FontRef::System(name) => FaceChoice::from_name(name),
        };
    }

    fn set_fill(&mut self, color: Color) {
        self.fill = color;
    }

    fn set_text_size(&mut self, size: f32) {
        self.text_size = size;
    }

    fn set_leading(&mut self, leading: f32) {
        self.leading = leading;
    }

    fn set_flip_vertical(&mut self, flipped: bool) {
        self.flipped = flipped;
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32) {
        // cosmic-text cannot shape without at least one face.
        if self.font_system.db().faces().next().is_none() {
            warn!("no font faces available; text raster left blank");
            return;
        }
        let (width, height) = self.size();
        let metrics = Metrics::new(self.text_size.max(1.0), self.leading.max(1.0));
        let face = self.face.clone();

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_wrap(&mut self.font_system, Wrap::None);
        buffer.set_size(&mut self.font_system, Some(width as f32), None);
        buffer.set_text(
            &mut self.font_system,
            text,
            Attrs::new().family(face.family()),
            Shaping::Advanced,
        );
        for line in buffer.lines.iter_mut() {
            line.set_align(Some(Align::Center));
        }
        buffer.shape_until_scroll(&mut self.font_system, false);

        let line_count = buffer.layout_runs().count();
        let block_height = line_count as f32 * metrics.line_height;
        let left = (x - width as f32 / 2.0).round() as i64;
        let top = (y - block_height / 2.0).round() as i64;
        let flipped = self.flipped;
        let [r, g, b, a] = self.fill.to_rgba_array();

        self.generation += 1;
        let image = Arc::make_mut(&mut self.image);
        let mut painted = 0usize;
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            GlyphColor::rgba(r, g, b, a),
            |gx, gy, gw, gh, color| {
                for row in 0..gh as i64 {
                    let draw_y = top + gy as i64 + row;
                    let canvas_y = target_row(draw_y, flipped);
                    if canvas_y < 0 || canvas_y >= height as i64 {
                        continue;
                    }
                    for column in 0..gw as i64 {
                        let canvas_x = left + gx as i64 + column;
                        if canvas_x < 0 || canvas_x >= width as i64 {
                            continue;
                        }
                        let pixel = image.get_pixel_mut(canvas_x as u32, canvas_y as u32);
                        *pixel = blend(*pixel, [color.r(), color.g(), color.b(), color.a()]);
                        painted += 1;
                    }
                }
            },
        );
        trace!(lines = line_count, painted, flipped, "text drawn");
    }

    fn handle(&self) -> RasterHandle {
        RasterHandle::new(self.image.clone(), self.generation)
    }
}

/// Maps a row in drawing space to a canvas row. The flip mirrors `y -> -y`,
/// so the pixel covering `[y, y + 1)` lands on `[-y - 1, -y)`.
fn target_row(draw_y: i64, flipped: bool) -> i64 {
    if flipped {
        -draw_y - 1
    } else {
        draw_y
    }
}

/// Source-over compositing of a straight-alpha colour onto `dst`.
fn blend(dst: Rgba<u8>, src: [u8; 4]) -> Rgba<u8> {
    let alpha = src[3] as f32 / 255.0;
    if alpha <= 0.0 {
        return dst;
    }
    let inverse = 1.0 - alpha;
    let mix = |s: u8, d: u8| (s as f32 * alpha + d as f32 * inverse).round() as u8;
    let out_alpha = (src[3] as f32 + dst[3] as f32 * inverse).round().min(255.0) as u8;
    Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        out_alpha,
    ])
}
