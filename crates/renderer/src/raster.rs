use params::{Color, LoadedFont, ParameterSet, ParameterStore, CUSTOM_FONT_ID};
use tracing::debug;

use crate::host::{FontRef, RasterSurface};

/// The fields that affect the text raster. Anything else changing leaves
/// the raster alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSnapshot {
    pub text_content: String,
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
    pub background_color: Color,
    pub text_color: Color,
}

impl RasterSnapshot {
    pub fn project(params: &ParameterSet) -> Self {
        Self {
            text_content: params.text_content.clone(),
            font_family: params.font_family.clone(),
            font_size: params.font_size,
            line_height: params.line_height,
            background_color: params.background_color,
            text_color: params.text_color,
        }
    }
}

/// Picks the face to draw with. `custom` falls back to the default face
/// until a font has actually been loaded.
pub fn resolve_font<'a>(family: &'a str, custom: Option<&'a LoadedFont>) -> FontRef<'a> {
    if family == CUSTOM_FONT_ID {
        return match custom {
            Some(font) => FontRef::Custom(font),
            None => FontRef::Default,
        };
    }
    FontRef::System(family)
}

/// Redraws the text raster only when its inputs change.
#[derive(Debug)]
pub struct TextRasterCache {
    snapshot: Option<RasterSnapshot>,
    dirty: bool,
    regenerations: u64,
}

impl Default for TextRasterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterCache {
    pub fn new() -> Self {
        Self {
            snapshot: None,
            dirty: true,
            regenerations: 0,
        }
    }

    /// Forces a redraw on the next refresh, e.g. after a resize or when a
    /// new custom font replaces the previous one under the same family id.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn snapshot(&self) -> Option<&RasterSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    pub fn is_stale(&self, params: &ParameterSet) -> bool {
        if self.dirty {
            return true;
        }
        match &self.snapshot {
            Some(snapshot) => *snapshot != RasterSnapshot::project(params),
            None => true,
        }
    }

    /// Regenerates the raster if it is stale. Returns whether it did.
    pub fn refresh(&mut self, store: &ParameterStore, surface: &mut dyn RasterSurface) -> bool {
        let projected = RasterSnapshot::project(store.get());
        if !self.dirty && self.snapshot.as_ref() == Some(&projected) {
            return false;
        }

        draw_snapshot(&projected, store.custom_font(), surface);
        self.regenerations += 1;
        debug!(
            regenerations = self.regenerations,
            family = %projected.font_family,
            size = projected.font_size,
            "text raster regenerated"
        );
        self.snapshot = Some(projected);
        self.dirty = false;
        true
    }
}

fn draw_snapshot(
    snapshot: &RasterSnapshot,
    custom: Option<&LoadedFont>,
    surface: &mut dyn RasterSurface,
) {
    let (width, height) = surface.size();
    surface.clear(snapshot.background_color);
    surface.set_font(resolve_font(&snapshot.font_family, custom));
    surface.set_fill(snapshot.text_color);
    surface.set_text_size(snapshot.font_size);
    surface.set_leading(snapshot.font_size * snapshot.line_height);
    // Drawn mirrored so it reads upright once sampled with a bottom-left origin.
    surface.set_flip_vertical(true);
    surface.draw_text(
        &snapshot.text_content,
        width as f32 / 2.0,
        -(height as f32) / 2.0,
    );
    surface.set_flip_vertical(false);
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use image::RgbaImage;
    use params::{ParamField, ParameterStore};

    use super::*;
    use crate::types::RasterHandle;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum SurfaceOp {
        Resize(u32, u32),
        Clear(Color),
        Font(String),
        Fill(Color),
        TextSize(f32),
        Leading(f32),
        Flip(bool),
        Text(String, f32, f32),
    }

    pub(crate) struct RecordingSurface {
        pub size: (u32, u32),
        pub ops: Vec<SurfaceOp>,
        image: Arc<RgbaImage>,
    }

    impl RecordingSurface {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            Self {
                size: (width, height),
                ops: Vec::new(),
                image: Arc::new(RgbaImage::new(1, 1)),
            }
        }

        pub(crate) fn draws(&self) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, SurfaceOp::Text(..)))
                .count()
        }
    }

    impl RasterSurface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.ops.push(SurfaceOp::Resize(width, height));
        }
        fn clear(&mut self, color: Color) {
            self.ops.push(SurfaceOp::Clear(color));
        }
        fn set_font(&mut self, font: FontRef<'_>) {
            let name = match font {
                FontRef::Default => "<default>".to_string(),
                FontRef::Custom(font) => format!("custom:{}", font.family),
                FontRef::System(name) => name.to_string(),
            };
            self.ops.push(SurfaceOp::Font(name));
        }
        fn set_fill(&mut self, color: Color) {
            self.ops.push(SurfaceOp::Fill(color));
        }
        fn set_text_size(&mut self, size: f32) {
            self.ops.push(SurfaceOp::TextSize(size));
        }
        fn set_leading(&mut self, leading: f32) {
            self.ops.push(SurfaceOp::Leading(leading));
        }
        fn set_flip_vertical(&mut self, flipped: bool) {
            self.ops.push(SurfaceOp::Flip(flipped));
        }
        fn draw_text(&mut self, text: &str, x: f32, y: f32) {
            self.ops.push(SurfaceOp::Text(text.to_string(), x, y));
        }
        fn handle(&self) -> RasterHandle {
            RasterHandle::new(self.image.clone(), self.draws() as u64)
        }
    }

    fn custom_font(family: &str) -> LoadedFont {
        LoadedFont {
            source_name: format!("{family}.ttf"),
            family: family.to_string(),
            data: Arc::new(vec![0, 1, 2]),
        }
    }

    #[test]
    fn regeneration_follows_draw_sequence() {
        let store = ParameterStore::default();
        let mut cache = TextRasterCache::new();
        let mut surface = RecordingSurface::new(1080, 1350);

        assert!(cache.refresh(&store, &mut surface));

        let params = store.get();
        assert_eq!(
            surface.ops,
            vec![
                SurfaceOp::Clear(params.background_color),
                SurfaceOp::Font("Trebuchet MS".into()),
                SurfaceOp::Fill(params.text_color),
                SurfaceOp::TextSize(120.0),
                SurfaceOp::Leading(120.0 * 1.2),
                SurfaceOp::Flip(true),
                SurfaceOp::Text("BE\nLIKE\nTHE\nWATER".into(), 540.0, -675.0),
                SurfaceOp::Flip(false),
            ]
        );
        assert_eq!(cache.snapshot(), Some(&RasterSnapshot::project(params)));
    }

    #[test]
    fn non_raster_fields_never_regenerate() {
        let mut store = ParameterStore::default();
        let mut cache = TextRasterCache::new();
        let mut surface = RecordingSurface::new(64, 64);
        cache.refresh(&store, &mut surface);

        store.set(ParamField::Displacement, 0.15_f32).unwrap();
        store.set(ParamField::NumBubbles, 20_i32).unwrap();
        store.set(ParamField::BubbleSpeed, 4.0_f32).unwrap();
        store.set(ParamField::ZoomLevel, 0.5_f32).unwrap();
        assert!(!cache.is_stale(store.get()));
        assert!(!cache.refresh(&store, &mut surface));
        assert_eq!(cache.regenerations(), 1);
    }

    #[test]
    fn each_raster_field_triggers_exactly_one_regeneration() {
        let mut store = ParameterStore::default();
        let mut cache = TextRasterCache::new();
        let mut surface = RecordingSurface::new(64, 64);
        cache.refresh(&store, &mut surface);

        let edits: [(ParamField, params::ParamValue); 6] = [
            (ParamField::TextContent, "HELLO".into()),
            (ParamField::FontFamily, "Georgia".into()),
            (ParamField::FontSize, 90.0_f32.into()),
            (ParamField::LineHeight, 1.5_f32.into()),
            (ParamField::BackgroundColor, Color::rgb(1, 2, 3).into()),
            (ParamField::TextColor, Color::rgb(4, 5, 6).into()),
        ];
        for (index, (field, value)) in edits.into_iter().enumerate() {
            store.set(field, value).unwrap();
            assert!(cache.refresh(&store, &mut surface), "{field} should redraw");
            assert!(!cache.refresh(&store, &mut surface), "{field} redrew twice");
            assert_eq!(cache.regenerations(), index as u64 + 2);
            assert_eq!(
                cache.snapshot(),
                Some(&RasterSnapshot::project(store.get()))
            );
        }
    }

    #[test]
    fn mark_dirty_forces_redraw() {
        let store = ParameterStore::default();
        let mut cache = TextRasterCache::new();
        let mut surface = RecordingSurface::new(64, 64);
        cache.refresh(&store, &mut surface);

        cache.mark_dirty();
        assert!(cache.is_stale(store.get()));
        assert!(cache.refresh(&store, &mut surface));
        assert!(!cache.is_dirty());
    }

    #[test]
    fn custom_family_resolves_through_loaded_font() {
        let font = custom_font("Lobster");
        assert_eq!(resolve_font("custom", None), FontRef::Default);
        assert_eq!(resolve_font("custom", Some(&font)), FontRef::Custom(&font));
        assert_eq!(resolve_font("Georgia", Some(&font)), FontRef::System("Georgia"));

        let mut store = ParameterStore::default();
        store.install_custom_font(font.clone());
        let mut cache = TextRasterCache::new();
        let mut surface = RecordingSurface::new(64, 64);
        cache.refresh(&store, &mut surface);
        assert!(surface.ops.contains(&SurfaceOp::Font("custom:Lobster".into())));
    }
}
