use serde::Serialize;

use crate::color::Color;
use crate::fields::ParameterSet;

/// Named snapshot of every appearance and distortion field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub background_color: Color,
    pub text_color: Color,
    pub text_content: &'static str,
    pub font_family: &'static str,
    pub font_size: f32,
    pub line_height: f32,
    pub displacement: f32,
    pub num_bubbles: i32,
    pub min_bubble_size: f32,
    pub max_bubble_size: f32,
    pub bubble_speed: f32,
    pub bubble_opacity: f32,
    pub bubble_contrast: f32,
    pub bubble_highlight_size: f32,
    pub bubble_highlight_strength: f32,
}

impl Preset {
    /// Overwrites every preset-covered field of `params`; view fields are kept.
    pub fn write_into(&self, params: &mut ParameterSet) {
        params.background_color = self.background_color;
        params.text_color = self.text_color;
        params.text_content = self.text_content.to_string();
        params.font_family = self.font_family.to_string();
        params.font_size = self.font_size;
        params.line_height = self.line_height;
        params.displacement = self.displacement;
        params.num_bubbles = self.num_bubbles;
        params.min_bubble_size = self.min_bubble_size;
        params.max_bubble_size = self.max_bubble_size;
        params.bubble_speed = self.bubble_speed;
        params.bubble_opacity = self.bubble_opacity;
        params.bubble_contrast = self.bubble_contrast;
        params.bubble_highlight_size = self.bubble_highlight_size;
        params.bubble_highlight_strength = self.bubble_highlight_strength;
    }

    /// Returns a copy of `params` with this preset applied.
    pub fn applied_to(&self, params: &ParameterSet) -> ParameterSet {
        let mut next = params.clone();
        self.write_into(&mut next);
        next
    }
}

static BUILTIN_PRESETS: [Preset; 4] = [
    Preset {
        name: "bubble",
        background_color: Color::rgb(0x00, 0x64, 0xff),
        text_color: Color::rgb(0xdb, 0xe9, 0xff),
        text_content: "BE\nLIKE\nTHE\nWATER",
        font_family: "Trebuchet MS",
        font_size: 120.0,
        line_height: 1.2,
        displacement: 0.06,
        num_bubbles: 8,
        min_bubble_size: 0.25,
        max_bubble_size: 1.65,
        bubble_speed: 2.0,
        bubble_opacity: 0.07,
        bubble_contrast: 1.2,
        bubble_highlight_size: 0.0,
        bubble_highlight_strength: 8.0,
    },
    Preset {
        name: "vampiric",
        background_color: Color::rgb(0xdb, 0x00, 0x00),
        text_color: Color::rgb(0x00, 0x00, 0x00),
        text_content: "BLOOD\nSWEAT\nAND\nTEARS",
        font_family: "Georgia",
        font_size: 175.0,
        line_height: 1.0,
        displacement: 0.03,
        num_bubbles: 6,
        min_bubble_size: 0.1,
        max_bubble_size: 1.0,
        bubble_speed: 1.3,
        bubble_opacity: 0.15,
        bubble_contrast: 0.5,
        bubble_highlight_size: 100.0,
        bubble_highlight_strength: 0.0,
    },
    Preset {
        name: "slick",
        background_color: Color::rgb(0x1a, 0x1a, 0x1a),
        text_color: Color::rgb(0xff, 0xff, 0xff),
        text_content: "GO WITH\nTHE FLOW",
        font_family: "Arial Black",
        font_size: 50.0,
        line_height: 1.0,
        displacement: 0.0,
        num_bubbles: 12,
        min_bubble_size: 1.0,
        max_bubble_size: 2.0,
        bubble_speed: 2.0,
        bubble_opacity: 0.17,
        bubble_contrast: 0.2,
        bubble_highlight_size: 98.0,
        bubble_highlight_strength: 5.0,
    },
    Preset {
        name: "minimal",
        background_color: Color::rgb(0xff, 0xff, 0xff),
        text_color: Color::rgb(0x33, 0x33, 0x33),
        text_content: "GREETINGS,\nWORLD",
        font_family: "Arial Narrow",
        font_size: 60.0,
        line_height: 2.0,
        displacement: 0.03,
        num_bubbles: 6,
        min_bubble_size: 0.75,
        max_bubble_size: 2.0,
        bubble_speed: 3.0,
        bubble_opacity: 0.0,
        bubble_contrast: 0.0,
        bubble_highlight_size: 0.0,
        bubble_highlight_strength: 0.0,
    },
];

/// Compiled-in, read-only list of presets.
#[derive(Debug, Clone, Copy)]
pub struct PresetCatalog {
    presets: &'static [Preset],
}

impl PresetCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: &BUILTIN_PRESETS,
        }
    }

    /// Preset identifiers in display order.
    pub fn list(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.presets.iter().map(|preset| preset.name)
    }

    pub fn get(&self, name: &str) -> Option<&'static Preset> {
        let presets: &'static [Preset] = self.presets;
        presets.iter().find(|preset| preset.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static Preset> {
        let presets: &'static [Preset] = self.presets;
        presets.iter()
    }

    pub fn by_index(&self, index: usize) -> Option<&'static Preset> {
        let presets: &'static [Preset] = self.presets;
        presets.get(index)
    }

    pub fn default_preset(&self) -> &'static Preset {
        &BUILTIN_PRESETS[0]
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_presets_in_order() {
        let catalog = PresetCatalog::builtin();
        let names: Vec<_> = catalog.list().collect();
        assert_eq!(names, ["bubble", "vampiric", "slick", "minimal"]);
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(PresetCatalog::builtin().get("neon").is_none());
        assert!(PresetCatalog::builtin().get("Bubble").is_none());
    }

    #[test]
    fn applied_preset_keeps_view_fields() {
        let mut params = ParameterSet::default();
        params.zoom_level = 0.4;
        params.canvas_width = 1200;
        params.canvas_height = 628;
        params.flip_dimensions = true;

        let preset = PresetCatalog::builtin().get("slick").unwrap();
        let next = preset.applied_to(&params);
        assert_eq!(next.text_content, "GO WITH\nTHE FLOW");
        assert_eq!(next.num_bubbles, 12);
        assert_eq!(next.zoom_level, 0.4);
        assert_eq!((next.canvas_width, next.canvas_height), (1200, 628));
        assert!(next.flip_dimensions);
    }
}
