use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::ParamError;

/// Reserved font identifier that points at the user-loaded custom font.
pub const CUSTOM_FONT_ID: &str = "custom";

/// Font used whenever the selected family cannot be resolved.
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// Every user-adjustable parameter of the effect.
///
/// Appearance and distortion fields are covered by presets; the view fields
/// (`zoom_level`, canvas size, flip) are only ever changed one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub background_color: Color,
    pub text_color: Color,
    pub text_content: String,
    pub font_family: String,
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

    pub zoom_level: f32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub flip_dimensions: bool,
}

impl Default for ParameterSet {
    /// Starts from the `bubble` look at a square 1080px canvas.
    fn default() -> Self {
        let mut params = Self {
            background_color: Color::BLACK,
            text_color: Color::WHITE,
            text_content: String::new(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: 0.0,
            line_height: 0.0,
            displacement: 0.0,
            num_bubbles: 0,
            min_bubble_size: 0.0,
            max_bubble_size: 0.0,
            bubble_speed: 0.0,
            bubble_opacity: 0.0,
            bubble_contrast: 0.0,
            bubble_highlight_size: 0.0,
            bubble_highlight_strength: 0.0,
            zoom_level: 1.0,
            canvas_width: 1080,
            canvas_height: 1080,
            flip_dimensions: false,
        };
        crate::preset::PresetCatalog::builtin()
            .default_preset()
            .write_into(&mut params);
        params
    }
}

impl ParameterSet {
    /// Effective canvas size in pixels with `flip_dimensions` applied.
    pub fn canvas_size(&self) -> (u32, u32) {
        if self.flip_dimensions {
            (self.canvas_height, self.canvas_width)
        } else {
            (self.canvas_width, self.canvas_height)
        }
    }

    pub fn uses_custom_font(&self) -> bool {
        self.font_family == CUSTOM_FONT_ID
    }

    pub fn value(&self, field: ParamField) -> ParamValue {
        match field {
            ParamField::BackgroundColor => ParamValue::Color(self.background_color),
            ParamField::TextColor => ParamValue::Color(self.text_color),
            ParamField::TextContent => ParamValue::Text(self.text_content.clone()),
            ParamField::FontFamily => ParamValue::Text(self.font_family.clone()),
            ParamField::FontSize => ParamValue::Number(self.font_size.into()),
            ParamField::LineHeight => ParamValue::Number(self.line_height.into()),
            ParamField::Displacement => ParamValue::Number(self.displacement.into()),
            ParamField::NumBubbles => ParamValue::Integer(self.num_bubbles.into()),
            ParamField::MinBubbleSize => ParamValue::Number(self.min_bubble_size.into()),
            ParamField::MaxBubbleSize => ParamValue::Number(self.max_bubble_size.into()),
            ParamField::BubbleSpeed => ParamValue::Number(self.bubble_speed.into()),
            ParamField::BubbleOpacity => ParamValue::Number(self.bubble_opacity.into()),
            ParamField::BubbleContrast => ParamValue::Number(self.bubble_contrast.into()),
            ParamField::BubbleHighlightSize => {
                ParamValue::Number(self.bubble_highlight_size.into())
            }
            ParamField::BubbleHighlightStrength => {
                ParamValue::Number(self.bubble_highlight_strength.into())
            }
            ParamField::ZoomLevel => ParamValue::Number(self.zoom_level.into()),
            ParamField::CanvasWidth => ParamValue::Integer(self.canvas_width.into()),
            ParamField::CanvasHeight => ParamValue::Integer(self.canvas_height.into()),
            ParamField::FlipDimensions => ParamValue::Bool(self.flip_dimensions),
        }
    }

    /// Writes one field, coercing `value` into the field's type.
    ///
    /// On a coercion failure the set is left untouched.
    pub fn assign(&mut self, field: ParamField, value: ParamValue) -> Result<(), ParamError> {
        match field {
            ParamField::BackgroundColor => self.background_color = value.coerce_color(field)?,
            ParamField::TextColor => self.text_color = value.coerce_color(field)?,
            ParamField::TextContent => self.text_content = value.coerce_text(),
            ParamField::FontFamily => self.font_family = value.coerce_text(),
            ParamField::FontSize => self.font_size = value.coerce_f32(field)?,
            ParamField::LineHeight => self.line_height = value.coerce_f32(field)?,
            ParamField::Displacement => self.displacement = value.coerce_f32(field)?,
            ParamField::NumBubbles => self.num_bubbles = value.coerce_i32(field)?,
            ParamField::MinBubbleSize => self.min_bubble_size = value.coerce_f32(field)?,
            ParamField::MaxBubbleSize => self.max_bubble_size = value.coerce_f32(field)?,
            ParamField::BubbleSpeed => self.bubble_speed = value.coerce_f32(field)?,
            ParamField::BubbleOpacity => self.bubble_opacity = value.coerce_f32(field)?,
            ParamField::BubbleContrast => self.bubble_contrast = value.coerce_f32(field)?,
            ParamField::BubbleHighlightSize => {
                self.bubble_highlight_size = value.coerce_f32(field)?
            }
            ParamField::BubbleHighlightStrength => {
                self.bubble_highlight_strength = value.coerce_f32(field)?
            }
            ParamField::ZoomLevel => self.zoom_level = value.coerce_f32(field)?,
            ParamField::CanvasWidth => self.canvas_width = value.coerce_u32(field)?,
            ParamField::CanvasHeight => self.canvas_height = value.coerce_u32(field)?,
            ParamField::FlipDimensions => self.flip_dimensions = value.coerce_bool(field)?,
        }
        Ok(())
    }
}

/// Addresses a single field of [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamField {
    BackgroundColor,
    TextColor,
    TextContent,
    FontFamily,
    FontSize,
    LineHeight,
    Displacement,
    NumBubbles,
    MinBubbleSize,
    MaxBubbleSize,
    BubbleSpeed,
    BubbleOpacity,
    BubbleContrast,
    BubbleHighlightSize,
    BubbleHighlightStrength,
    ZoomLevel,
    CanvasWidth,
    CanvasHeight,
    FlipDimensions,
}

impl ParamField {
    pub const ALL: [ParamField; 19] = [
        ParamField::BackgroundColor,
        ParamField::TextColor,
        ParamField::TextContent,
        ParamField::FontFamily,
        ParamField::FontSize,
        ParamField::LineHeight,
        ParamField::Displacement,
        ParamField::NumBubbles,
        ParamField::MinBubbleSize,
        ParamField::MaxBubbleSize,
        ParamField::BubbleSpeed,
        ParamField::BubbleOpacity,
        ParamField::BubbleContrast,
        ParamField::BubbleHighlightSize,
        ParamField::BubbleHighlightStrength,
        ParamField::ZoomLevel,
        ParamField::CanvasWidth,
        ParamField::CanvasHeight,
        ParamField::FlipDimensions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamField::BackgroundColor => "background_color",
            ParamField::TextColor => "text_color",
            ParamField::TextContent => "text_content",
            ParamField::FontFamily => "font_family",
            ParamField::FontSize => "font_size",
            ParamField::LineHeight => "line_height",
            ParamField::Displacement => "displacement",
            ParamField::NumBubbles => "num_bubbles",
            ParamField::MinBubbleSize => "min_bubble_size",
            ParamField::MaxBubbleSize => "max_bubble_size",
            ParamField::BubbleSpeed => "bubble_speed",
            ParamField::BubbleOpacity => "bubble_opacity",
            ParamField::BubbleContrast => "bubble_contrast",
            ParamField::BubbleHighlightSize => "bubble_highlight_size",
            ParamField::BubbleHighlightStrength => "bubble_highlight_strength",
            ParamField::ZoomLevel => "zoom_level",
            ParamField::CanvasWidth => "canvas_width",
            ParamField::CanvasHeight => "canvas_height",
            ParamField::FlipDimensions => "flip_dimensions",
        }
    }

    /// View fields are never touched by presets.
    pub fn is_view(self) -> bool {
        matches!(
            self,
            ParamField::ZoomLevel
                | ParamField::CanvasWidth
                | ParamField::CanvasHeight
                | ParamField::FlipDimensions
        )
    }
}

impl fmt::Display for ParamField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamField {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match normalized.as_str() {
            "text" | "text_input" => "text_content",
            "font" => "font_family",
            "disp" | "disp_amt" => "displacement",
            "zoom" => "zoom_level",
            "flip" => "flip_dimensions",
            other => other,
        };
        ParamField::ALL
            .iter()
            .copied()
            .find(|field| field.name() == alias)
            .ok_or_else(|| ParamError::UnknownField(s.to_string()))
    }
}

/// Loosely typed input coming from a widget, CLI flag or config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    Color(Color),
}

impl ParamValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(value) => Some(*value),
            ParamValue::Integer(value) => Some(*value as f64),
            ParamValue::Text(raw) => raw.trim().parse().ok(),
            ParamValue::Bool(_) | ParamValue::Color(_) => None,
        }
    }

    fn mismatch(&self, field: ParamField, expected: &'static str) -> ParamError {
        ParamError::TypeMismatch {
            field,
            expected,
            found: self.to_string(),
        }
    }

    fn coerce_f64(&self, field: ParamField) -> Result<f64, ParamError> {
        match self {
            ParamValue::Number(value) => Ok(*value),
            ParamValue::Integer(value) => Ok(*value as f64),
            ParamValue::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|_| self.mismatch(field, "number")),
            ParamValue::Bool(_) | ParamValue::Color(_) => Err(self.mismatch(field, "number")),
        }
    }

    fn coerce_f32(&self, field: ParamField) -> Result<f32, ParamError> {
        self.coerce_f64(field).map(|value| value as f32)
    }

    fn coerce_i32(&self, field: ParamField) -> Result<i32, ParamError> {
        let value = match self {
            ParamValue::Integer(value) => *value,
            _ => self.coerce_f64(field)?.trunc() as i64,
        };
        i32::try_from(value).map_err(|_| self.mismatch(field, "32-bit integer"))
    }

    fn coerce_u32(&self, field: ParamField) -> Result<u32, ParamError> {
        let value = match self {
            ParamValue::Integer(value) => *value,
            _ => self.coerce_f64(field)?.trunc() as i64,
        };
        u32::try_from(value).map_err(|_| self.mismatch(field, "non-negative integer"))
    }

    fn coerce_bool(&self, field: ParamField) -> Result<bool, ParamError> {
        match self {
            ParamValue::Bool(value) => Ok(*value),
            ParamValue::Integer(value) => Ok(*value != 0),
            ParamValue::Text(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(true),
                "false" | "off" | "no" | "0" => Ok(false),
                _ => Err(self.mismatch(field, "boolean")),
            },
            ParamValue::Number(_) | ParamValue::Color(_) => Err(self.mismatch(field, "boolean")),
        }
    }

    fn coerce_color(&self, field: ParamField) -> Result<Color, ParamError> {
        match self {
            ParamValue::Color(color) => Ok(*color),
            ParamValue::Text(raw) => {
                Color::from_hex(raw).map_err(|_| self.mismatch(field, "hex colour"))
            }
            _ => Err(self.mismatch(field, "hex colour")),
        }
    }

    fn coerce_text(&self) -> String {
        match self {
            ParamValue::Text(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Integer(value) => write!(f, "{value}"),
            ParamValue::Number(value) => write!(f, "{value}"),
            ParamValue::Color(color) => write!(f, "{color}"),
            ParamValue::Text(raw) => f.write_str(raw),
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(value.into())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Color> for ParamValue {
    fn from(value: Color) -> Self {
        ParamValue::Color(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_coerces_numeric_text() {
        let mut params = ParameterSet::default();
        params
            .assign(ParamField::FontSize, ParamValue::from("96"))
            .unwrap();
        assert_eq!(params.font_size, 96.0);

        params
            .assign(ParamField::NumBubbles, ParamValue::from(3.9_f64))
            .unwrap();
        assert_eq!(params.num_bubbles, 3);
    }

    #[test]
    fn assign_passes_out_of_range_values_through() {
        let mut params = ParameterSet::default();
        params
            .assign(ParamField::NumBubbles, ParamValue::from(-4_i32))
            .unwrap();
        assert_eq!(params.num_bubbles, -4);
        params
            .assign(ParamField::LineHeight, ParamValue::from(-1.5_f32))
            .unwrap();
        assert_eq!(params.line_height, -1.5);
    }

    #[test]
    fn failed_coercion_leaves_value_untouched() {
        let mut params = ParameterSet::default();
        let before = params.clone();
        let err = params
            .assign(ParamField::BackgroundColor, ParamValue::from("not-a-colour"))
            .unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
        let err = params
            .assign(ParamField::CanvasWidth, ParamValue::from(-10_i32))
            .unwrap_err();
        assert!(matches!(err, ParamError::TypeMismatch { .. }));
        assert_eq!(params, before);
    }

    #[test]
    fn canvas_size_honours_flip() {
        let mut params = ParameterSet::default();
        params.canvas_width = 1080;
        params.canvas_height = 1920;
        assert_eq!(params.canvas_size(), (1080, 1920));
        params.flip_dimensions = true;
        assert_eq!(params.canvas_size(), (1920, 1080));
    }

    #[test]
    fn parses_field_names_and_aliases() {
        assert_eq!("font-size".parse::<ParamField>().unwrap(), ParamField::FontSize);
        assert_eq!("text".parse::<ParamField>().unwrap(), ParamField::TextContent);
        assert!("bogus".parse::<ParamField>().is_err());
    }
}
