use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ParamError;

/// Longest canvas edge accepted from selectors and config files. Matches the
/// 2D texture limit every wgpu adapter guarantees by default.
pub const MAX_CANVAS_EDGE: u32 = 8192;

/// A `WIDTHxHEIGHT` canvas selector, before any flip is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanvasDimensions {
    pub width: u32,
    pub height: u32,
}

impl CanvasDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn flipped(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Whether both edges are in `1..=MAX_CANVAS_EDGE`.
    pub fn is_renderable(&self) -> bool {
        (1..=MAX_CANVAS_EDGE).contains(&self.width) && (1..=MAX_CANVAS_EDGE).contains(&self.height)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Selector choices offered by the canvas-size picker.
pub const CANVAS_OPTIONS: [(CanvasDimensions, &str); 6] = [
    (CanvasDimensions::new(1080, 1080), "square post"),
    (CanvasDimensions::new(1080, 1350), "portrait post"),
    (CanvasDimensions::new(1080, 1920), "story"),
    (CanvasDimensions::new(1920, 1080), "landscape"),
    (CanvasDimensions::new(1200, 628), "link preview"),
    (CanvasDimensions::new(1500, 500), "banner"),
];

impl FromStr for CanvasDimensions {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParamError::InvalidDimensionString(s.to_string());
        let (width, height) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = width.trim().parse().map_err(|_| invalid())?;
        let height: u32 = height.trim().parse().map_err(|_| invalid())?;
        let dimensions = Self { width, height };
        if !dimensions.is_renderable() {
            return Err(invalid());
        }
        Ok(dimensions)
    }
}

impl fmt::Display for CanvasDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Serialize for CanvasDimensions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanvasDimensions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
