use serde::Serialize;

use crate::fields::{ParamField, ParameterSet};

/// How a slider's current value is rendered next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    Raw,
    /// `floor(value * scale)` followed by `%`.
    Percent { scale: u32 },
}

/// Range metadata for one slider of the control panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlSpec {
    pub field: ParamField,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub step: f32,
    pub format: DisplayFormat,
}

impl ControlSpec {
    pub fn format_value(&self, value: f32) -> String {
        match self.format {
            DisplayFormat::Raw => format!("{value}"),
            DisplayFormat::Percent { scale } => {
                format!("{}%", (value * scale as f32).floor() as i64)
            }
        }
    }

    /// Moves `value` by `steps` increments, clamped to the slider range.
    pub fn step_value(&self, value: f32, steps: i32) -> f32 {
        let next = value + self.step * steps as f32;
        let clamped = next.clamp(self.min, self.max);
        // Snap to the step grid so repeated nudges do not accumulate drift.
        let snapped = ((clamped - self.min) / self.step).round() * self.step + self.min;
        snapped.clamp(self.min, self.max)
    }
}

const fn slider(
    field: ParamField,
    label: &'static str,
    min: f32,
    max: f32,
    step: f32,
    format: DisplayFormat,
) -> ControlSpec {
    ControlSpec {
        field,
        label,
        min,
        max,
        step,
        format,
    }
}

pub const FONT_SIZE: ControlSpec = slider(
    ParamField::FontSize,
    "Font size",
    10.0,
    300.0,
    1.0,
    DisplayFormat::Raw,
);
pub const LINE_HEIGHT: ControlSpec = slider(
    ParamField::LineHeight,
    "Line height",
    0.5,
    3.0,
    0.1,
    DisplayFormat::Raw,
);
pub const DISPLACEMENT: ControlSpec = slider(
    ParamField::Displacement,
    "Displacement",
    0.0,
    0.2,
    0.01,
    DisplayFormat::Raw,
);
pub const NUM_BUBBLES: ControlSpec = slider(
    ParamField::NumBubbles,
    "Bubbles",
    0.0,
    30.0,
    1.0,
    DisplayFormat::Raw,
);
pub const BUBBLE_SPEED: ControlSpec = slider(
    ParamField::BubbleSpeed,
    "Speed",
    0.0,
    5.0,
    0.1,
    DisplayFormat::Raw,
);
pub const MIN_BUBBLE_SIZE: ControlSpec = slider(
    ParamField::MinBubbleSize,
    "Min size",
    0.05,
    3.0,
    0.05,
    DisplayFormat::Raw,
);
pub const MAX_BUBBLE_SIZE: ControlSpec = slider(
    ParamField::MaxBubbleSize,
    "Max size",
    0.05,
    3.0,
    0.05,
    DisplayFormat::Raw,
);
pub const BUBBLE_HIGHLIGHT_SIZE: ControlSpec = slider(
    ParamField::BubbleHighlightSize,
    "Highlight size",
    0.0,
    100.0,
    1.0,
    DisplayFormat::Raw,
);
pub const BUBBLE_HIGHLIGHT_STRENGTH: ControlSpec = slider(
    ParamField::BubbleHighlightStrength,
    "Highlight strength",
    0.0,
    10.0,
    0.5,
    DisplayFormat::Raw,
);
pub const BUBBLE_OPACITY: ControlSpec = slider(
    ParamField::BubbleOpacity,
    "Opacity",
    0.0,
    0.2,
    0.01,
    DisplayFormat::Percent { scale: 1000 },
);
pub const BUBBLE_CONTRAST: ControlSpec = slider(
    ParamField::BubbleContrast,
    "Contrast",
    0.0,
    2.0,
    0.1,
    DisplayFormat::Percent { scale: 100 },
);
pub const ZOOM_LEVEL: ControlSpec = slider(
    ParamField::ZoomLevel,
    "Zoom",
    0.1,
    2.0,
    0.05,
    DisplayFormat::Percent { scale: 100 },
);

/// All sliders in panel order.
pub const CONTROLS: [ControlSpec; 12] = [
    FONT_SIZE,
    LINE_HEIGHT,
    DISPLACEMENT,
    NUM_BUBBLES,
    BUBBLE_SPEED,
    MIN_BUBBLE_SIZE,
    MAX_BUBBLE_SIZE,
    BUBBLE_HIGHLIGHT_SIZE,
    BUBBLE_HIGHLIGHT_STRENGTH,
    BUBBLE_OPACITY,
    BUBBLE_CONTRAST,
    ZOOM_LEVEL,
];

pub fn control_for(field: ParamField) -> Option<&'static ControlSpec> {
    CONTROLS.iter().find(|spec| spec.field == field)
}

/// One-line summary of the panel, e.g. for a window title.
pub fn summarize(params: &ParameterSet) -> String {
    let entries = [
        (&NUM_BUBBLES, params.num_bubbles as f32),
        (&BUBBLE_SPEED, params.bubble_speed),
        (&BUBBLE_OPACITY, params.bubble_opacity),
        (&BUBBLE_CONTRAST, params.bubble_contrast),
        (&ZOOM_LEVEL, params.zoom_level),
    ];
    let (width, height) = params.canvas_size();
    let mut parts = vec![format!("{width}x{height}")];
    parts.extend(
        entries
            .iter()
            .map(|(spec, value)| format!("{} {}", spec.label, spec.format_value(*value))),
    );
    parts.join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formats_floor_scaled_value() {
        assert_eq!(BUBBLE_OPACITY.format_value(0.07), "70%");
        assert_eq!(BUBBLE_CONTRAST.format_value(1.2), "120%");
        assert_eq!(ZOOM_LEVEL.format_value(0.555), "55%");
        assert_eq!(FONT_SIZE.format_value(120.0), "120");
    }

    #[test]
    fn stepping_clamps_to_range() {
        assert_eq!(NUM_BUBBLES.step_value(30.0, 1), 30.0);
        assert_eq!(NUM_BUBBLES.step_value(0.0, -1), 0.0);
        assert_eq!(FONT_SIZE.step_value(120.0, 5), 125.0);
    }

    #[test]
    fn highlight_control_tops_out_at_hundred() {
        let spec = control_for(ParamField::BubbleHighlightSize).unwrap();
        assert_eq!(spec.max, 100.0);
    }
}
