use std::collections::HashMap;

use params::{controls, ParameterSet};
use tracing::debug;

use crate::host::ShaderProgram;
use crate::types::{RasterHandle, UniformValue};

pub const DISP_AMT: &str = "dispAmt";
pub const NUM_BUBBLES: &str = "numBubbles";
pub const MIN_BUBBLE_SIZE: &str = "minBubbleSize";
pub const MAX_BUBBLE_SIZE: &str = "maxBubbleSize";
pub const BUBBLE_HIGHLIGHT_SIZE: &str = "bubbleHighlightSize";
pub const BUBBLE_HIGHLIGHT_STRENGTH: &str = "bubbleHighlightStrength";
pub const BUBBLE_CONTRAST: &str = "bubbleContrast";
pub const BUBBLE_OPACITY: &str = "bubbleOpacity";
pub const TIME: &str = "time";
pub const RESOLUTION: &str = "resolution";
pub const TEX1: &str = "tex1";

/// Uniforms that are only re-sent when their value changes.
pub const CONDITIONAL_UNIFORMS: [&str; 8] = [
    DISP_AMT,
    NUM_BUBBLES,
    MIN_BUBBLE_SIZE,
    MAX_BUBBLE_SIZE,
    BUBBLE_HIGHLIGHT_SIZE,
    BUBBLE_HIGHLIGHT_STRENGTH,
    BUBBLE_CONTRAST,
    BUBBLE_OPACITY,
];

/// Shader time for a frame: one unit per hundred frames, scaled by speed.
pub fn elapsed_time(frame: u64, bubble_speed: f32) -> f32 {
    (frame as f32 / 100.0) * bubble_speed
}

/// The highlight control is inverted: a full slider means no highlight.
pub fn highlight_uniform(control_max: f32, value: f32) -> f32 {
    control_max - value
}

/// Last value sent for each conditional uniform.
#[derive(Debug, Default)]
pub struct UniformCache {
    values: HashMap<&'static str, UniformValue>,
}

impl UniformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` and reports whether it differs from what was sent last.
    pub fn update(&mut self, name: &'static str, value: &UniformValue) -> bool {
        match self.values.get(name) {
            Some(previous) if previous == value => false,
            _ => {
                self.values.insert(name, value.clone());
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Names pushed to the program during one sync, in push order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub pushed: Vec<&'static str>,
}

impl SyncReport {
    pub fn contains(&self, name: &str) -> bool {
        self.pushed.iter().any(|pushed| *pushed == name)
    }

    pub fn conditional_count(&self) -> usize {
        self.pushed
            .iter()
            .filter(|name| CONDITIONAL_UNIFORMS.contains(*name))
            .count()
    }
}

#[derive(Debug)]
pub struct UniformSynchronizer {
    cache: UniformCache,
    highlight_max: f32,
}

impl Default for UniformSynchronizer {
    fn default() -> Self {
        Self::new(controls::BUBBLE_HIGHLIGHT_SIZE.max)
    }
}

impl UniformSynchronizer {
    pub fn new(highlight_max: f32) -> Self {
        Self {
            cache: UniformCache::new(),
            highlight_max,
        }
    }

    pub fn cache(&self) -> &UniformCache {
        &self.cache
    }

    /// Forgets every cached value so the next sync re-sends all of them.
    pub fn invalidate(&mut self) {
        debug!(cached = self.cache.len(), "uniform cache invalidated");
        self.cache.clear();
    }

    pub fn push_uniforms(
        &mut self,
        params: &ParameterSet,
        frame: u64,
        resolution: (u32, u32),
        raster: &RasterHandle,
        program: &mut dyn ShaderProgram,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let conditional = [
            (DISP_AMT, UniformValue::Float(params.displacement)),
            (NUM_BUBBLES, UniformValue::Int(params.num_bubbles)),
            (MIN_BUBBLE_SIZE, UniformValue::Float(params.min_bubble_size)),
            (MAX_BUBBLE_SIZE, UniformValue::Float(params.max_bubble_size)),
            (
                BUBBLE_HIGHLIGHT_SIZE,
                UniformValue::Float(highlight_uniform(
                    self.highlight_max,
                    params.bubble_highlight_size,
                )),
            ),
            (
                BUBBLE_HIGHLIGHT_STRENGTH,
                UniformValue::Float(params.bubble_highlight_strength),
            ),
            (BUBBLE_CONTRAST, UniformValue::Float(params.bubble_contrast)),
            (BUBBLE_OPACITY, UniformValue::Float(params.bubble_opacity)),
        ];
        for (name, value) in conditional {
            if self.cache.update(name, &value) {
                program.set_uniform(name, &value);
                report.pushed.push(name);
            }
        }

        let unconditional = [
            (TIME, UniformValue::Float(elapsed_time(frame, params.bubble_speed))),
            (
                RESOLUTION,
                UniformValue::Vec2([resolution.0 as f32, resolution.1 as f32]),
            ),
            (TEX1, UniformValue::Texture(raster.clone())),
        ];
        for (name, value) in unconditional {
            program.set_uniform(name, &value);
            report.pushed.push(name);
        }

        debug!(frame, pushed = ?report.pushed, "uniforms synced");
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use image::RgbaImage;
    use params::{ParamField, ParameterStore};

    use super::*;

    #[derive(Default)]
    struct RecordingProgram {
        calls: Vec<(String, UniformValue)>,
    }

    impl ShaderProgram for RecordingProgram {
        fn set_uniform(&mut self, name: &str, value: &UniformValue) {
            self.calls.push((name.to_string(), value.clone()));
        }
    }

    impl RecordingProgram {
        fn last(&self, name: &str) -> Option<&UniformValue> {
            self.calls
                .iter()
                .rev()
                .find(|(called, _)| called == name)
                .map(|(_, value)| value)
        }
    }

    fn raster() -> RasterHandle {
        RasterHandle::new(Arc::new(RgbaImage::new(4, 4)), 1)
    }

    #[test]
    fn time_scales_frame_count_by_speed() {
        assert_eq!(elapsed_time(250, 2.0), 5.0);
        assert_eq!(elapsed_time(0, 3.0), 0.0);
    }

    #[test]
    fn highlight_is_inverted_against_control_max() {
        assert_eq!(highlight_uniform(100.0, 30.0), 70.0);
        assert_eq!(highlight_uniform(100.0, 100.0), 0.0);
    }

    #[test]
    fn first_sync_pushes_everything() {
        let store = ParameterStore::default();
        let mut sync = UniformSynchronizer::default();
        let mut program = RecordingProgram::default();

        let report = sync.push_uniforms(store.get(), 1, (1080, 1080), &raster(), &mut program);

        assert_eq!(report.conditional_count(), CONDITIONAL_UNIFORMS.len());
        assert!(report.contains(TIME) && report.contains(RESOLUTION) && report.contains(TEX1));
        assert_eq!(program.calls.len(), CONDITIONAL_UNIFORMS.len() + 3);
        // The bubble preset has highlight size 0, so the shader receives the max.
        assert_eq!(
            program.last(BUBBLE_HIGHLIGHT_SIZE),
            Some(&UniformValue::Float(100.0))
        );
    }

    #[test]
    fn unchanged_inputs_skip_conditional_uploads() {
        let store = ParameterStore::default();
        let mut sync = UniformSynchronizer::default();
        let mut program = RecordingProgram::default();
        let raster = raster();

        sync.push_uniforms(store.get(), 1, (1080, 1080), &raster, &mut program);
        program.calls.clear();
        let report = sync.push_uniforms(store.get(), 2, (1080, 1080), &raster, &mut program);

        assert_eq!(report.conditional_count(), 0);
        assert_eq!(report.pushed, vec![TIME, RESOLUTION, TEX1]);
        assert_eq!(program.calls.len(), 3);
    }

    #[test]
    fn only_changed_uniform_is_resent() {
        let mut store = ParameterStore::default();
        let mut sync = UniformSynchronizer::default();
        let mut program = RecordingProgram::default();
        let raster = raster();

        sync.push_uniforms(store.get(), 1, (1080, 1080), &raster, &mut program);
        store.set(ParamField::BubbleOpacity, 0.12_f32).unwrap();
        let report = sync.push_uniforms(store.get(), 2, (1080, 1080), &raster, &mut program);

        assert_eq!(report.conditional_count(), 1);
        assert!(report.contains(BUBBLE_OPACITY));
        assert_eq!(
            sync.cache().get(BUBBLE_OPACITY),
            Some(&UniformValue::Float(0.12))
        );
    }

    #[test]
    fn invalidate_forces_full_resend() {
        let store = ParameterStore::default();
        let mut sync = UniformSynchronizer::default();
        let mut program = RecordingProgram::default();
        let raster = raster();

        sync.push_uniforms(store.get(), 1, (1080, 1080), &raster, &mut program);
        sync.invalidate();
        assert!(sync.cache().is_empty());
        let report = sync.push_uniforms(store.get(), 2, (1080, 1350), &raster, &mut program);

        assert_eq!(report.conditional_count(), CONDITIONAL_UNIFORMS.len());
        assert_eq!(
            program.last(RESOLUTION),
            Some(&UniformValue::Vec2([1080.0, 1350.0]))
        );
    }

    #[test]
    fn time_is_sent_every_frame() {
        let store = ParameterStore::default();
        let mut sync = UniformSynchronizer::default();
        let mut program = RecordingProgram::default();
        let raster = raster();

        sync.push_uniforms(store.get(), 100, (8, 8), &raster, &mut program);
        assert_eq!(program.last(TIME), Some(&UniformValue::Float(2.0)));
        sync.push_uniforms(store.get(), 250, (8, 8), &raster, &mut program);
        assert_eq!(program.last(TIME), Some(&UniformValue::Float(5.0)));
    }
}
