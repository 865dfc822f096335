use bytemuck::{Pod, Zeroable};

use crate::sync;
use crate::types::UniformValue;

/// CPU mirror of `BubbleUniforms` in `bubble.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BubbleUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub disp_amt: f32,
    pub num_bubbles: i32,
    pub min_bubble_size: f32,
    pub max_bubble_size: f32,
    pub highlight_size: f32,
    pub highlight_strength: f32,
    pub contrast: f32,
    pub opacity: f32,
    pub _padding: f32,
}

unsafe impl Zeroable for BubbleUniforms {}
unsafe impl Pod for BubbleUniforms {}

impl BubbleUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32],
            ..Self::zeroed()
        }
    }

    /// Writes a named scalar or vector uniform. Returns `false` for names the
    /// shader does not declare and for textures, which live in their own
    /// bind group.
    pub fn apply(&mut self, name: &str, value: &UniformValue) -> bool {
        match (name, value) {
            (sync::RESOLUTION, UniformValue::Vec2(resolution)) => {
                self.resolution = *resolution;
                true
            }
            (sync::NUM_BUBBLES, value) => match value {
                UniformValue::Int(count) => {
                    self.num_bubbles = *count;
                    true
                }
                UniformValue::Float(count) => {
                    self.num_bubbles = count.round() as i32;
                    true
                }
                _ => false,
            },
            (name, value) => {
                let Some(scalar) = value.as_float() else {
                    return false;
                };
                let slot = match name {
                    sync::TIME => &mut self.time,
                    sync::DISP_AMT => &mut self.disp_amt,
                    sync::MIN_BUBBLE_SIZE => &mut self.min_bubble_size,
                    sync::MAX_BUBBLE_SIZE => &mut self.max_bubble_size,
                    sync::BUBBLE_HIGHLIGHT_SIZE => &mut self.highlight_size,
                    sync::BUBBLE_HIGHLIGHT_STRENGTH => &mut self.highlight_strength,
                    sync::BUBBLE_CONTRAST => &mut self.contrast,
                    sync::BUBBLE_OPACITY => &mut self.opacity,
                    _ => return false,
                };
                *slot = scalar;
                true
            }
        }
    }
}

/// Placement of the canvas quad inside the render target, in clip space.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PresentUniforms {
    pub scale: [f32; 2],
    pub _padding: [f32; 2],
}

unsafe impl Zeroable for PresentUniforms {}
unsafe impl Pod for PresentUniforms {}

impl PresentUniforms {
    /// Fills the whole target; used for exports.
    pub fn full() -> Self {
        Self {
            scale: [1.0, 1.0],
            _padding: [0.0; 2],
        }
    }

    /// Shows the canvas at `zoom` times its pixel size, centred in a window
    /// of `window` pixels. Anything that does not fit is clipped.
    pub fn for_zoom(canvas: (u32, u32), window: (u32, u32), zoom: f32) -> Self {
        let window_w = window.0.max(1) as f32;
        let window_h = window.1.max(1) as f32;
        Self {
            scale: [
                canvas.0 as f32 * zoom / window_w,
                canvas.1 as f32 * zoom / window_h,
            ],
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_shader() {
        assert_eq!(std::mem::size_of::<BubbleUniforms>(), 48);
        assert_eq!(std::mem::size_of::<PresentUniforms>(), 16);
    }

    #[test]
    fn named_values_land_in_their_slots() {
        let mut uniforms = BubbleUniforms::new(100, 50);
        assert!(uniforms.apply(sync::DISP_AMT, &UniformValue::Float(0.05)));
        assert!(uniforms.apply(sync::NUM_BUBBLES, &UniformValue::Int(8)));
        assert!(uniforms.apply(sync::TIME, &UniformValue::Float(1.5)));
        assert!(uniforms.apply(sync::RESOLUTION, &UniformValue::Vec2([640.0, 480.0])));

        assert_eq!(uniforms.disp_amt, 0.05);
        assert_eq!(uniforms.num_bubbles, 8);
        assert_eq!(uniforms.time, 1.5);
        assert_eq!(uniforms.resolution, [640.0, 480.0]);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut uniforms = BubbleUniforms::new(10, 10);
        let before = uniforms;
        assert!(!uniforms.apply("iChannel0", &UniformValue::Float(1.0)));
        assert!(!uniforms.apply(sync::TIME, &UniformValue::Vec2([1.0, 1.0])));
        assert_eq!(uniforms, before);
    }

    #[test]
    fn zoom_scales_relative_to_window() {
        let present = PresentUniforms::for_zoom((500, 250), (1000, 1000), 1.0);
        assert_eq!(present.scale, [0.5, 0.25]);

        let zoomed = PresentUniforms::for_zoom((500, 250), (1000, 1000), 2.0);
        assert_eq!(zoomed.scale, [1.0, 0.5]);
    }

    #[test]
    fn highlight_spot_scales_with_the_remapped_uniform() {
        let source = include_str!("../shaders/bubble.wgsl");
        let range: f32 = source
            .lines()
            .find_map(|line| line.strip_prefix("const HIGHLIGHT_RANGE: f32 = "))
            .and_then(|value| value.trim_end_matches(';').parse().ok())
            .expect("shader declares HIGHLIGHT_RANGE");
        assert_eq!(range, params::controls::BUBBLE_HIGHLIGHT_SIZE.max);

        // The uniform is a spot radius, never an exponent: a larger slider
        // value sends a smaller uniform and must shrink the spot.
        assert!(source.contains("u.highlight_size / HIGHLIGHT_RANGE"));
        assert!(!source.contains("max(u.highlight_size, 1.0)"));
    }
}
