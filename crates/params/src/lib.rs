//! Parameter model for the bubble-shift renderer: the editable settings, the
//! built-in presets, and the startup configuration that seeds them.

mod canvas;
mod color;
mod config;
pub mod controls;
mod fields;
mod preset;
mod store;

pub use canvas::{CanvasDimensions, CANVAS_OPTIONS, MAX_CANVAS_EDGE};
pub use color::Color;
pub use config::{AppConfig, ConfigError};
pub use controls::{ControlSpec, DisplayFormat};
pub use fields::{ParamField, ParamValue, ParameterSet, CUSTOM_FONT_ID, DEFAULT_FONT_FAMILY};
pub use preset::{Preset, PresetCatalog};
pub use store::{LoadedFont, ParameterStore};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("unknown parameter '{0}'")]
    UnknownField(String),
    #[error("invalid canvas dimensions '{0}'; expected WIDTHxHEIGHT")]
    InvalidDimensionString(String),
    #[error("invalid colour '{0}'")]
    InvalidColor(String),
    #[error("{field} expects a {expected}, got '{found}'")]
    TypeMismatch {
        field: ParamField,
        expected: &'static str,
        found: String,
    },
}
