use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::{CanvasDimensions, MAX_CANVAS_EDGE};
use crate::fields::{ParamField, ParamValue, ParameterSet};
use crate::preset::PresetCatalog;
use crate::store::ParameterStore;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Startup settings read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub preset: Option<String>,
    pub fps: Option<f32>,
    pub canvas: Option<CanvasDimensions>,
    pub flip: Option<bool>,
    pub zoom: Option<f32>,
    pub export_dir: Option<PathBuf>,
    /// Per-field overrides applied after the preset, keyed by field name.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
}

impl AppConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: AppConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.preset {
            if PresetCatalog::builtin().get(name).is_none() {
                return Err(ConfigError::Invalid(format!("unknown preset '{name}'")));
            }
        }

        if let Some(fps) = self.fps {
            if !(fps > 0.0) {
                return Err(ConfigError::Invalid(format!("fps must be > 0, got {fps}")));
            }
        }

        if let Some(zoom) = self.zoom {
            if !(zoom > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "zoom must be > 0, got {zoom}"
                )));
            }
        }

        // Dry-run every override so a bad value is reported before anything is applied.
        let mut scratch = ParameterSet::default();
        if let Some(canvas) = self.canvas {
            scratch.canvas_width = canvas.width;
            scratch.canvas_height = canvas.height;
        }
        for (field, value) in self.overrides()? {
            scratch
                .assign(field, value.clone())
                .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }
        let canvas = CanvasDimensions::new(scratch.canvas_width, scratch.canvas_height);
        if !canvas.is_renderable() {
            return Err(ConfigError::Invalid(format!(
                "canvas {canvas} is outside 1x1..{MAX_CANVAS_EDGE}x{MAX_CANVAS_EDGE}"
            )));
        }
        Ok(())
    }

    pub fn overrides(&self) -> Result<Vec<(ParamField, &ParamValue)>, ConfigError> {
        self.params
            .iter()
            .map(|(key, value)| {
                key.parse::<ParamField>()
                    .map(|field| (field, value))
                    .map_err(|err| ConfigError::Invalid(err.to_string()))
            })
            .collect()
    }

    /// Layers the preset, view settings and overrides onto `store`, in that order.
    pub fn apply_to(&self, store: &mut ParameterStore) -> Result<(), ConfigError> {
        let invalid = |err: crate::ParamError| ConfigError::Invalid(err.to_string());

        if let Some(name) = &self.preset {
            store
                .apply_preset_named(&PresetCatalog::builtin(), name)
                .map_err(invalid)?;
        }
        if let Some(canvas) = self.canvas {
            store
                .set(ParamField::CanvasWidth, canvas.width)
                .map_err(invalid)?;
            store
                .set(ParamField::CanvasHeight, canvas.height)
                .map_err(invalid)?;
        }
        if let Some(flip) = self.flip {
            store.set(ParamField::FlipDimensions, flip).map_err(invalid)?;
        }
        if let Some(zoom) = self.zoom {
            store.set(ParamField::ZoomLevel, zoom).map_err(invalid)?;
        }
        for (field, value) in self.overrides()? {
            store.set(field, value.clone()).map_err(invalid)?;
        }
        Ok(())
    }
}
