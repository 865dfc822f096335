use std::sync::Arc;

use crate::canvas::CanvasDimensions;
use crate::fields::{ParamField, ParamValue, ParameterSet, CUSTOM_FONT_ID};
use crate::preset::{Preset, PresetCatalog};
use crate::ParamError;

/// Font bytes decoded from a user upload.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    /// File name the bytes came from, used for display only.
    pub source_name: String,
    /// Family name reported by the font's name table.
    pub family: String,
    pub data: Arc<Vec<u8>>,
}

impl PartialEq for LoadedFont {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && Arc::ptr_eq(&self.data, &other.data)
    }
}

/// Owner of the live [`ParameterSet`].
///
/// All mutation goes through `&mut self`, so a frame that reads the store
/// always sees a complete state: presets land in a single assignment.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: ParameterSet,
    custom_font: Option<LoadedFont>,
    revision: u64,
}

impl ParameterStore {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params,
            custom_font: None,
            revision: 0,
        }
    }

    pub fn get(&self) -> &ParameterSet {
        &self.params
    }

    /// Bumped on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set(&mut self, field: ParamField, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        self.params.assign(field, value.into())?;
        self.revision += 1;
        tracing::trace!(%field, revision = self.revision, "parameter updated");
        Ok(())
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        self.params = preset.applied_to(&self.params);
        self.revision += 1;
        tracing::info!(preset = preset.name, "preset applied");
    }

    /// Applies a preset by name; unknown names leave the store untouched.
    pub fn apply_preset_named(
        &mut self,
        catalog: &PresetCatalog,
        name: &str,
    ) -> Result<(), ParamError> {
        let preset = catalog
            .get(name)
            .ok_or_else(|| ParamError::UnknownPreset(name.to_string()))?;
        self.apply_preset(preset);
        Ok(())
    }

    /// Applies a `WIDTHxHEIGHT` selector; malformed input keeps the prior size.
    pub fn apply_canvas_selector(&mut self, selector: &str) -> Result<(), ParamError> {
        let dimensions: CanvasDimensions = selector.parse()?;
        self.params.canvas_width = dimensions.width;
        self.params.canvas_height = dimensions.height;
        self.revision += 1;
        Ok(())
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.params.canvas_size()
    }

    /// Stores a freshly decoded font and selects it.
    ///
    /// A later completion replaces an earlier one.
    pub fn install_custom_font(&mut self, font: LoadedFont) {
        tracing::info!(
            family = %font.family,
            source = %font.source_name,
            "custom font installed"
        );
        self.custom_font = Some(font);
        self.params.font_family = CUSTOM_FONT_ID.to_string();
        self.revision += 1;
    }

    pub fn custom_font(&self) -> Option<&LoadedFont> {
        self.custom_font.as_ref()
    }
}
