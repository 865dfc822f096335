//! Keyboard bindings for the preview window.
//!
//! | keys                | effect                          |
//! |---------------------|---------------------------------|
//! | typing, Enter       | edit the text                   |
//! | Backspace           | delete the last character       |
//! | F1-F4               | apply a preset                  |
//! | Ctrl+P / Ctrl+J     | export PNG / JPG                |
//! | Ctrl+F              | swap canvas width and height    |
//! | Ctrl+K              | cycle canvas size               |
//! | Ctrl+= / Ctrl+-     | zoom in / out                   |
//! | Ctrl+Up / Ctrl+Down | font size                       |
//! | Ctrl+B / Ctrl+Shift+B | more / fewer bubbles          |

use params::{
    controls, ControlSpec, ParamError, ParamField, ParameterStore, PresetCatalog, CANVAS_OPTIONS,
};
use tracing::warn;
use winit::keyboard::{Key, ModifiersState, NamedKey};

use crate::export::ExportFormat;

#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    InsertText(String),
    Backspace,
    ApplyPreset(usize),
    Export(ExportFormat),
    ToggleFlip,
    CycleCanvas,
    Step { field: ParamField, steps: i32 },
}

/// What the window should do after an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Changed,
    Export(ExportFormat),
    Ignored,
}

pub fn action_for_key(key: &Key, modifiers: ModifiersState) -> Option<ControlAction> {
    if modifiers.control_key() || modifiers.super_key() {
        return shortcut(key, modifiers.shift_key());
    }
    match key {
        Key::Named(NamedKey::F1) => Some(ControlAction::ApplyPreset(0)),
        Key::Named(NamedKey::F2) => Some(ControlAction::ApplyPreset(1)),
        Key::Named(NamedKey::F3) => Some(ControlAction::ApplyPreset(2)),
        Key::Named(NamedKey::F4) => Some(ControlAction::ApplyPreset(3)),
        Key::Named(NamedKey::Backspace) => Some(ControlAction::Backspace),
        Key::Named(NamedKey::Enter) => Some(ControlAction::InsertText("\n".into())),
        Key::Named(NamedKey::Space) => Some(ControlAction::InsertText(" ".into())),
        Key::Character(text) if !text.chars().any(char::is_control) => {
            Some(ControlAction::InsertText(text.to_string()))
        }
        _ => None,
    }
}

fn shortcut(key: &Key, shift: bool) -> Option<ControlAction> {
    let step = |field, steps| Some(ControlAction::Step { field, steps });
    match key {
        Key::Named(NamedKey::ArrowUp) => step(ParamField::FontSize, 1),
        Key::Named(NamedKey::ArrowDown) => step(ParamField::FontSize, -1),
        Key::Character(text) => match text.to_ascii_lowercase().as_str() {
            "p" => Some(ControlAction::Export(ExportFormat::Png)),
            "j" => Some(ControlAction::Export(ExportFormat::Jpg)),
            "f" => Some(ControlAction::ToggleFlip),
            "k" => Some(ControlAction::CycleCanvas),
            "=" | "+" => step(ParamField::ZoomLevel, 1),
            "-" | "_" => step(ParamField::ZoomLevel, -1),
            "b" if shift => step(ParamField::NumBubbles, -1),
            "b" => step(ParamField::NumBubbles, 1),
            _ => None,
        },
        _ => None,
    }
}

pub fn apply_action(
    action: &ControlAction,
    store: &mut ParameterStore,
    catalog: &PresetCatalog,
) -> ActionOutcome {
    let result = match action {
        ControlAction::InsertText(text) => {
            let mut next = store.get().text_content.clone();
            next.push_str(text);
            store.set(ParamField::TextContent, next)
        }
        ControlAction::Backspace => {
            let mut next = store.get().text_content.clone();
            if next.pop().is_none() {
                return ActionOutcome::Ignored;
            }
            store.set(ParamField::TextContent, next)
        }
        ControlAction::ApplyPreset(index) => match catalog.by_index(*index) {
            Some(preset) => {
                store.apply_preset(preset);
                Ok(())
            }
            None => return ActionOutcome::Ignored,
        },
        ControlAction::Export(format) => return ActionOutcome::Export(*format),
        ControlAction::ToggleFlip => {
            let flipped = store.get().flip_dimensions;
            store.set(ParamField::FlipDimensions, !flipped)
        }
        ControlAction::CycleCanvas => {
            let params = store.get();
            let current = (params.canvas_width, params.canvas_height);
            let position = CANVAS_OPTIONS
                .iter()
                .position(|(dimensions, _)| (dimensions.width, dimensions.height) == current);
            let next = position.map_or(0, |index| (index + 1) % CANVAS_OPTIONS.len());
            store.apply_canvas_selector(&CANVAS_OPTIONS[next].0.to_string())
        }
        ControlAction::Step { field, steps } => step_field(store, *field, *steps),
    };

    match result {
        Ok(()) => ActionOutcome::Changed,
        Err(err) => {
            warn!(error = %err, ?action, "control action rejected");
            ActionOutcome::Ignored
        }
    }
}

fn step_field(store: &mut ParameterStore, field: ParamField, steps: i32) -> Result<(), ParamError> {
    let Some(spec) = controls::control_for(field) else {
        return Ok(());
    };
    let current = store
        .get()
        .value(field)
        .as_f64()
        .map_or(spec.min, |value| value as f32);
    let next = spec.step_value(current, steps);
    write_stepped(store, spec, next)
}

fn write_stepped(store: &mut ParameterStore, spec: &ControlSpec, value: f32) -> Result<(), ParamError> {
    match spec.field {
        ParamField::NumBubbles => store.set(spec.field, value.round() as i32),
        field => store.set(field, value),
    }
}

/// Window title showing the panel values.
pub fn window_title(store: &ParameterStore) -> String {
    format!("Bubble Shift · {}", controls::summarize(store.get()))
}

#[cfg(test)]
mod tests {
    use winit::keyboard::SmolStr;

    use super::*;

    fn character(text: &str) -> Key {
        Key::Character(SmolStr::new(text))
    }

    #[test]
    fn maps_plain_and_shortcut_keys() {
        let none = ModifiersState::empty();
        let ctrl = ModifiersState::CONTROL;
        let ctrl_shift = ModifiersState::CONTROL | ModifiersState::SHIFT;

        assert_eq!(
            action_for_key(&character("a"), none),
            Some(ControlAction::InsertText("a".into()))
        );
        assert_eq!(
            action_for_key(&Key::Named(NamedKey::F2), none),
            Some(ControlAction::ApplyPreset(1))
        );
        assert_eq!(
            action_for_key(&character("p"), ctrl),
            Some(ControlAction::Export(ExportFormat::Png))
        );
        assert_eq!(
            action_for_key(&character("B"), ctrl_shift),
            Some(ControlAction::Step {
                field: ParamField::NumBubbles,
                steps: -1
            })
        );
        assert_eq!(action_for_key(&character("q"), ctrl), None);
    }

    #[test]
    fn typing_edits_text() {
        let mut store = ParameterStore::default();
        let catalog = PresetCatalog::builtin();
        store.set(ParamField::TextContent, "HI").unwrap();

        apply_action(&ControlAction::InsertText("\n".into()), &mut store, &catalog);
        apply_action(&ControlAction::InsertText("YO".into()), &mut store, &catalog);
        apply_action(&ControlAction::Backspace, &mut store, &catalog);
        assert_eq!(store.get().text_content, "HI\nY");
    }

    #[test]
    fn backspace_on_empty_text_is_ignored() {
        let mut store = ParameterStore::default();
        store.set(ParamField::TextContent, "").unwrap();
        let revision = store.revision();
        let outcome = apply_action(&ControlAction::Backspace, &mut store, &PresetCatalog::builtin());
        assert_eq!(outcome, ActionOutcome::Ignored);
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn steps_clamp_to_control_range() {
        let mut store = ParameterStore::default();
        let catalog = PresetCatalog::builtin();
        store.set(ParamField::NumBubbles, 30_i32).unwrap();
        let up = ControlAction::Step {
            field: ParamField::NumBubbles,
            steps: 1,
        };
        apply_action(&up, &mut store, &catalog);
        assert_eq!(store.get().num_bubbles, 30);

        let zoom_out = ControlAction::Step {
            field: ParamField::ZoomLevel,
            steps: -1,
        };
        apply_action(&zoom_out, &mut store, &catalog);
        assert!((store.get().zoom_level - 0.95).abs() < 1e-4);
    }

    #[test]
    fn presets_flip_and_canvas_cycle() {
        let mut store = ParameterStore::default();
        let catalog = PresetCatalog::builtin();

        apply_action(&ControlAction::ApplyPreset(3), &mut store, &catalog);
        assert_eq!(store.get().text_content, "GREETINGS,\nWORLD");
        assert_eq!(
            apply_action(&ControlAction::ApplyPreset(9), &mut store, &catalog),
            ActionOutcome::Ignored
        );

        apply_action(&ControlAction::CycleCanvas, &mut store, &catalog);
        assert_eq!(store.canvas_size(), (1080, 1350));
        apply_action(&ControlAction::ToggleFlip, &mut store, &catalog);
        assert_eq!(store.canvas_size(), (1350, 1080));
    }

    #[test]
    fn export_is_deferred_to_window() {
        let mut store = ParameterStore::default();
        let outcome = apply_action(
            &ControlAction::Export(ExportFormat::Jpg),
            &mut store,
            &PresetCatalog::builtin(),
        );
        assert_eq!(outcome, ActionOutcome::Export(ExportFormat::Jpg));
    }
}
