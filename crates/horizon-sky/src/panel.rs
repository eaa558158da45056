//! Debug panel: named numeric sliders bound to [`SkyParameters`] fields.
//!
//! The panel holds no parameter state of its own. Edits go through
//! [`DebugPanel::set`] or [`DebugPanel::nudge`], which clamp and snap the value
//! and report whether anything changed; the caller then re-applies the model.

use std::fmt::Write as _;

use crate::params::{SkyField, SkyParameters};

/// One slider: a field with its range and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderControl {
    pub field: SkyField,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderControl {
    pub const fn new(field: SkyField, min: f32, max: f32, step: f32) -> Self {
        Self {
            field,
            min,
            max,
            step,
        }
    }

    /// Snap `value` to the step grid and clamp it into `[min, max]`.
    pub fn constrain(&self, value: f32) -> f32 {
        let snapped = if self.step > 0.0 {
            (value / self.step).round() * self.step
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }
}

/// Slider bindings for every sky parameter, in display order.
const SKY_CONTROLS: [SliderControl; 7] = [
    SliderControl::new(SkyField::Turbidity, 0.0, 2.0, 0.1),
    SliderControl::new(SkyField::Rayleigh, 0.0, 4.0, 0.001),
    SliderControl::new(SkyField::MieCoefficient, 0.0, 0.1, 0.001),
    SliderControl::new(SkyField::MieDirectionalG, 0.0, 1.0, 0.001),
    SliderControl::new(SkyField::Elevation, 0.0, 90.0, 0.1),
    SliderControl::new(SkyField::Azimuth, -180.0, 180.0, 0.1),
    SliderControl::new(SkyField::Exposure, 0.0, 1.0, 0.0001),
];

/// A set of sliders with a visibility flag and a keyboard selection.
#[derive(Debug, Clone)]
pub struct DebugPanel {
    controls: Vec<SliderControl>,
    visible: bool,
    selected: usize,
}

impl DebugPanel {
    /// The sky parameter panel.
    pub fn sky_controls(visible: bool) -> Self {
        Self {
            controls: SKY_CONTROLS.to_vec(),
            visible,
            selected: 0,
        }
    }

    pub fn controls(&self) -> &[SliderControl] {
        &self.controls
    }

    pub fn control(&self, field: SkyField) -> Option<&SliderControl> {
        self.controls.iter().find(|c| c.field == field)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    /// Flip visibility; returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    /// Field under the keyboard cursor.
    pub fn selected(&self) -> SkyField {
        self.controls[self.selected].field
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % self.controls.len();
    }

    pub fn select_previous(&mut self) {
        self.selected = (self.selected + self.controls.len() - 1) % self.controls.len();
    }

    /// Set `field` through its slider. Returns the stored value when it
    /// differs from the previous one.
    pub fn set(&self, params: &mut SkyParameters, field: SkyField, value: f32) -> Option<f32> {
        let control = self.control(field)?;
        let value = control.constrain(value);
        if (params.get(field) - value).abs() <= control.step * 1e-3 {
            return None;
        }
        params.set(field, value);
        Some(value)
    }

    /// Move the selected slider by `steps` increments. Ignored while hidden.
    pub fn nudge(&self, params: &mut SkyParameters, steps: i32) -> Option<(SkyField, f32)> {
        if !self.visible {
            return None;
        }
        let control = self.controls[self.selected];
        let target = params.get(control.field) + control.step * steps as f32;
        self.set(params, control.field, target)
            .map(|value| (control.field, value))
    }

    /// One line per slider, with the selected one marked.
    pub fn describe(&self, params: &SkyParameters) -> String {
        let mut out = String::new();
        for (i, control) in self.controls.iter().enumerate() {
            let marker = if i == self.selected { '>' } else { ' ' };
            let _ = writeln!(
                out,
                "{marker} {:<16} {:>10.4}  [{}, {}]",
                control.field.name(),
                params.get(control.field),
                control.min,
                control.max
            );
        }
        out
    }
}
