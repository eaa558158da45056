//! Mouse tracking and key bindings for the orbit camera and sky panel.
//!
//! [`MouseState`] accumulates winit mouse events between frames. Buttons map
//! to orbit gestures the usual way: left drag rotates, right drag (or a
//! modified left drag) pans, the wheel dollies.

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

/// Pixels of a high-resolution scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

fn button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        _ => None,
    }
}

/// What a drag does to the orbit camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitGesture {
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    position: Option<Vec2>,
    delta: Vec2,
    buttons: [bool; 3],
    scroll: f32,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The first move after entering the window sets the position without a delta.
    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let new_pos = Vec2::new(x as f32, y as f32);
        if let Some(previous) = self.position {
            self.delta += new_pos - previous;
        }
        self.position = Some(new_pos);
    }

    pub fn on_cursor_left(&mut self) {
        self.position = None;
    }

    pub fn on_button(&mut self, button: MouseButton, state: ElementState) {
        if let Some(idx) = button_index(button) {
            self.buttons[idx] = state == ElementState::Pressed;
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(_x, y) => self.scroll += y,
            MouseScrollDelta::PixelDelta(pos) => self.scroll += (pos.y / PIXELS_PER_LINE) as f32,
        }
    }

    /// Forget per-frame motion and scroll; button state persists.
    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
    }

    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    #[must_use]
    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        button_index(button).is_some_and(|idx| self.buttons[idx])
    }

    /// The gesture implied by the held buttons, if any.
    #[must_use]
    pub fn drag_gesture(&self, pan_modifier: bool) -> Option<OrbitGesture> {
        if self.is_button_pressed(MouseButton::Left) {
            Some(if pan_modifier {
                OrbitGesture::Pan
            } else {
                OrbitGesture::Rotate
            })
        } else if self.is_button_pressed(MouseButton::Right) {
            Some(OrbitGesture::Pan)
        } else {
            None
        }
    }
}

/// Keyboard actions on the sky panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelCommand {
    Toggle,
    SelectNext,
    SelectPrevious,
    /// Move the selected slider by this many steps.
    Nudge(i32),
    ReloadConfig,
}

/// Panel key bindings. Shift makes nudges ten times larger and reverses Tab.
pub fn panel_command(key: KeyCode, shift: bool) -> Option<PanelCommand> {
    let coarse = if shift { 10 } else { 1 };
    match key {
        KeyCode::KeyP | KeyCode::F1 => Some(PanelCommand::Toggle),
        KeyCode::Tab if shift => Some(PanelCommand::SelectPrevious),
        KeyCode::Tab | KeyCode::ArrowDown => Some(PanelCommand::SelectNext),
        KeyCode::ArrowUp => Some(PanelCommand::SelectPrevious),
        KeyCode::ArrowRight => Some(PanelCommand::Nudge(coarse)),
        KeyCode::ArrowLeft => Some(PanelCommand::Nudge(-coarse)),
        KeyCode::KeyR => Some(PanelCommand::ReloadConfig),
        _ => None,
    }
}
