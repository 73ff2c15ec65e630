//! Translates winit pointer events into the interaction controller.

use glam::Vec2;
use starmap::AnimationState;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// Pixel-delta scrolls are reported in pixels; one wheel notch is ~120.
const PIXELS_PER_LINE: f32 = 120.0;

/// Pointer state that winit does not carry on every event.
#[derive(Debug, Default)]
pub struct PointerInput {
    cursor_px: Option<Vec2>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last known cursor position, physical pixels.
    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor_px
    }

    /// Forwards one window event. Mode gating lives in the controller.
    pub fn handle_event(&mut self, event: &WindowEvent, state: &mut AnimationState) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: pressed,
                ..
            } => match pressed {
                ElementState::Pressed => {
                    if let Some(c) = self.cursor_px {
                        state.pointer_down(c);
                    }
                }
                ElementState::Released => state.pointer_up(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                let c = Vec2::new(position.x as f32, position.y as f32);
                self.cursor_px = Some(c);
                state.pointer_move(c);
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor_px = None;
                state.pointer_leave();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
                state.wheel(lines, self.cursor_px.unwrap_or(Vec2::ZERO));
            }
            WindowEvent::TouchpadMagnify { delta, .. } => {
                let centre = self.cursor_px.unwrap_or(Vec2::ZERO);
                state.pinch(1.0 + *delta as f32, centre);
            }
            _ => {}
        }
    }
}
