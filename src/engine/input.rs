// winit → demo input translation
// Tracks cursor position and modifiers so every pointer event carries them.

use std::time::Instant;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use super::controller::{Key, KeyPress, Modifiers, PointerButton, PointerEvent, PointerKind};

/// Browser-style wheel units per scrolled line.
const PIXELS_PER_LINE: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyPress),
}

pub struct InputState {
    started: Instant,
    pub cursor: Vec2,
    modifiers: Modifiers,
    pub window_size: (u32, u32),
}

impl InputState {
    pub fn new(window_size: (u32, u32)) -> Self {
        Self {
            started: Instant::now(),
            cursor: Vec2::ZERO,
            modifiers: Modifiers::default(),
            window_size,
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Feed a winit event; returns the demo-level event it maps to, if any.
    pub fn process_event(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(state) => {
                self.modifiers = modifiers_from(state.state());
                None
            }
            WindowEvent::Resized(size) => {
                self.window_size = (size.width, size.height);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(self.pointer(PointerKind::Move))
            }
            WindowEvent::CursorLeft { .. } => Some(self.pointer(PointerKind::Leave)),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => PointerButton::Primary,
                    MouseButton::Right => PointerButton::Secondary,
                    MouseButton::Middle => PointerButton::Middle,
                    _ => return None,
                };
                let kind = match state {
                    ElementState::Pressed => PointerKind::Down(button),
                    ElementState::Released => PointerKind::Up(button),
                };
                Some(self.pointer(kind))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling away from the user as positive.
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                Some(self.pointer(PointerKind::Wheel { delta }))
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed && !event.repeat => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return None;
                };
                key_from(code).map(|key| InputEvent::Key(KeyPress { key, modifiers: self.modifiers }))
            }
            _ => None,
        }
    }

    fn pointer(&self, kind: PointerKind) -> InputEvent {
        InputEvent::Pointer(PointerEvent {
            position: self.cursor,
            kind,
            modifiers: self.modifiers,
            timestamp: self.started.elapsed().as_secs_f64(),
        })
    }
}

fn modifiers_from(state: ModifiersState) -> Modifiers {
    Modifiers {
        shift: state.shift_key(),
        ctrl: state.control_key(),
        alt: state.alt_key(),
    }
}

fn key_from(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Space => Key::Space,
        KeyCode::Escape => Key::Escape,
        KeyCode::F3 => Key::F3,
        KeyCode::Digit1 => Key::Char('1'),
        KeyCode::Digit2 => Key::Char('2'),
        KeyCode::Digit3 => Key::Char('3'),
        KeyCode::KeyB => Key::Char('b'),
        KeyCode::KeyJ => Key::Char('j'),
        KeyCode::KeyP => Key::Char('p'),
        KeyCode::KeyR => Key::Char('r'),
        KeyCode::KeyS => Key::Char('s'),
        KeyCode::KeyT => Key::Char('t'),
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes_map_to_demo_keys() {
        assert_eq!(key_from(KeyCode::KeyT), Some(Key::Char('t')));
        assert_eq!(key_from(KeyCode::Digit2), Some(Key::Char('2')));
        assert_eq!(key_from(KeyCode::F3), Some(Key::F3));
        assert_eq!(key_from(KeyCode::KeyJ), Some(Key::Char('j')));
        assert_eq!(key_from(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_modifiers_follow_winit_state() {
        let mods = modifiers_from(ModifiersState::SHIFT | ModifiersState::ALT);
        assert!(mods.shift && mods.alt && !mods.ctrl);
        assert_eq!(modifiers_from(ModifiersState::empty()), Modifiers::default());
    }
}
