// Pointer and keyboard handling for the three demos.
//
// Controllers turn `PointerEvent`s into camera motion directly and into
// simulation changes through each demo's own entry points (the physics
// playground only ever sees queued `Command`s). Positions are window pixels
// with the origin top-left; wheel deltas are browser-style, positive when
// scrolling toward the user.

use glam::{Vec2, Vec3};

use super::camera::{CameraView, OrbitCamera, screen_to_ndc};
use super::commands::{Command, Playground};
use super::components::Tint;
use super::config::PhysicsConfig;
use super::flocking::FlockingEngine;
use super::physics::BodyDesc;
use super::showcase::SunLight;

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerKind {
    Down(PointerButton),
    Up(PointerButton),
    Move,
    Wheel { delta: f32 },
    /// Pointer left the window.
    Leave,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub kind: PointerKind,
    pub modifiers: Modifiers,
    /// Seconds since the viewer started.
    pub timestamp: f64,
}

impl PointerEvent {
    pub fn new(position: Vec2, kind: PointerKind) -> Self {
        Self { position, kind, modifiers: Modifiers::default(), timestamp: 0.0 }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Escape,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, modifiers: Modifiers::default() }
    }
}

/// Window size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width as f32, height: height as f32 }
    }

    pub fn ndc(&self, position: Vec2) -> Vec2 {
        screen_to_ndc(position.x, position.y, self.width, self.height)
    }
}

// ============================================================================
// PHYSICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Orbiting { last: Vec2 },
    Dragging,
    Cutting,
    MovingSun { last: Vec2 },
}

/// Height new bodies are dropped from.
const DROP_HEIGHT: f32 = 8.0;
/// X offsets successive drops cycle through, so they do not stack.
const DROP_LANES: [f32; 5] = [0.0, -1.5, 1.5, -3.0, 3.0];

/// Left drag on a body drags it, on empty space orbits. Right click toggles
/// cutting mode, in which left drag draws a cut. Shift+drag moves the sun.
/// `S`, `B` and `J` drop a sphere, a box or a jelly bean.
pub struct PhysicsController {
    gesture: Gesture,
    /// Mirrors the playground's mode, ahead of the queued toggle.
    cutting: bool,
    drops: usize,
}

impl Default for PhysicsController {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsController {
    pub fn new() -> Self {
        Self { gesture: Gesture::Idle, cutting: false, drops: 0 }
    }

    pub fn cutting(&self) -> bool {
        self.cutting
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn pointer(
        &mut self,
        event: &PointerEvent,
        viewport: Viewport,
        camera: &mut OrbitCamera,
        playground: &mut Playground,
        sun: &mut SunLight,
    ) {
        let ndc = viewport.ndc(event.position);
        match event.kind {
            PointerKind::Down(PointerButton::Primary) => {
                self.gesture = if event.modifiers.shift {
                    Gesture::MovingSun { last: event.position }
                } else if self.cutting {
                    playground.push(Command::BeginCut { ndc });
                    Gesture::Cutting
                } else if let Some(body) = playground.pick(camera, ndc) {
                    playground.push(Command::BeginDrag { body, ndc });
                    Gesture::Dragging
                } else {
                    Gesture::Orbiting { last: event.position }
                };
            }
            PointerKind::Down(PointerButton::Secondary) => {
                if self.gesture == Gesture::Cutting {
                    playground.push(Command::CancelCut);
                    self.gesture = Gesture::Idle;
                }
                self.cutting = !self.cutting;
                playground.push(Command::ToggleCutMode);
            }
            PointerKind::Move => match self.gesture {
                Gesture::Orbiting { last } => {
                    let delta = event.position - last;
                    camera.orbit(delta.x, delta.y);
                    self.gesture = Gesture::Orbiting { last: event.position };
                }
                Gesture::MovingSun { last } => {
                    let delta = event.position - last;
                    sun.nudge(delta.x, delta.y);
                    self.gesture = Gesture::MovingSun { last: event.position };
                }
                Gesture::Dragging => playground.push(Command::MoveDrag { ndc }),
                Gesture::Cutting => playground.push(Command::ExtendCutPath { ndc }),
                Gesture::Idle => {}
            },
            PointerKind::Up(PointerButton::Primary) => {
                match self.gesture {
                    Gesture::Dragging => playground.push(Command::EndDrag),
                    Gesture::Cutting => playground.push(Command::ResolveCut),
                    _ => {}
                }
                self.gesture = Gesture::Idle;
            }
            PointerKind::Leave => {
                match self.gesture {
                    Gesture::Dragging => playground.push(Command::EndDrag),
                    Gesture::Cutting => playground.push(Command::CancelCut),
                    _ => {}
                }
                self.gesture = Gesture::Idle;
            }
            PointerKind::Wheel { delta } => camera.zoom(delta),
            PointerKind::Down(_) | PointerKind::Up(_) => {}
        }
    }

    pub fn key(&mut self, key: &KeyPress, playground: &mut Playground) {
        match key.key {
            Key::Space => {
                if self.gesture == Gesture::Dragging {
                    self.gesture = Gesture::Idle;
                }
                playground.push(Command::Reset);
            }
            Key::Escape => {
                if self.gesture == Gesture::Cutting {
                    self.gesture = Gesture::Idle;
                }
                playground.push(Command::CancelCut);
            }
            Key::Char(c) => {
                let Some(desc) = drop_preset(c.to_ascii_lowercase(), playground.world().config()) else {
                    return;
                };
                let lane = DROP_LANES[self.drops % DROP_LANES.len()];
                self.drops = self.drops.wrapping_add(1);
                playground.push(Command::Spawn(desc.at(Vec3::new(lane, DROP_HEIGHT, 0.0))));
            }
            Key::F3 => {}
        }
    }
}

fn drop_preset(key: char, config: &PhysicsConfig) -> Option<BodyDesc> {
    let desc = match key {
        's' => BodyDesc::sphere(1.0, config).with_tint(Tint::hex(0xff4444)),
        'b' => BodyDesc::cube(1.5, config).with_tint(Tint::hex(0x44ff44)),
        'j' => BodyDesc::jelly_bean(config),
        _ => return None,
    };
    Some(desc)
}

// ============================================================================
// BOIDS
// ============================================================================

/// Drag orbits; otherwise the flock chases the point under the pointer.
#[derive(Default)]
pub struct BoidsController {
    orbiting: Option<Vec2>,
}

impl BoidsController {
    pub fn pointer(
        &mut self,
        event: &PointerEvent,
        viewport: Viewport,
        camera: &mut OrbitCamera,
        engine: &mut FlockingEngine,
    ) {
        match event.kind {
            PointerKind::Down(PointerButton::Primary) => {
                self.orbiting = Some(event.position);
                engine.set_attractor(None);
            }
            PointerKind::Up(PointerButton::Primary) => self.orbiting = None,
            PointerKind::Move => match self.orbiting {
                Some(last) => {
                    let delta = event.position - last;
                    camera.orbit(delta.x, delta.y);
                    self.orbiting = Some(event.position);
                }
                None => {
                    let ray = camera.unproject_ray(viewport.ndc(event.position));
                    let distance = engine.config().attraction_distance;
                    engine.set_attractor(Some(ray.at(distance)));
                }
            },
            PointerKind::Leave => {
                self.orbiting = None;
                engine.set_attractor(None);
            }
            _ => {}
        }
    }
}

// ============================================================================
// ISLANDS
// ============================================================================

/// Drag orbits and the wheel zooms (perspective only); `T` flips top-down,
/// `R` asks for a new island.
#[derive(Default)]
pub struct IslandsController {
    orbiting: Option<Vec2>,
}

impl IslandsController {
    pub fn pointer(&mut self, event: &PointerEvent, camera: &mut OrbitCamera) {
        match event.kind {
            PointerKind::Down(PointerButton::Primary) => self.orbiting = Some(event.position),
            PointerKind::Up(PointerButton::Primary) | PointerKind::Leave => self.orbiting = None,
            PointerKind::Move => {
                if let Some(last) = self.orbiting {
                    let delta = event.position - last;
                    camera.orbit(delta.x, delta.y);
                    self.orbiting = Some(event.position);
                }
            }
            PointerKind::Wheel { delta } => camera.zoom(delta),
            _ => {}
        }
    }

    /// Returns true when a new island should be generated.
    pub fn key(&mut self, key: &KeyPress, camera: &mut OrbitCamera, map_size: f32) -> bool {
        match key.key {
            Key::Char('t') | Key::Char('T') => {
                let top_down = if camera.is_top_down() { None } else { Some(map_size) };
                camera.set_top_down(top_down);
                log::debug!("island view top-down: {}", camera.is_top_down());
                false
            }
            Key::Char('r') | Key::Char('R') => true,
            _ => false,
        }
    }
}
