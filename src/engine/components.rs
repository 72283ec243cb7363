// ECS components for physics bodies.
// A body is an entity carrying Transform + Velocity + RigidBody + Collider +
// Tint; SoftBody and Dragged are attached only when relevant.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};

use super::shapes::Shape;

/// Position and orientation of a body in world space.
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    /// World-space point for a body-local offset.
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

/// Linear (units/s) and angular (rad/s, world axes) velocity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear, angular: Vec3::ZERO }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Rigid,
    /// Rigid dynamics plus a fake wobble of its parts.
    Soft,
    /// Never moves, never receives impulses.
    Static,
}

/// Mass and surface response of a body.
#[derive(Component, Debug, Clone, Copy)]
pub struct RigidBody {
    pub kind: BodyKind,
    pub mass: f32,
    /// Fraction of normal velocity kept after a bounce.
    pub restitution: f32,
    pub friction: f32,
    /// Per-tick linear velocity factor (< 1).
    pub air_friction: f32,
    /// Per-tick angular velocity factor (< 1).
    pub angular_damping: f32,
    /// Set on bodies produced by a cut.
    pub is_cut_piece: bool,
}

impl RigidBody {
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    /// 0 for static bodies so they absorb no impulse.
    pub fn inverse_mass(&self) -> f32 {
        if self.is_static() || self.mass <= 0.0 {
            0.0
        } else {
            1.0 / self.mass
        }
    }
}

/// Collision and cutting geometry.
#[derive(Component, Debug, Clone)]
pub struct Collider {
    pub shape: Shape,
}

/// Deformation state of a soft body. One scale per compound part.
#[derive(Component, Debug, Clone, Default)]
pub struct SoftBody {
    pub deformation: f32,
    pub part_scales: Vec<f32>,
}

impl SoftBody {
    pub fn for_parts(count: usize) -> Self {
        Self {
            deformation: 0.0,
            part_scales: vec![1.0; count],
        }
    }
}

/// Present while the pointer is dragging the body toward `target`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dragged {
    pub target: Vec3,
}

/// Monotonic spawn counter; entity ids are recycled, this is not.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpawnOrder(pub u64);

/// RGB render colour.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Tint {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From a 0xRRGGBB literal.
    pub fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as f32 / 255.0,
            g: ((value >> 8) & 0xff) as f32 / 255.0,
            b: (value & 0xff) as f32 / 255.0,
        }
    }

    /// HSL with all channels in [0, 1]; hue wraps.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s == 0.0 {
            return Self::rgb(l, l, l);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let h = h.rem_euclid(1.0);
        Self {
            r: hue_to_rgb(p, q, h + 1.0 / 3.0),
            g: hue_to_rgb(p, q, h),
            b: hue_to_rgb(p, q, h - 1.0 / 3.0),
        }
    }

    pub fn to_array(self, alpha: f32) -> [f32; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

fn hue_to_rgb(p: f32, q: f32, t: f32) -> f32 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Tint, b: Tint) -> bool {
        (a.r - b.r).abs() < 1e-4 && (a.g - b.g).abs() < 1e-4 && (a.b - b.b).abs() < 1e-4
    }

    #[test]
    fn test_hex_channels() {
        assert_eq!(Tint::hex(0xff0000), Tint::rgb(1.0, 0.0, 0.0));
        assert!(close(Tint::hex(0x44ff44), Tint::rgb(0.2667, 1.0, 0.2667)));
    }

    #[test]
    fn test_hsl_primaries_and_grey() {
        assert!(close(Tint::from_hsl(0.0, 1.0, 0.5), Tint::rgb(1.0, 0.0, 0.0)));
        assert!(close(Tint::from_hsl(1.0 / 3.0, 1.0, 0.5), Tint::rgb(0.0, 1.0, 0.0)));
        assert!(close(Tint::from_hsl(0.0, 0.0, 0.9), Tint::rgb(0.9, 0.9, 0.9)));
    }

    #[test]
    fn test_static_bodies_have_no_inverse_mass() {
        let body = RigidBody {
            kind: BodyKind::Static,
            mass: 10.0,
            restitution: 0.5,
            friction: 0.5,
            air_friction: 1.0,
            angular_damping: 1.0,
            is_cut_piece: false,
        };
        assert_eq!(body.inverse_mass(), 0.0);
        let dynamic = RigidBody { kind: BodyKind::Rigid, ..body };
        assert!((dynamic.inverse_mass() - 0.1).abs() < 1e-6);
    }
}
