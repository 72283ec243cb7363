// Cutting tool: capture a path across the screen, find the bodies it crosses,
// and split each one in two along a plane through the stroke.
//
// Phases: Idle → Drawing (pointer down) → resolve on pointer up → Idle.
// Splitting swaps the parent for its children in a single `replace`, so no
// tick ever sees both.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use rand::Rng;

use super::camera::CameraView;
use super::components::{BodyKind, Tint};
use super::config::{CutConfig, PhysicsConfig};
use super::math::{Plane, distance_to_polyline, random_spread};
use super::physics::{BodyDesc, BodyId, BodyView, PhysicsWorld};
use super::shapes::{Part, Shape};

const FRAGMENT_RADIUS: std::ops::Range<f32> = 0.08..0.18;
const FRAGMENT_RING: std::ops::Range<f32> = 0.3..0.6;
const FRAGMENT_SPREAD_Y: f32 = 0.4;
const FRAGMENT_BURST: f32 = 3.0;
const FRAGMENT_LIFT: std::ops::Range<f32> = 1.0..3.0;
const FRAGMENT_TINT: u32 = 0xffaa44;
/// Jelly halves: main lobe and end lobe relative to the parent's largest part.
const HALF_BODY_RATIO: f32 = 0.75;
const HALF_LOBE_RATIO: f32 = 0.5;

// ============================================================================
// PATH + TOOL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutPhase {
    Idle,
    Drawing,
}

/// World-space points sampled along the stroke.
#[derive(Debug, Clone, Default)]
pub struct CutPath {
    points: Vec<Vec3>,
}

impl CutPath {
    /// Append `point` unless it is within `min_spacing` of the last one.
    pub fn push(&mut self, point: Vec3, min_spacing: f32) -> bool {
        if let Some(last) = self.points.last() {
            if last.distance(point) <= min_spacing {
                return false;
            }
        }
        self.points.push(point);
        true
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Unit start→end direction, or zero for paths shorter than two points.
    pub fn direction(&self) -> Vec3 {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() >= 2 => (*b - *a).normalize_or_zero(),
            _ => Vec3::ZERO,
        }
    }
}

/// A body selected by a stroke and the point where it was crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutTarget {
    pub body: BodyId,
    pub point: Vec3,
}

/// Bodies produced by one cut.
#[derive(Debug, Clone, PartialEq)]
pub struct CutOutcome {
    pub parent: BodyId,
    pub children: Vec<BodyId>,
    pub fragments: Vec<BodyId>,
}

pub struct CutTool {
    config: CutConfig,
    phase: CutPhase,
    path: CutPath,
}

impl CutTool {
    pub fn new(config: CutConfig) -> Self {
        Self { config, phase: CutPhase::Idle, path: CutPath::default() }
    }

    pub fn phase(&self) -> CutPhase {
        self.phase
    }

    pub fn path(&self) -> &CutPath {
        &self.path
    }

    pub fn is_drawing(&self) -> bool {
        self.phase == CutPhase::Drawing
    }

    /// Start a stroke at `ndc`, discarding any previous path.
    pub fn begin(&mut self, world: &mut PhysicsWorld, camera: &dyn CameraView, ndc: Vec2) {
        self.path.clear();
        self.phase = CutPhase::Drawing;
        let point = self.pointer_point(world, camera, ndc);
        self.path.push(point, self.config.min_point_spacing);
    }

    /// Add the point under `ndc` to the stroke. Returns whether it was kept.
    pub fn extend(&mut self, world: &mut PhysicsWorld, camera: &dyn CameraView, ndc: Vec2) -> bool {
        if self.phase != CutPhase::Drawing {
            return false;
        }
        let point = self.pointer_point(world, camera, ndc);
        self.path.push(point, self.config.min_point_spacing)
    }

    /// Drop the stroke without touching any body.
    pub fn cancel(&mut self) {
        if self.phase == CutPhase::Drawing {
            log::debug!("cut cancelled with {} points", self.path.len());
        }
        self.path.clear();
        self.phase = CutPhase::Idle;
    }

    /// Finish the stroke and cut everything it crossed.
    pub fn resolve(&mut self, world: &mut PhysicsWorld, camera: &dyn CameraView) -> Vec<CutOutcome> {
        if self.phase != CutPhase::Drawing || self.path.len() < 2 {
            self.cancel();
            return Vec::new();
        }

        let targets = find_cut_targets(world, camera, &self.path, self.config.path_distance_threshold);
        let outcomes: Vec<CutOutcome> = targets
            .iter()
            .filter_map(|target| {
                let plane = cutting_plane(&self.path, camera, target.point);
                cut_body(world, target.body, &plane, &self.config)
            })
            .collect();

        if !outcomes.is_empty() {
            log::info!("cut stroke of {} points split {} bodies", self.path.len(), outcomes.len());
        }
        self.path.clear();
        self.phase = CutPhase::Idle;
        outcomes
    }

    // First body hit under the pointer, else a point at a fixed depth.
    fn pointer_point(&self, world: &mut PhysicsWorld, camera: &dyn CameraView, ndc: Vec2) -> Vec3 {
        let ray = camera.unproject_ray(ndc);
        world
            .raycast(&ray)
            .first()
            .map(|hit| hit.point)
            .unwrap_or_else(|| ray.at(self.config.projection_distance))
    }
}

// ============================================================================
// TARGET SELECTION
// ============================================================================

/// Bodies crossed by `path`, each with the hit point closest to the path.
///
/// Every path point is re-projected to the screen and cast through the
/// scene; a body qualifies when one of its hits lies within `threshold` of
/// the path polyline.
pub fn find_cut_targets(
    world: &mut PhysicsWorld,
    camera: &dyn CameraView,
    path: &CutPath,
    threshold: f32,
) -> Vec<CutTarget> {
    let rays: Vec<_> = path
        .points()
        .iter()
        .map(|p| camera.unproject_ray(camera.project(*p).truncate()))
        .collect();

    let mut processed = HashSet::new();
    let mut targets = Vec::new();
    for ray in &rays {
        for hit in world.raycast(ray) {
            if processed.contains(&hit.body) {
                continue;
            }
            if distance_to_polyline(hit.point, path.points()) >= threshold {
                continue;
            }
            processed.insert(hit.body);

            let best = rays
                .iter()
                .filter_map(|r| world.raycast_body(hit.body, r))
                .map(|h| (h.point, distance_to_polyline(h.point, path.points())))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((point, _)) = best {
                targets.push(CutTarget { body: hit.body, point });
            }
        }
    }
    targets
}

/// Plane through `point` whose normal is the stroke direction crossed with
/// the view direction. Falls back to the view direction for degenerate strokes.
pub fn cutting_plane(path: &CutPath, camera: &dyn CameraView, point: Vec3) -> Plane {
    let view = camera.view_direction();
    let normal = path
        .direction()
        .cross(view)
        .try_normalize()
        .unwrap_or(view);
    Plane::from_normal_and_point(normal, point)
}

// ============================================================================
// SPLITTING
// ============================================================================

/// Replace body `id` with two halves split by `plane` (plus fragments for
/// compound bodies). Static, missing and degenerate bodies are left alone.
pub fn cut_body(
    world: &mut PhysicsWorld,
    id: BodyId,
    plane: &Plane,
    config: &CutConfig,
) -> Option<CutOutcome> {
    let parent = world.body(id)?;
    if parent.body.kind == BodyKind::Static || parent.shape.is_degenerate() {
        log::debug!("skipping cut of {:?}", id);
        return None;
    }

    let physics = world.config().clone();
    let normal = plane.normal;
    let (children, fragments) = {
        let rng = world.rng_mut();
        match &parent.shape {
            Shape::Sphere { radius } => (sphere_halves(&parent, *radius, normal, config, rng), Vec::new()),
            Shape::Box { size } => (box_halves(&parent, *size, normal, config, rng), Vec::new()),
            Shape::Compound { parts } => (
                compound_halves(&parent, parts, normal, config, &physics, rng),
                fragments(&parent, config, &physics, rng),
            ),
        }
    };

    let child_count = children.len();
    let mut ids = world.replace(id, children.into_iter().chain(fragments).collect())?;
    let fragment_ids = ids.split_off(child_count);
    log::info!(
        "cut {:?} into {} pieces and {} fragments",
        id,
        ids.len(),
        fragment_ids.len()
    );
    Some(CutOutcome { parent: id, children: ids, fragments: fragment_ids })
}

// Shared child template: parent's pose, surface response and colour.
fn child_of(parent: &BodyView, shape: Shape, mass: f32) -> BodyDesc {
    BodyDesc {
        shape,
        body: parent.body,
        transform: parent.transform,
        velocity: parent.velocity,
        tint: parent.tint,
    }
    .with_mass(mass)
    .as_cut_piece()
}

fn sphere_halves<R: Rng + ?Sized>(
    parent: &BodyView,
    radius: f32,
    normal: Vec3,
    config: &CutConfig,
    rng: &mut R,
) -> Vec<BodyDesc> {
    let position = parent.transform.position;
    [1.0f32, -1.0]
        .into_iter()
        .map(|side| {
            child_of(
                parent,
                Shape::Sphere { radius: radius * config.sphere_radius_ratio },
                parent.body.mass * config.sphere_mass_fraction,
            )
            .at(position + normal * radius * config.sphere_offset_ratio * side)
            .with_velocity(
                parent.velocity.linear + normal * config.sphere_separation_speed * side,
                parent.velocity.angular + random_spread(rng, config.sphere_spin),
            )
        })
        .collect()
}

fn box_halves<R: Rng + ?Sized>(
    parent: &BodyView,
    size: Vec3,
    normal: Vec3,
    config: &CutConfig,
    rng: &mut R,
) -> Vec<BodyDesc> {
    // Split across the local axis the plane normal is most aligned with.
    let local = parent.transform.rotation.inverse() * normal;
    let abs = local.abs();
    let axis = if abs.x > abs.y && abs.x > abs.z {
        Vec3::X
    } else if abs.y > abs.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let extent = size.dot(axis);
    let child_size = size - axis * extent * (1.0 - config.box_extent_ratio);
    let world_axis = parent.transform.rotation * axis;

    [-1.0f32, 1.0]
        .into_iter()
        .map(|side| {
            child_of(
                parent,
                Shape::Box { size: child_size },
                parent.body.mass * config.box_mass_fraction,
            )
            .at(parent.transform.position + world_axis * extent * config.box_offset_ratio * side)
            .with_velocity(
                parent.velocity.linear + world_axis * config.box_separation_speed * side,
                parent.velocity.angular + random_spread(rng, config.box_spin),
            )
        })
        .collect()
}

fn compound_halves<R: Rng + ?Sized>(
    parent: &BodyView,
    parts: &[Part],
    normal: Vec3,
    config: &CutConfig,
    physics: &PhysicsConfig,
    rng: &mut R,
) -> Vec<BodyDesc> {
    let largest = parts.iter().map(|p| p.radius).fold(0.0, f32::max);
    let body_radius = largest * HALF_BODY_RATIO * config.compound_scale;
    let lobe_radius = largest * HALF_LOBE_RATIO * config.compound_scale;

    [1.0f32, -1.0]
        .into_iter()
        .map(|side| {
            let shape = Shape::Compound {
                parts: vec![
                    Part { offset: Vec3::ZERO, radius: body_radius },
                    Part { offset: Vec3::new(0.0, side * lobe_radius, 0.0), radius: lobe_radius },
                ],
            };
            BodyDesc::soft(shape, parent.body.mass * config.compound_mass_fraction, physics)
                .with_kind(parent.body.kind)
                .with_tint(parent.tint)
                .with_rotation(parent.transform.rotation)
                .at(parent.transform.position + normal * config.compound_offset * side)
                .with_velocity(
                    parent.velocity.linear + normal * config.compound_separation_speed * side,
                    random_spread(rng, config.compound_spin),
                )
                .as_cut_piece()
        })
        .collect()
}

fn fragments<R: Rng + ?Sized>(
    parent: &BodyView,
    config: &CutConfig,
    physics: &PhysicsConfig,
    rng: &mut R,
) -> Vec<BodyDesc> {
    let count = rng.gen_range(config.min_fragments..=config.max_fragments);
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            let ring = rng.gen_range(FRAGMENT_RING);
            let offset = Vec3::new(
                cos * ring,
                rng.gen_range(-FRAGMENT_SPREAD_Y..=FRAGMENT_SPREAD_Y),
                sin * ring,
            );
            let burst = Vec3::new(cos * FRAGMENT_BURST, rng.gen_range(FRAGMENT_LIFT), sin * FRAGMENT_BURST);
            BodyDesc::sphere(rng.gen_range(FRAGMENT_RADIUS), physics)
                .with_tint(Tint::hex(FRAGMENT_TINT))
                .at(parent.transform.position + offset)
                .with_velocity(
                    parent.velocity.linear + burst,
                    random_spread(rng, config.fragment_spin),
                )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::camera::OrbitCamera;
    use crate::engine::config::{CameraConfig, PhysicsConfig};

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&PhysicsConfig::default(), 7)
    }

    fn plane_x(point: Vec3) -> Plane {
        Plane::from_normal_and_point(Vec3::X, point)
    }

    #[test]
    fn test_path_drops_close_points() {
        let mut path = CutPath::default();
        assert!(path.push(Vec3::ZERO, 0.1));
        assert!(!path.push(Vec3::new(0.05, 0.0, 0.0), 0.1));
        assert!(path.push(Vec3::new(0.5, 0.0, 0.0), 0.1));
        assert_eq!(path.len(), 2);
        assert_eq!(path.direction(), Vec3::X);
    }

    #[test]
    fn test_sphere_cut_halves() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::new(0.0, 3.0, 0.0), 1.0, Tint::hex(0xff4444));
        w.set_velocity(id, Vec3::new(0.0, 0.0, 2.0));
        let parent_mass = w.body(id).unwrap().body.mass;

        let outcome = cut_body(&mut w, id, &plane_x(Vec3::new(0.0, 3.0, 0.0)), &CutConfig::default()).unwrap();

        assert!(!w.contains(id));
        assert_eq!(outcome.children.len(), 2);
        assert!(outcome.fragments.is_empty());
        let a = w.body(outcome.children[0]).unwrap();
        let b = w.body(outcome.children[1]).unwrap();
        assert!(matches!(a.shape, Shape::Sphere { radius } if (radius - 0.8).abs() < 1e-6));
        assert!((a.transform.position.x - 0.2).abs() < 1e-6);
        assert!((b.transform.position.x + 0.2).abs() < 1e-6);
        assert!((a.velocity.linear - Vec3::new(1.5, 0.0, 2.0)).length() < 1e-6);
        assert!((b.velocity.linear - Vec3::new(-1.5, 0.0, 2.0)).length() < 1e-6);
        assert!((a.body.mass - parent_mass * 0.5).abs() < 1e-3);
        assert!(a.body.is_cut_piece && b.body.is_cut_piece);
        assert_eq!(a.tint, Tint::hex(0xff4444));
    }

    #[test]
    fn test_box_cut_uses_dominant_local_axis() {
        let mut w = world();
        let id = w.spawn_box(Vec3::new(0.0, 3.0, 0.0), 1.5, Tint::hex(0x44ff44));
        let plane = Plane::from_normal_and_point(Vec3::new(0.2, 0.9, 0.1), Vec3::new(0.0, 3.0, 0.0));

        let outcome = cut_body(&mut w, id, &plane, &CutConfig::default()).unwrap();

        for (child, side) in outcome.children.iter().zip([-1.0f32, 1.0]) {
            let view = w.body(*child).unwrap();
            let Shape::Box { size } = view.shape else { panic!("expected a box") };
            assert!((size - Vec3::new(1.5, 0.9, 1.5)).length() < 1e-5);
            assert!((view.transform.position.y - (3.0 + side * 0.225)).abs() < 1e-5);
            assert!((view.velocity.linear.y - side * 2.0).abs() < 1e-5);
            assert!(view.body.mass > 0.0);
        }
    }

    #[test]
    fn test_rotated_box_splits_along_its_own_axis() {
        let mut w = world();
        let cfg = w.config().clone();
        // Long X axis stood upright by a quarter turn about Z.
        let desc = BodyDesc::cuboid(Vec3::new(2.0, 1.0, 1.0), &cfg)
            .with_rotation(glam::Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .at(Vec3::new(0.0, 3.0, 0.0));
        let id = w.spawn(desc);
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 3.0, 0.0));

        let outcome = cut_body(&mut w, id, &plane, &CutConfig::default()).unwrap();

        for (child, side) in outcome.children.iter().zip([-1.0f32, 1.0]) {
            let view = w.body(*child).unwrap();
            let Shape::Box { size } = view.shape else { panic!("expected a box") };
            assert!((size - Vec3::new(1.2, 1.0, 1.0)).length() < 1e-5);
            assert!((view.transform.position - Vec3::new(0.0, 3.0 + side * 0.3, 0.0)).length() < 1e-4);
            assert!((view.velocity.linear.y - side * 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_compound_cut_spawns_fragments() {
        let mut w = world();
        let id = w.spawn_jelly_bean(Vec3::new(0.0, 4.0, 0.0));

        let outcome = cut_body(&mut w, id, &plane_x(Vec3::new(0.0, 4.0, 0.0)), &CutConfig::default()).unwrap();

        assert_eq!(outcome.children.len(), 2);
        assert!((2..=4).contains(&outcome.fragments.len()));
        assert_eq!(w.len(), 2 + outcome.fragments.len());
        for child in &outcome.children {
            let view = w.body(*child).unwrap();
            assert_eq!(view.body.kind, BodyKind::Soft);
            assert!((view.body.mass - 300.0).abs() < 1e-3);
            assert_eq!(view.part_scales.len(), 2);
        }
        for fragment in &outcome.fragments {
            let view = w.body(*fragment).unwrap();
            let Shape::Sphere { radius } = view.shape else { panic!("expected a sphere") };
            assert!((0.08..0.18).contains(&radius));
            assert_eq!(view.tint, Tint::hex(FRAGMENT_TINT));
            assert!(view.velocity.linear.y >= 1.0);
        }
    }

    #[test]
    fn test_cut_pieces_can_be_cut_again() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::new(0.0, 3.0, 0.0), 1.0, Tint::hex(0xff4444));
        let first = cut_body(&mut w, id, &plane_x(Vec3::ZERO), &CutConfig::default()).unwrap();
        let second = cut_body(&mut w, first.children[0], &plane_x(Vec3::ZERO), &CutConfig::default()).unwrap();
        assert_eq!(w.len(), 3);
        let view = w.body(second.children[0]).unwrap();
        assert!(matches!(view.shape, Shape::Sphere { radius } if (radius - 0.64).abs() < 1e-5));
    }

    #[test]
    fn test_static_and_missing_bodies_are_not_cut() {
        let mut w = world();
        let cfg = PhysicsConfig::default();
        let wall = w.spawn(BodyDesc::cube(2.0, &cfg).with_kind(BodyKind::Static));
        assert!(cut_body(&mut w, wall, &plane_x(Vec3::ZERO), &CutConfig::default()).is_none());
        assert!(w.contains(wall));

        let gone = w.spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xffffff));
        w.remove(gone);
        assert!(cut_body(&mut w, gone, &plane_x(Vec3::ZERO), &CutConfig::default()).is_none());
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_tool_cancel_and_short_stroke_leave_world_untouched() {
        let mut w = world();
        w.spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xffffff));
        let camera = OrbitCamera::physics(&CameraConfig::default());
        let mut tool = CutTool::new(CutConfig::default());

        assert!(!tool.extend(&mut w, &camera, Vec2::ZERO));
        tool.begin(&mut w, &camera, Vec2::new(-0.2, 0.0));
        assert_eq!(tool.phase(), CutPhase::Drawing);
        assert!(tool.extend(&mut w, &camera, Vec2::new(0.2, 0.0)));
        tool.cancel();
        assert_eq!(tool.phase(), CutPhase::Idle);
        assert!(tool.path().is_empty());

        tool.begin(&mut w, &camera, Vec2::ZERO);
        assert!(tool.resolve(&mut w, &camera).is_empty());
        assert_eq!(tool.phase(), CutPhase::Idle);
        assert_eq!(w.len(), 1);
    }

    #[test]
    fn test_stroke_across_sphere_cuts_it() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xff4444));
        let camera = OrbitCamera::physics(&CameraConfig::default());
        let mut tool = CutTool::new(CutConfig::default());

        tool.begin(&mut w, &camera, Vec2::new(-0.1, 0.0));
        for x in [-0.05, -0.02, 0.0, 0.02, 0.05, 0.1] {
            tool.extend(&mut w, &camera, Vec2::new(x, 0.0));
        }
        let outcomes = tool.resolve(&mut w, &camera);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].parent, id);
        assert!(!w.contains(id));
        assert_eq!(w.len(), 2);
        assert_eq!(tool.phase(), CutPhase::Idle);
    }
}
