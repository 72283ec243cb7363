// Physics world: body store, spawning presets, picking, and the fixed-step tick.
//
// Bodies live as entities in a bevy_ecs `World`; every tick runs the chained
// schedule from `systems`. Callers address bodies through `BodyId` and read
// them back as `BodyView` snapshots, never through raw ECS access.

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::components::*;
use super::config::PhysicsConfig;
use super::math::Ray;
use super::shapes::Shape;
use super::systems::{PhysicsRng, PhysicsSettings, SimClock, physics_schedule};

/// Stable handle to a body. Stays valid until the body is removed or cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(Entity);

impl BodyId {
    pub fn entity(self) -> Entity {
        self.0
    }
}

// ============================================================================
// BODY DESCRIPTIONS
// ============================================================================

/// Everything needed to spawn a body.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub shape: Shape,
    pub body: RigidBody,
    pub transform: Transform,
    pub velocity: Velocity,
    pub tint: Tint,
}

impl BodyDesc {
    /// Solid sphere; mass from `density` and the volume 4.18·r³.
    pub fn sphere(radius: f32, config: &PhysicsConfig) -> Self {
        Self {
            shape: Shape::Sphere { radius },
            body: RigidBody {
                kind: BodyKind::Rigid,
                mass: radius * radius * radius * 4.18 * config.density,
                restitution: 0.6,
                friction: 0.5,
                air_friction: config.air_friction,
                angular_damping: 0.98,
                is_cut_piece: false,
            },
            transform: Transform::default(),
            velocity: Velocity::default(),
            tint: Tint::hex(0xff4444),
        }
    }

    /// Solid box with full edge lengths `size`.
    pub fn cuboid(size: Vec3, config: &PhysicsConfig) -> Self {
        Self {
            shape: Shape::Box { size },
            body: RigidBody {
                kind: BodyKind::Rigid,
                mass: size.x * size.y * size.z * config.density,
                restitution: 0.4,
                friction: 0.7,
                air_friction: config.air_friction,
                angular_damping: 0.98,
                is_cut_piece: false,
            },
            transform: Transform::default(),
            velocity: Velocity::default(),
            tint: Tint::hex(0x44ff44),
        }
    }

    pub fn cube(edge: f32, config: &PhysicsConfig) -> Self {
        Self::cuboid(Vec3::splat(edge), config)
    }

    /// Bouncy three-lobe soft body.
    pub fn jelly_bean(config: &PhysicsConfig) -> Self {
        Self::soft(Shape::jelly_bean(1.0), 600.0, config)
    }

    /// Soft compound body with jelly-bean surface response.
    pub fn soft(shape: Shape, mass: f32, config: &PhysicsConfig) -> Self {
        Self {
            shape,
            body: RigidBody {
                kind: BodyKind::Soft,
                mass,
                restitution: 0.8,
                friction: 0.3,
                air_friction: config.air_friction,
                angular_damping: 0.95,
                is_cut_piece: false,
            },
            transform: Transform::default(),
            velocity: Velocity::default(),
            tint: Tint::hex(0xffff44),
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, linear: Vec3, angular: Vec3) -> Self {
        self.velocity = Velocity { linear, angular };
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.body.mass = mass;
        self
    }

    pub fn with_tint(mut self, tint: Tint) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.body.kind = kind;
        self
    }

    pub fn as_cut_piece(mut self) -> Self {
        self.body.is_cut_piece = true;
        self
    }
}

/// Read-only copy of a body's state.
#[derive(Debug, Clone)]
pub struct BodyView {
    pub id: BodyId,
    pub transform: Transform,
    pub velocity: Velocity,
    pub body: RigidBody,
    pub shape: Shape,
    pub tint: Tint,
    /// One entry per compound part; empty for rigid bodies.
    pub part_scales: Vec<f32>,
    pub dragged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyId,
    pub distance: f32,
    pub point: Vec3,
}

// ============================================================================
// WORLD
// ============================================================================

pub struct PhysicsWorld {
    world: World,
    schedule: Schedule,
    spawned: u64,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig, seed: u64) -> Self {
        let mut world = World::new();
        world.insert_resource(PhysicsSettings(config.clone()));
        world.insert_resource(SimClock::default());
        world.insert_resource(PhysicsRng(StdRng::seed_from_u64(seed)));
        Self {
            world,
            schedule: physics_schedule(),
            spawned: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.world.resource::<PhysicsSettings>().0
    }

    /// Simulated seconds since the world was created.
    pub fn elapsed(&self) -> f32 {
        self.world.resource::<SimClock>().elapsed
    }

    /// The world's random source, shared with the cutting engine.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.world.resource_mut::<PhysicsRng>().into_inner().0
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    pub fn spawn(&mut self, desc: BodyDesc) -> BodyId {
        let parts = desc.shape.part_count();
        let soft = desc.body.kind == BodyKind::Soft;
        let order = SpawnOrder(self.spawned);
        self.spawned += 1;
        let mut entity = self.world.spawn((
            desc.transform,
            desc.velocity,
            desc.body,
            Collider { shape: desc.shape },
            desc.tint,
            order,
        ));
        if soft {
            entity.insert(SoftBody::for_parts(parts));
        }
        BodyId(entity.id())
    }

    pub fn spawn_sphere(&mut self, position: Vec3, radius: f32, tint: Tint) -> BodyId {
        let desc = BodyDesc::sphere(radius, self.config()).at(position).with_tint(tint);
        self.spawn(desc)
    }

    pub fn spawn_box(&mut self, position: Vec3, edge: f32, tint: Tint) -> BodyId {
        let desc = BodyDesc::cube(edge, self.config()).at(position).with_tint(tint);
        self.spawn(desc)
    }

    pub fn spawn_jelly_bean(&mut self, position: Vec3) -> BodyId {
        let desc = BodyDesc::jelly_bean(self.config()).at(position);
        self.spawn(desc)
    }

    /// The starting scene: a red ball and a green crate dropped side by side.
    pub fn populate_demo(&mut self) {
        self.spawn_sphere(Vec3::new(-2.0, 5.0, 0.0), 1.0, Tint::hex(0xff4444));
        self.spawn_box(Vec3::new(2.0, 5.0, 0.0), 1.5, Tint::hex(0x44ff44));
        log::debug!("populated demo scene");
    }

    /// Remove every dynamic body and restore the starting scene.
    /// Static bodies survive.
    pub fn reset(&mut self) {
        let dynamic: Vec<Entity> = self
            .world
            .query::<(Entity, &RigidBody)>()
            .iter(&self.world)
            .filter(|(_, body)| !body.is_static())
            .map(|(entity, _)| entity)
            .collect();
        let removed = dynamic.len();
        for entity in dynamic {
            self.world.despawn(entity);
        }
        self.populate_demo();
        log::info!("physics reset: removed {removed} bodies");
    }

    pub fn remove(&mut self, id: BodyId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.world.despawn(id.0)
    }

    /// Atomically swap `parent` for `children`.
    /// Returns `None`, spawning nothing, if the parent no longer exists.
    pub fn replace(&mut self, parent: BodyId, children: Vec<BodyDesc>) -> Option<Vec<BodyId>> {
        if !self.contains(parent) {
            return None;
        }
        self.world.despawn(parent.0);
        Some(children.into_iter().map(|desc| self.spawn(desc)).collect())
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn contains(&self, id: BodyId) -> bool {
        self.world.get::<RigidBody>(id.0).is_some()
    }

    pub fn body(&self, id: BodyId) -> Option<BodyView> {
        let e = id.0;
        Some(BodyView {
            id,
            transform: *self.world.get::<Transform>(e)?,
            velocity: *self.world.get::<Velocity>(e)?,
            body: *self.world.get::<RigidBody>(e)?,
            shape: self.world.get::<Collider>(e)?.shape.clone(),
            tint: *self.world.get::<Tint>(e)?,
            part_scales: self
                .world
                .get::<SoftBody>(e)
                .map(|soft| soft.part_scales.clone())
                .unwrap_or_default(),
            dragged: self.world.get::<Dragged>(e).is_some(),
        })
    }

    /// Every body, in spawn order. Children of a cut come after every body
    /// that existed before the cut.
    pub fn bodies(&mut self) -> Vec<BodyView> {
        let mut ids: Vec<(SpawnOrder, BodyId)> = self
            .world
            .query_filtered::<(Entity, &SpawnOrder), With<RigidBody>>()
            .iter(&self.world)
            .map(|(entity, order)| (*order, BodyId(entity)))
            .collect();
        ids.sort_unstable_by_key(|(order, _)| *order);
        ids.into_iter().filter_map(|(_, id)| self.body(id)).collect()
    }

    pub fn len(&mut self) -> usize {
        self.world
            .query_filtered::<Entity, With<RigidBody>>()
            .iter(&self.world)
            .count()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    pub fn set_velocity(&mut self, id: BodyId, linear: Vec3) -> bool {
        match self.world.get_mut::<Velocity>(id.0) {
            Some(mut velocity) => {
                velocity.linear = linear;
                true
            }
            None => false,
        }
    }

    /// Start pulling `id` toward `target`. Static bodies cannot be dragged.
    pub fn begin_drag(&mut self, id: BodyId, target: Vec3) -> bool {
        match self.world.get::<RigidBody>(id.0) {
            Some(body) if !body.is_static() => {
                self.world.entity_mut(id.0).insert(Dragged { target });
                true
            }
            _ => false,
        }
    }

    pub fn set_drag_target(&mut self, id: BodyId, target: Vec3) -> bool {
        match self.world.get_mut::<Dragged>(id.0) {
            Some(mut dragged) => {
                dragged.target = target;
                true
            }
            None => false,
        }
    }

    pub fn end_drag(&mut self, id: BodyId) -> bool {
        if self.world.get::<Dragged>(id.0).is_none() {
            return false;
        }
        self.world.entity_mut(id.0).remove::<Dragged>();
        true
    }

    // ------------------------------------------------------------------------
    // Picking
    // ------------------------------------------------------------------------

    /// Every body the ray hits, nearest first.
    pub fn raycast(&mut self, ray: &Ray) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = self
            .world
            .query::<(Entity, &Transform, &Collider, Option<&SoftBody>)>()
            .iter(&self.world)
            .filter_map(|(entity, transform, collider, soft)| {
                let scales = soft.map(|s| s.part_scales.as_slice()).unwrap_or(&[]);
                collider.shape.raycast(transform, scales, ray).map(|distance| RayHit {
                    body: BodyId(entity),
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Hit on one specific body, if the ray reaches it.
    pub fn raycast_body(&self, id: BodyId, ray: &Ray) -> Option<RayHit> {
        let transform = self.world.get::<Transform>(id.0)?;
        let collider = self.world.get::<Collider>(id.0)?;
        let scales = self
            .world
            .get::<SoftBody>(id.0)
            .map(|s| s.part_scales.as_slice())
            .unwrap_or(&[]);
        let distance = collider.shape.raycast(transform, scales, ray)?;
        Some(RayHit { body: id, distance, point: ray.at(distance) })
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    /// Zero, negative and non-finite steps are ignored.
    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        {
            let mut clock = self.world.resource_mut::<SimClock>();
            clock.dt = dt;
            clock.elapsed += dt;
        }
        self.schedule.run(&mut self.world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(&PhysicsConfig::default(), 42)
    }

    #[test]
    fn test_demo_scene_has_sphere_and_box() {
        let mut w = world();
        w.populate_demo();
        let bodies = w.bodies();
        assert_eq!(bodies.len(), 2);
        assert!(matches!(bodies[0].shape, Shape::Sphere { radius } if radius == 1.0));
        assert!(matches!(bodies[1].shape, Shape::Box { .. }));
        assert!((bodies[1].body.mass - 1.5f32.powi(3) * 800.0).abs() < 1e-2);
    }

    #[test]
    fn test_bodies_follow_spawn_order_after_removal() {
        let mut w = world();
        let first = w.spawn_sphere(Vec3::new(-4.0, 1.0, 0.0), 0.5, Tint::hex(0xff0000));
        let second = w.spawn_sphere(Vec3::new(0.0, 1.0, 0.0), 0.5, Tint::hex(0x00ff00));
        let third = w.spawn_sphere(Vec3::new(4.0, 1.0, 0.0), 0.5, Tint::hex(0x0000ff));
        assert!(w.remove(first));

        // The freed entity index is handed out again.
        let desc = BodyDesc::sphere(0.5, w.config()).at(Vec3::new(8.0, 1.0, 0.0));
        let fourth = w.spawn(desc);

        let order: Vec<BodyId> = w.bodies().iter().map(|b| b.id).collect();
        assert_eq!(order, vec![second, third, fourth]);
    }

    #[test]
    fn test_invalid_step_leaves_world_untouched() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::new(0.0, 5.0, 0.0), 1.0, Tint::hex(0xffffff));
        for dt in [0.0, -1.0 / 60.0, f32::NAN, f32::INFINITY] {
            w.step(dt);
        }
        let view = w.body(id).unwrap();
        assert_eq!(view.transform.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(view.velocity.linear, Vec3::ZERO);
        assert_eq!(w.elapsed(), 0.0);
    }

    #[test]
    fn test_reset_keeps_static_bodies() {
        let mut w = world();
        let floor = w.spawn(
            BodyDesc::cube(4.0, &PhysicsConfig::default())
                .with_kind(BodyKind::Static)
                .at(Vec3::new(10.0, 2.0, 10.0)),
        );
        w.spawn_jelly_bean(Vec3::new(0.0, 8.0, 0.0));
        w.spawn_sphere(Vec3::ZERO, 0.5, Tint::hex(0xffffff));

        w.reset();

        assert!(w.contains(floor));
        // Static floor plus the two demo bodies.
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn test_static_body_does_not_move() {
        let mut w = world();
        let id = w.spawn(
            BodyDesc::sphere(1.0, &PhysicsConfig::default())
                .with_kind(BodyKind::Static)
                .at(Vec3::new(0.0, 3.0, 0.0)),
        );
        w.spawn_sphere(Vec3::new(0.0, 4.5, 0.0), 1.0, Tint::hex(0xff0000));
        for _ in 0..60 {
            w.step(1.0 / 60.0);
        }
        assert_eq!(w.body(id).unwrap().transform.position, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_drag_pulls_body_toward_target_without_gravity() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::new(0.0, 5.0, 0.0), 1.0, Tint::hex(0xff0000));
        assert!(w.begin_drag(id, Vec3::new(4.0, 5.0, 0.0)));
        for _ in 0..30 {
            w.step(1.0 / 60.0);
        }
        let view = w.body(id).unwrap();
        assert!(view.dragged);
        assert!(view.transform.position.x > 3.0);
        assert!((view.transform.position.y - 5.0).abs() < 0.1);

        assert!(w.end_drag(id));
        assert!(!w.end_drag(id));
        assert!(!w.body(id).unwrap().dragged);
    }

    #[test]
    fn test_static_body_cannot_be_dragged() {
        let mut w = world();
        let id = w.spawn(BodyDesc::cube(1.0, &PhysicsConfig::default()).with_kind(BodyKind::Static));
        assert!(!w.begin_drag(id, Vec3::ONE));
    }

    #[test]
    fn test_raycast_sorted_by_distance() {
        let mut w = world();
        let far = w.spawn_sphere(Vec3::new(0.0, 0.0, -10.0), 1.0, Tint::hex(0xff0000));
        let near = w.spawn_box(Vec3::new(0.0, 0.0, -4.0), 1.0, Tint::hex(0x00ff00));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);

        let hits = w.raycast(&ray);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].body, near);
        assert_eq!(hits[1].body, far);
        assert!((hits[0].distance - 8.5).abs() < 1e-4);
        assert!((hits[0].point.z + 3.5).abs() < 1e-4);
        assert!(w.raycast_body(far, &ray).is_some());
    }

    #[test]
    fn test_replace_is_all_or_nothing() {
        let mut w = world();
        let cfg = PhysicsConfig::default();
        let parent = w.spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xff0000));
        assert!(w.remove(parent));
        assert!(!w.remove(parent));

        let children = vec![BodyDesc::sphere(0.5, &cfg), BodyDesc::sphere(0.5, &cfg)];
        assert!(w.replace(parent, children).is_none());
        assert!(w.is_empty());

        let parent = w.spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xff0000));
        let children = vec![BodyDesc::sphere(0.5, &cfg), BodyDesc::sphere(0.5, &cfg)];
        let ids = w.replace(parent, children).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(!w.contains(parent));
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn test_jelly_bean_wobbles() {
        let mut w = world();
        let id = w.spawn_jelly_bean(Vec3::new(0.0, 6.0, 0.0));
        for _ in 0..20 {
            w.step(1.0 / 60.0);
        }
        let view = w.body(id).unwrap();
        assert_eq!(view.part_scales.len(), 3);
        assert!(view.part_scales.iter().any(|&s| (s - 1.0).abs() > 1e-3));
        assert!((w.elapsed() - 20.0 / 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_boundary_reflects_velocity() {
        let mut w = world();
        let id = w.spawn_sphere(Vec3::new(24.9, 5.0, 0.0), 0.5, Tint::hex(0xff0000));
        w.set_velocity(id, Vec3::new(30.0, 0.0, 0.0));
        w.step(1.0 / 60.0);
        let view = w.body(id).unwrap();
        assert_eq!(view.transform.position.x, 25.0);
        assert!(view.velocity.linear.x < 0.0);
    }
}
