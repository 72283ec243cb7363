// ECS systems for one physics tick
// Systems operate on body entities and run in a fixed, chained order:
// drag -> gravity -> damping -> integration -> ground -> soft -> pairs -> boundary

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;

use super::collision::{Contact, ContactBody, resolve_contact};
use super::components::*;
use super::config::PhysicsConfig;
use super::math::integrate_rotation;
use super::shapes::Shape;

// ============================================================================
// RESOURCES
// ============================================================================

#[derive(Resource, Debug, Clone)]
pub struct PhysicsSettings(pub PhysicsConfig);

/// Step length and simulated time since the world was created.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    pub dt: f32,
    pub elapsed: f32,
}

/// Source of every random term in the simulation (contact spin, tumbling,
/// cut kicks), seeded from the config so runs are reproducible.
#[derive(Resource)]
pub struct PhysicsRng(pub StdRng);

/// Build the schedule that advances the world by one `SimClock::dt`.
pub fn physics_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            drag_system,
            gravity_system,
            damping_system,
            integration_system,
            ground_contact_system,
            soft_body_system,
            collision_system,
            boundary_system,
        )
            .chain(),
    );
    schedule
}

// ============================================================================
// FORCES
// ============================================================================

/// Pull dragged bodies toward their target, braking close to it.
pub fn drag_system(
    mut query: Query<(&Transform, &mut Velocity, &Dragged, &RigidBody)>,
    settings: Res<PhysicsSettings>,
) {
    let cfg = &settings.0;
    for (transform, mut velocity, dragged, body) in query.iter_mut() {
        if body.is_static() {
            continue;
        }
        let offset = dragged.target - transform.position;
        let distance = offset.length();
        if distance > cfg.drag_stop_distance {
            let speed = (distance * cfg.drag_strength).min(cfg.drag_max_speed);
            let target_velocity = offset / distance * speed;
            velocity.linear = velocity.linear.lerp(target_velocity, cfg.drag_lerp);
            velocity.angular *= cfg.spin_decay;
        } else {
            velocity.linear *= cfg.drag_brake;
        }
    }
}

/// Gravity for every dynamic body that is not held by the pointer.
pub fn gravity_system(
    mut query: Query<(&mut Velocity, &RigidBody), Without<Dragged>>,
    settings: Res<PhysicsSettings>,
    clock: Res<SimClock>,
) {
    let impulse = settings.0.gravity * clock.dt;
    for (mut velocity, body) in query.iter_mut() {
        if !body.is_static() {
            velocity.linear += impulse;
        }
    }
}

pub fn damping_system(mut query: Query<(&mut Velocity, &RigidBody)>) {
    for (mut velocity, body) in query.iter_mut() {
        if body.is_static() {
            continue;
        }
        velocity.linear *= body.air_friction;
        velocity.angular *= body.angular_damping;
    }
}

// ============================================================================
// INTEGRATION
// ============================================================================

pub fn integration_system(
    mut query: Query<(&mut Transform, &Velocity, &RigidBody)>,
    settings: Res<PhysicsSettings>,
    clock: Res<SimClock>,
) {
    let dt = clock.dt;
    for (mut transform, velocity, body) in query.iter_mut() {
        if body.is_static() {
            continue;
        }
        transform.position += velocity.linear * dt;
        transform.rotation =
            integrate_rotation(transform.rotation, velocity.angular, dt, settings.0.angular_epsilon);
    }
}

// ============================================================================
// GROUND
// ============================================================================

/// Bodies below their resting height are snapped up and bounced.
/// Landing converts horizontal motion into spin: spheres roll, boxes tumble.
pub fn ground_contact_system(
    mut query: Query<(&mut Transform, &mut Velocity, &RigidBody, &Collider)>,
    settings: Res<PhysicsSettings>,
    clock: Res<SimClock>,
    mut rng: ResMut<PhysicsRng>,
) {
    let cfg = &settings.0;
    for (mut transform, mut velocity, body, collider) in query.iter_mut() {
        if body.is_static() {
            continue;
        }
        let rest_height = cfg.ground_level + collider.shape.ground_offset();
        if transform.position.y >= rest_height {
            continue;
        }
        transform.position.y = rest_height;

        let horizontal_speed = velocity.linear.x.hypot(velocity.linear.z);

        if velocity.linear.y < 0.0 {
            velocity.linear.y = -velocity.linear.y * body.restitution;

            let friction = 1.0 - body.friction * clock.dt * cfg.ground_friction_scale;
            velocity.linear.x *= friction;
            velocity.linear.z *= friction;

            if horizontal_speed > cfg.rolling_threshold {
                match &collider.shape {
                    Shape::Sphere { radius } => {
                        let roll = Vec3::new(-velocity.linear.z, 0.0, velocity.linear.x);
                        velocity.angular += roll * (cfg.rolling_factor / radius);
                    }
                    Shape::Box { .. } => {
                        let half = horizontal_speed * cfg.tumble_factor * 0.5;
                        let tumble = Vec3::new(
                            rng.0.gen_range(-half..=half),
                            0.0,
                            rng.0.gen_range(-half..=half),
                        );
                        velocity.angular += tumble;
                    }
                    Shape::Compound { .. } => {}
                }
            } else {
                velocity.angular *= cfg.spin_decay;
            }
        }

        // Settle near-stationary bodies so they do not jitter on the ground.
        if horizontal_speed < cfg.rest_threshold {
            velocity.linear.x *= cfg.rest_damping;
            velocity.linear.z *= cfg.rest_damping;
            velocity.angular *= cfg.rest_damping;
        }
    }
}

// ============================================================================
// SOFT BODIES
// ============================================================================

/// Wobble soft bodies: faster bodies deform more, each part on its own phase.
pub fn soft_body_system(
    mut query: Query<(&mut SoftBody, &Velocity)>,
    settings: Res<PhysicsSettings>,
    clock: Res<SimClock>,
) {
    let cfg = &settings.0;
    let t_ms = clock.elapsed * 1000.0;
    for (mut soft, velocity) in query.iter_mut() {
        let impact = (velocity.linear.length() * cfg.soft_impact_scale).min(cfg.soft_max_deformation);
        let deformation = impact + (t_ms * 0.01).sin() * cfg.soft_wobble;
        soft.deformation = deformation;
        for (i, scale) in soft.part_scales.iter_mut().enumerate() {
            let phase = i as f32 * std::f32::consts::PI * 0.3;
            *scale = 1.0 + deformation * (t_ms * 0.008 + phase).sin();
        }
    }
}

// ============================================================================
// BODY-BODY CONTACT
// ============================================================================

/// Resolve every overlapping pair once per tick, in query order.
pub fn collision_system(
    mut query: Query<(&mut Transform, &mut Velocity, &RigidBody, &Collider)>,
    settings: Res<PhysicsSettings>,
    mut rng: ResMut<PhysicsRng>,
) {
    let spin = settings.0.contact_spin;
    let mut pairs = query.iter_combinations_mut();
    while let Some([(mut ta, mut va, ba, ca), (mut tb, mut vb, bb, cb)]) = pairs.fetch_next() {
        let mut a = contact_body(&ta, &va, ba, ca);
        let mut b = contact_body(&tb, &vb, bb, cb);
        if resolve_contact(&mut a, &mut b, spin, &mut rng.0) == Contact::None {
            continue;
        }
        if !ba.is_static() {
            ta.position = a.position;
            va.linear = a.velocity;
            va.angular = a.angular;
        }
        if !bb.is_static() {
            tb.position = b.position;
            vb.linear = b.velocity;
            vb.angular = b.angular;
        }
    }
}

fn contact_body(
    transform: &Transform,
    velocity: &Velocity,
    body: &RigidBody,
    collider: &Collider,
) -> ContactBody {
    ContactBody {
        position: transform.position,
        velocity: velocity.linear,
        angular: velocity.angular,
        inverse_mass: body.inverse_mass(),
        restitution: body.restitution,
        radius: collider.shape.bounding_radius(),
    }
}

// ============================================================================
// BOUNDARY
// ============================================================================

/// Keep bodies inside the playground: walls on X/Z and a ceiling on Y.
pub fn boundary_system(
    mut query: Query<(&mut Transform, &mut Velocity, &RigidBody)>,
    settings: Res<PhysicsSettings>,
) {
    let bound = settings.0.boundary;
    let damping = settings.0.boundary_damping;
    for (mut transform, mut velocity, body) in query.iter_mut() {
        if body.is_static() {
            continue;
        }
        if transform.position.x.abs() > bound {
            transform.position.x = bound.copysign(transform.position.x);
            velocity.linear.x *= -damping;
        }
        if transform.position.z.abs() > bound {
            transform.position.z = bound.copysign(transform.position.z);
            velocity.linear.z *= -damping;
        }
        if transform.position.y > bound {
            transform.position.y = bound;
            velocity.linear.y *= -damping;
        }
    }
}
