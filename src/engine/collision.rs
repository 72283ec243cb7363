// Bounding-sphere contact resolution between two bodies.
//
// The collision system copies each body into a `ContactBody`, resolves every
// overlapping pair against those copies, then writes the results back. Static
// bodies carry an inverse mass of 0: they push but are never pushed.

use glam::Vec3;
use rand::Rng;

use super::math::random_spread;

/// The slice of a body's state that a contact reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct ContactBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular: Vec3,
    pub inverse_mass: f32,
    pub restitution: f32,
    pub radius: f32,
}

impl ContactBody {
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }
}

/// What happened when two bodies were tested against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Bounding spheres do not overlap (or the centres coincide).
    None,
    /// Overlap was corrected but the bodies were already separating.
    Separated,
    /// Overlap corrected and an impulse exchanged.
    Impulse,
}

/// Resolve one pair in place.
///
/// `spin` is the full width of the random angular kick given to each dynamic
/// body on impact (components drawn from `[-spin/2, spin/2]`).
pub fn resolve_contact<R: Rng + ?Sized>(
    a: &mut ContactBody,
    b: &mut ContactBody,
    spin: f32,
    rng: &mut R,
) -> Contact {
    let total_inverse = a.inverse_mass + b.inverse_mass;
    if total_inverse == 0.0 {
        return Contact::None;
    }

    let delta = a.position - b.position;
    let distance = delta.length();
    let min_distance = a.radius + b.radius;
    if distance >= min_distance || distance <= f32::EPSILON {
        return Contact::None;
    }
    let normal = delta / distance;
    let overlap = min_distance - distance;

    // Split the correction by inverse mass: half each for two dynamic
    // bodies, all of it on the dynamic one against a static body.
    let share_a = if b.is_static() { 1.0 } else if a.is_static() { 0.0 } else { 0.5 };
    a.position += normal * overlap * share_a;
    b.position -= normal * overlap * (1.0 - share_a);

    let velocity_along_normal = (a.velocity - b.velocity).dot(normal);
    if velocity_along_normal >= 0.0 {
        return Contact::Separated;
    }

    let restitution = a.restitution.min(b.restitution);
    let impulse = -(1.0 + restitution) * velocity_along_normal / total_inverse;
    a.velocity += normal * impulse * a.inverse_mass;
    b.velocity -= normal * impulse * b.inverse_mass;

    let half = spin * 0.5;
    if !a.is_static() {
        a.angular += random_spread(rng, half);
    }
    if !b.is_static() {
        b.angular += random_spread(rng, half);
    }
    Contact::Impulse
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn body(position: Vec3, velocity: Vec3, mass: f32) -> ContactBody {
        ContactBody {
            position,
            velocity,
            angular: Vec3::ZERO,
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            restitution: 0.6,
            radius: 1.0,
        }
    }

    fn kinetic(b: &ContactBody) -> f32 {
        if b.is_static() {
            0.0
        } else {
            0.5 / b.inverse_mass * b.velocity.length_squared()
        }
    }

    #[test]
    fn test_head_on_pair_separates_and_loses_energy() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut a = body(Vec3::new(-0.8, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), 2.0);
        let mut b = body(Vec3::new(0.8, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0);
        let before = kinetic(&a) + kinetic(&b);

        let contact = resolve_contact(&mut a, &mut b, 0.2, &mut rng);

        assert_eq!(contact, Contact::Impulse);
        assert!(a.position.distance(b.position) >= 2.0 - 1e-5);
        assert!((a.velocity - b.velocity).dot(b.position - a.position) <= 1e-5);
        assert!(kinetic(&a) + kinetic(&b) <= before + 1e-4);
    }

    #[test]
    fn test_momentum_is_conserved() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut a = body(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, -2.0, 1.0), 3.0);
        let mut b = body(Vec3::new(0.3, -1.5, 0.2), Vec3::new(0.5, 1.0, 0.0), 5.0);
        let before = a.velocity * 3.0 + b.velocity * 5.0;
        resolve_contact(&mut a, &mut b, 0.2, &mut rng);
        let after = a.velocity * 3.0 + b.velocity * 5.0;
        assert!((before - after).length() < 1e-4);
    }

    #[test]
    fn test_static_body_is_never_moved() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ball = body(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, -4.0, 0.0), 1.0);
        let mut floor = body(Vec3::ZERO, Vec3::ZERO, 0.0);

        let contact = resolve_contact(&mut ball, &mut floor, 0.2, &mut rng);

        assert_eq!(contact, Contact::Impulse);
        assert_eq!(floor.position, Vec3::ZERO);
        assert_eq!(floor.velocity, Vec3::ZERO);
        assert_eq!(floor.angular, Vec3::ZERO);
        assert!((ball.position.y - 2.0).abs() < 1e-5);
        assert!((ball.velocity.y - 4.0 * 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_separating_pair_gets_no_impulse() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = body(Vec3::new(-0.5, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 1.0);
        let mut b = body(Vec3::new(0.5, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 1.0);
        let contact = resolve_contact(&mut a, &mut b, 0.2, &mut rng);
        assert_eq!(contact, Contact::Separated);
        assert_eq!(a.velocity, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(a.angular, Vec3::ZERO);
    }

    #[test]
    fn test_coincident_centres_are_skipped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = body(Vec3::ONE, Vec3::X, 1.0);
        let mut b = body(Vec3::ONE, Vec3::NEG_X, 1.0);
        assert_eq!(resolve_contact(&mut a, &mut b, 0.2, &mut rng), Contact::None);
        assert_eq!(a.position, Vec3::ONE);
    }
}
