// Vector helpers shared by the flocking, physics and cutting engines.
// Everything sits on top of glam; these are the few operations glam does not
// spell the way the simulations need them.

use glam::{Quat, Vec3};

/// Degenerate-safe steering: aim `desired` at full `max_speed`, subtract the
/// current velocity and limit the result to `max_force`.
///
/// A zero `desired` direction stays zero instead of becoming NaN.
#[inline]
pub fn steer(desired: Vec3, velocity: Vec3, max_speed: f32, max_force: f32) -> Vec3 {
    (desired.normalize_or_zero() * max_speed - velocity).clamp_length_max(max_force)
}

/// Rotate `rotation` by angular velocity `omega` over `dt`.
///
/// The increment is applied in world space (pre-multiplied). Spins slower
/// than `epsilon` rad/s are ignored so resting bodies do not drift.
#[inline]
pub fn integrate_rotation(rotation: Quat, omega: Vec3, dt: f32, epsilon: f32) -> Quat {
    let speed = omega.length();
    if speed <= epsilon {
        return rotation;
    }
    let delta = Quat::from_axis_angle(omega / speed, speed * dt);
    (delta * rotation).normalize()
}

/// Random vector with each component in `[-half_width, half_width]`.
pub fn random_spread<R: rand::Rng + ?Sized>(rng: &mut R, half_width: f32) -> Vec3 {
    if half_width <= 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.gen_range(-half_width..=half_width),
        rng.gen_range(-half_width..=half_width),
        rng.gen_range(-half_width..=half_width),
    )
}

/// Shortest distance from `point` to the segment `a..b`.
pub fn distance_to_segment(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Shortest distance from `point` to a polyline.
/// Returns `f32::INFINITY` for polylines with fewer than two points.
pub fn distance_to_polyline(point: Vec3, polyline: &[Vec3]) -> f32 {
    polyline
        .windows(2)
        .map(|seg| distance_to_segment(point, seg[0], seg[1]))
        .fold(f32::INFINITY, f32::min)
}

// ============================================================================
// RAY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalising `direction`. A zero direction yields `-Z`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to the first intersection with a sphere,
    /// or `None` if it misses or the sphere is entirely behind the origin.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        let near = -b - sq;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + sq;
        (far >= 0.0).then_some(far)
    }

    /// Slab test against an axis-aligned box given by its half extents,
    /// centred on the origin of the ray's frame.
    pub fn intersect_aabb(&self, half_extents: Vec3) -> Option<f32> {
        let min = -half_extents;
        let max = half_extents;
        let inv = Vec3::new(
            if self.direction.x.abs() > 1e-6 { 1.0 / self.direction.x } else { f32::MAX },
            if self.direction.y.abs() > 1e-6 { 1.0 / self.direction.y } else { f32::MAX },
            if self.direction.z.abs() > 1e-6 { 1.0 / self.direction.z } else { f32::MAX },
        );

        let t1 = (min - self.origin) * inv;
        let t2 = (max - self.origin) * inv;
        let t_near = t1.min(t2).max_element();
        let t_far = t1.max(t2).min_element();

        if t_far < 0.0 || t_near > t_far {
            return None;
        }
        Some(if t_near >= 0.0 { t_near } else { t_far })
    }

    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = plane.normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (plane.point - self.origin).dot(plane.normal) / denom;
        (t >= 0.0).then(|| self.at(t))
    }
}

// ============================================================================
// PLANE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    /// Unit length.
    pub normal: Vec3,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        Self { point, normal: normal.try_normalize().unwrap_or(Vec3::Y) }
    }

    /// Signed distance; positive on the side the normal points to.
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steer_zero_direction_is_finite() {
        let s = steer(Vec3::ZERO, Vec3::ZERO, 2.0, 0.03);
        assert_eq!(s, Vec3::ZERO);
    }

    #[test]
    fn test_steer_clamps_to_max_force() {
        let s = steer(Vec3::X, Vec3::NEG_X, 2.0, 0.03);
        assert!((s.length() - 0.03).abs() < 1e-6);
        assert!(s.x > 0.0);
    }

    #[test]
    fn test_integrate_rotation_ignores_tiny_spin() {
        let q = integrate_rotation(Quat::IDENTITY, Vec3::splat(0.001), 1.0, 0.01);
        assert_eq!(q, Quat::IDENTITY);
    }

    #[test]
    fn test_integrate_rotation_quarter_turn() {
        let omega = Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
        let q = integrate_rotation(Quat::IDENTITY, omega, 1.0, 0.01);
        let rotated = q * Vec3::X;
        assert!((rotated - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_distance_to_segment_clamps_to_endpoints() {
        let a = Vec3::ZERO;
        let b = Vec3::X;
        assert!((distance_to_segment(Vec3::new(0.5, 1.0, 0.0), a, b) - 1.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec3::new(3.0, 0.0, 0.0), a, b) - 2.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec3::new(0.0, 2.0, 0.0), a, a) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_polyline_needs_two_points() {
        assert_eq!(distance_to_polyline(Vec3::ZERO, &[Vec3::X]), f32::INFINITY);
        let d = distance_to_polyline(Vec3::new(1.0, 1.0, 0.0), &[Vec3::ZERO, Vec3::X * 2.0]);
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_sphere_hits_front_surface() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_ray_sphere_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(ray.intersect_sphere(Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_ray_aabb_slab() {
        let ray = Ray::new(Vec3::new(-5.0, 0.2, 0.0), Vec3::X);
        let t = ray.intersect_aabb(Vec3::splat(0.5)).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        let miss = Ray::new(Vec3::new(-5.0, 2.0, 0.0), Vec3::X);
        assert!(miss.intersect_aabb(Vec3::splat(0.5)).is_none());
    }

    #[test]
    fn test_ray_plane() {
        let plane = Plane::from_normal_and_point(Vec3::Z, Vec3::new(0.0, 0.0, 2.0));
        let ray = Ray::new(Vec3::new(1.0, 1.0, 10.0), Vec3::NEG_Z);
        let hit = ray.intersect_plane(&plane).unwrap();
        assert!((hit - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-5);
        assert!((plane.signed_distance(Vec3::new(0.0, 0.0, 5.0)) - 3.0).abs() < 1e-6);
    }
}
