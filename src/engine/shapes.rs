// Body geometry: sphere, box, or a compound of spheres.
//
// Collision between bodies always uses the bounding sphere (`bounding_radius`);
// ray picking uses the exact primitive so cuts land on the visible surface.

use glam::Vec3;

use super::components::Transform;
use super::math::Ray;

/// One sphere of a compound body, in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Part {
    pub offset: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Full edge lengths along the local axes.
    Box { size: Vec3 },
    Compound { parts: Vec<Part> },
}

impl Shape {
    pub fn cube(edge: f32) -> Self {
        Shape::Box { size: Vec3::splat(edge) }
    }

    /// Three-lobe jelly bean: a body sphere with a smaller lobe above and below.
    pub fn jelly_bean(scale: f32) -> Self {
        Shape::Compound {
            parts: vec![
                Part { offset: Vec3::ZERO, radius: 0.8 * scale },
                Part { offset: Vec3::new(0.0, 0.7 * scale, 0.0), radius: 0.6 * scale },
                Part { offset: Vec3::new(0.0, -0.7 * scale, 0.0), radius: 0.6 * scale },
            ],
        }
    }

    /// Radius of the sphere used for body-body contact.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Sphere { radius } => *radius,
            // Half of the space diagonal; 0.866 * edge for a cube.
            Shape::Box { size } => size.length() * 0.5,
            Shape::Compound { parts } => parts
                .iter()
                .map(|p| p.offset.length() + p.radius)
                .fold(0.0, f32::max),
        }
    }

    /// Height of the body centre above the ground when resting on it.
    pub fn ground_offset(&self) -> f32 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Box { size } => size.y * 0.5,
            // The main lobe carries the body; the end lobes are allowed to
            // dip into the ground as the bean wobbles.
            Shape::Compound { parts } => parts.iter().map(|p| p.radius).fold(0.0, f32::max),
        }
    }

    pub fn part_count(&self) -> usize {
        match self {
            Shape::Compound { parts } => parts.len(),
            _ => 1,
        }
    }

    /// False for shapes that have nothing to collide with or cut.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Sphere { radius } => *radius <= 0.0,
            Shape::Box { size } => size.min_element() <= 0.0,
            Shape::Compound { parts } => parts.is_empty(),
        }
    }

    /// Distance along `ray` to the first surface hit, if any.
    ///
    /// `part_scales` scales compound lobes (soft-body wobble); missing entries
    /// count as 1.
    pub fn raycast(&self, transform: &Transform, part_scales: &[f32], ray: &Ray) -> Option<f32> {
        match self {
            Shape::Sphere { radius } => ray.intersect_sphere(transform.position, *radius),
            Shape::Box { size } => {
                let inv = transform.rotation.inverse();
                let local = Ray {
                    origin: inv * (ray.origin - transform.position),
                    direction: inv * ray.direction,
                };
                local.intersect_aabb(*size * 0.5)
            }
            Shape::Compound { parts } => parts
                .iter()
                .enumerate()
                .filter_map(|(i, part)| {
                    let scale = part_scales.get(i).copied().unwrap_or(1.0);
                    ray.intersect_sphere(transform.transform_point(part.offset), part.radius * scale)
                })
                .min_by(|a, b| a.total_cmp(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_bounding_radius_per_shape() {
        assert_eq!(Shape::Sphere { radius: 1.0 }.bounding_radius(), 1.0);
        let cube = Shape::cube(1.5).bounding_radius();
        assert!((cube - 1.5 * 0.866).abs() < 1e-3);
        let bean = Shape::jelly_bean(1.0).bounding_radius();
        assert!((bean - 1.3).abs() < 1e-6);
    }

    #[test]
    fn test_ground_offset_per_shape() {
        assert_eq!(Shape::Sphere { radius: 2.0 }.ground_offset(), 2.0);
        assert_eq!(Shape::cube(1.5).ground_offset(), 0.75);
        assert!((Shape::jelly_bean(1.0).ground_offset() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_shapes() {
        assert!(Shape::Compound { parts: vec![] }.is_degenerate());
        assert!(Shape::Sphere { radius: 0.0 }.is_degenerate());
        assert!(!Shape::cube(1.0).is_degenerate());
    }

    #[test]
    fn test_raycast_rotated_box() {
        // Long thin box along local X, rotated to lie along world Z.
        let shape = Shape::Box { size: Vec3::new(4.0, 0.5, 0.5) };
        let transform = Transform {
            position: Vec3::ZERO,
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        };
        // A ray down the Y axis at z = 1.5 hits only when the box lies along Z.
        let ray = Ray::new(Vec3::new(0.0, 10.0, 1.5), Vec3::NEG_Y);
        let t = shape.raycast(&transform, &[], &ray).unwrap();
        assert!((t - 9.75).abs() < 1e-4);

        let unrotated = Transform::default();
        assert!(shape.raycast(&unrotated, &[], &ray).is_none());
    }

    #[test]
    fn test_raycast_compound_takes_nearest_lobe() {
        let shape = Shape::jelly_bean(1.0);
        let transform = Transform::from_position(Vec3::new(0.0, 5.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::NEG_Y);
        let t = shape.raycast(&transform, &[1.0, 1.0, 1.0], &ray).unwrap();
        // Top lobe: centre y = 5.7, radius 0.6.
        assert!((t - (20.0 - 6.3)).abs() < 1e-4);
    }
}
