// Orbit camera system
//
// Camera model:
//   - A target point the camera looks at (the origin for every demo)
//   - Spherical offset: theta around Y, phi down from +Y, distance
//   - Pointer drag orbits (phi clamped away from the poles), wheel zooms
//   - Optional top-down orthographic mode for the island map
//
// Simulations only see the `CameraView` trait: where the eye is, where it
// looks, and how to go between world points, NDC, and picking rays.

use glam::{Mat4, Vec2, Vec3};

use super::config::CameraConfig;
use super::math::Ray;

/// What the simulation core needs from a camera.
pub trait CameraView {
    fn position(&self) -> Vec3;

    /// Unit vector the camera looks along.
    fn view_direction(&self) -> Vec3;

    fn view_projection(&self) -> Mat4;

    /// World point to normalized device coordinates (x, y in [-1, 1], z depth in [0, 1]).
    fn project(&self, point: Vec3) -> Vec3 {
        self.view_projection().project_point3(point)
    }

    /// Picking ray through an NDC position, starting on the near plane.
    fn unproject_ray(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }
}

/// Pixel position (origin top-left) to NDC (origin centre, +Y up).
pub fn screen_to_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    if width <= 0.0 || height <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(x / width * 2.0 - 1.0, 1.0 - y / height * 2.0)
}

/// Inverse of `screen_to_ndc`.
pub fn ndc_to_screen(ndc: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new((ndc.x + 1.0) * 0.5 * width, (1.0 - ndc.y) * 0.5 * height)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov_y: f32 },
    /// Straight down from `altitude` above the target; `height` world units
    /// fit the viewport vertically.
    TopDown { height: f32, altitude: f32 },
}

/// How a wheel delta (browser-style: positive = away from the scene) changes distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomMode {
    /// `distance *= 1 + delta * rate`
    Scale { rate: f32 },
    /// `distance += delta * rate`
    Linear { rate: f32 },
}

pub struct OrbitCamera {
    pub target: Vec3,
    /// Azimuth in radians around +Y, measured from +X toward +Z.
    pub theta: f32,
    /// Polar angle from +Y. Private: always clamped; use `phi()`.
    phi: f32,
    /// Private: always clamped to [min_distance, max_distance]; use `distance()`.
    distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_phi: f32,
    pub projection: Projection,
    /// Field of view restored when leaving top-down mode.
    fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Radians per pixel of drag.
    pub orbit_speed: f32,
    pub zoom_mode: ZoomMode,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, distance: f32, theta: f32, phi: f32) -> Self {
        let fov_y = config.fov_degrees.to_radians();
        let mut camera = Self {
            target: Vec3::ZERO,
            theta,
            phi,
            distance,
            min_distance: distance,
            max_distance: distance,
            min_phi: config.min_phi,
            projection: Projection::Perspective { fov_y },
            fov_y,
            aspect: 16.0 / 9.0,
            near: config.near,
            far: config.far,
            orbit_speed: config.orbit_speed,
            zoom_mode: ZoomMode::Scale { rate: 0.0 },
        };
        camera.clamp();
        camera
    }

    /// Flock view: fixed distance, slightly above the horizon.
    pub fn boids(config: &CameraConfig) -> Self {
        Self::new(config, 12.0, 0.0, std::f32::consts::PI / 6.0)
    }

    /// Playground view with multiplicative zoom between 5 and 50.
    pub fn physics(config: &CameraConfig) -> Self {
        let mut camera = Self::new(config, 15.0, 0.0, std::f32::consts::PI * 0.3);
        camera.min_distance = 5.0;
        camera.max_distance = 50.0;
        camera.zoom_mode = ZoomMode::Scale { rate: 0.001 };
        camera
    }

    /// Island view: starts top-down over a map `map_size` units across;
    /// perspective mode orbits at 10..100 units with linear zoom.
    pub fn islands(config: &CameraConfig, map_size: f32) -> Self {
        let mut camera = Self::new(config, 50.0, 0.785, std::f32::consts::FRAC_PI_4);
        camera.min_distance = 10.0;
        camera.max_distance = 100.0;
        camera.zoom_mode = ZoomMode::Linear { rate: 0.01 };
        camera.projection = Projection::TopDown { height: map_size, altitude: 50.0 };
        camera
    }

    pub fn phi(&self) -> f32 { self.phi }
    pub fn distance(&self) -> f32 { self.distance }

    pub fn is_top_down(&self) -> bool {
        matches!(self.projection, Projection::TopDown { .. })
    }

    /// Switch to top-down over `height` world units, or back to perspective.
    pub fn set_top_down(&mut self, top_down: Option<f32>) {
        self.projection = match top_down {
            Some(height) => Projection::TopDown { height, altitude: 50.0 },
            None => Projection::Perspective { fov_y: self.fov_y },
        };
    }

    /// Drag by (dx, dy) pixels. Ignored in top-down mode.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        if self.is_top_down() {
            return;
        }
        self.theta -= dx * self.orbit_speed;
        self.phi += dy * self.orbit_speed;
        self.clamp();
    }

    /// Apply a wheel delta. Ignored in top-down mode.
    pub fn zoom(&mut self, delta: f32) {
        if self.is_top_down() {
            return;
        }
        match self.zoom_mode {
            ZoomMode::Scale { rate } => self.distance *= 1.0 + delta * rate,
            ZoomMode::Linear { rate } => self.distance += delta * rate,
        }
        self.clamp();
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { .. } => Mat4::look_at_rh(self.position(), self.target, Vec3::Y),
            // Looking straight down, so "up" on screen is world -Z.
            Projection::TopDown { .. } => Mat4::look_at_rh(self.position(), self.target, Vec3::NEG_Z),
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y } => Mat4::perspective_rh(fov_y, self.aspect, self.near, self.far),
            Projection::TopDown { height, .. } => {
                let half_h = height * 0.5;
                let half_w = half_h * self.aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    fn clamp(&mut self) {
        let max_phi = std::f32::consts::PI - self.min_phi;
        self.phi = self.phi.clamp(self.min_phi, max_phi.max(self.min_phi));
        self.distance = self.distance.clamp(self.min_distance, self.max_distance.max(self.min_distance));
    }

    // Offset from target to eye for the current spherical angles.
    fn eye_offset(&self) -> Vec3 {
        Vec3::new(
            self.distance * self.phi.sin() * self.theta.cos(),
            self.distance * self.phi.cos(),
            self.distance * self.phi.sin() * self.theta.sin(),
        )
    }
}

impl CameraView for OrbitCamera {
    fn position(&self) -> Vec3 {
        match self.projection {
            Projection::Perspective { .. } => self.target + self.eye_offset(),
            Projection::TopDown { altitude, .. } => self.target + Vec3::Y * altitude,
        }
    }

    fn view_direction(&self) -> Vec3 {
        (self.target - self.position()).normalize_or_zero()
    }

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::math::distance_to_segment;

    fn config() -> CameraConfig {
        CameraConfig::default()
    }

    #[test]
    fn test_project_unproject_round_trip() {
        let camera = OrbitCamera::physics(&config());
        let point = Vec3::new(1.5, 2.0, -0.5);
        let ndc = camera.project(point);
        assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);

        let ray = camera.unproject_ray(ndc.truncate());
        let far = ray.at(1000.0);
        assert!(distance_to_segment(point, ray.origin, far) < 1e-3);
    }

    #[test]
    fn test_centre_ray_follows_view_direction() {
        let camera = OrbitCamera::boids(&config());
        let ray = camera.unproject_ray(Vec2::ZERO);
        assert!((ray.direction - camera.view_direction()).length() < 1e-4);
        assert!((camera.position().length() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_clamps_polar_angle() {
        let mut camera = OrbitCamera::physics(&config());
        camera.orbit(0.0, 10_000.0);
        assert!((camera.phi() - (std::f32::consts::PI - 0.1)).abs() < 1e-6);
        camera.orbit(0.0, -10_000.0);
        assert!((camera.phi() - 0.1).abs() < 1e-6);
        assert!(camera.position().is_finite());
    }

    #[test]
    fn test_zoom_modes_clamp() {
        let mut physics = OrbitCamera::physics(&config());
        physics.zoom(100.0);
        assert!((physics.distance() - 15.0 * 1.1).abs() < 1e-4);
        physics.zoom(1e6);
        assert_eq!(physics.distance(), 50.0);

        let mut islands = OrbitCamera::islands(&config(), 100.0);
        islands.set_top_down(None);
        islands.zoom(-1000.0);
        assert!((islands.distance() - 40.0).abs() < 1e-4);
        islands.zoom(-1e6);
        assert_eq!(islands.distance(), 10.0);
    }

    #[test]
    fn test_top_down_rays_point_straight_down() {
        let mut camera = OrbitCamera::islands(&config(), 100.0);
        camera.set_aspect(800, 800);
        assert!(camera.is_top_down());
        let ray = camera.unproject_ray(Vec2::new(0.5, 0.5));
        assert!((ray.direction - Vec3::NEG_Y).length() < 1e-4);
        // Half of the 100-unit map is visible each side of the centre.
        assert!((ray.origin.x - 25.0).abs() < 1e-3);
        assert!((ray.origin.z + 25.0).abs() < 1e-3);

        camera.orbit(50.0, 50.0);
        assert!((camera.theta - 0.785).abs() < 1e-6);
    }

    #[test]
    fn test_screen_ndc_conversion() {
        let ndc = screen_to_ndc(0.0, 0.0, 800.0, 600.0);
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let back = ndc_to_screen(screen_to_ndc(200.0, 450.0, 800.0, 600.0), 800.0, 600.0);
        assert!((back - Vec2::new(200.0, 450.0)).length() < 1e-3);
    }
}
