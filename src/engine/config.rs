// Tunable constants for every engine, grouped per subsystem.
//
// Each section derives `Deserialize` with `#[serde(default)]`, so a TOML file
// only needs to name the values it overrides:
//
//   seed = 7
//   [flocking]
//   separation_weight = 2.0
//   [physics]
//   gravity = [0.0, -3.0, 0.0]

use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use super::error::ConfigError;

// ============================================================================
// TOP LEVEL
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every random term in the physics and cutting engines.
    pub seed: u64,
    pub flocking: FlockingConfig,
    pub physics: PhysicsConfig,
    pub cutting: CutConfig,
    pub terrain: TerrainConfig,
    pub camera: CameraConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            flocking: FlockingConfig::default(),
            physics: PhysicsConfig::default(),
            cutting: CutConfig::default(),
            terrain: TerrainConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl SimConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reject values that would make an engine divide by zero or loop forever.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let f = &self.flocking;
        if f.max_speed <= 0.0 {
            return Err(invalid("flocking.max_speed", "must be positive"));
        }
        if f.max_force < 0.0 {
            return Err(invalid("flocking.max_force", "must not be negative"));
        }
        if f.boundary_margin <= 0.0 {
            return Err(invalid("flocking.boundary_margin", "must be positive"));
        }

        let p = &self.physics;
        if p.time_step <= 0.0 {
            return Err(invalid("physics.time_step", "must be positive"));
        }
        if !(0.0..=1.0).contains(&p.air_friction) {
            return Err(invalid("physics.air_friction", "must lie in [0, 1]"));
        }
        if p.boundary <= 0.0 {
            return Err(invalid("physics.boundary", "must be positive"));
        }

        let c = &self.cutting;
        if c.min_fragments > c.max_fragments {
            return Err(invalid(
                "cutting.min_fragments",
                format!("{} exceeds max_fragments {}", c.min_fragments, c.max_fragments),
            ));
        }
        for (field, fraction) in [
            ("cutting.sphere_mass_fraction", c.sphere_mass_fraction),
            ("cutting.box_mass_fraction", c.box_mass_fraction),
            ("cutting.compound_mass_fraction", c.compound_mass_fraction),
        ] {
            if fraction <= 0.0 {
                return Err(invalid(field, "must be positive"));
            }
        }

        let t = &self.terrain;
        if t.size < 2 {
            return Err(invalid("terrain.size", "needs at least 2 samples per side"));
        }
        if t.octaves == 0 {
            return Err(invalid("terrain.octaves", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

// ============================================================================
// FLOCKING
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FlockingConfig {
    pub agent_count: usize,
    pub max_speed: f32,
    pub max_force: f32,
    /// Neighbours closer than this push the agent away.
    pub separation_radius: f32,
    /// Neighbours closer than this take part in alignment and cohesion.
    pub neighbor_radius: f32,
    /// Half extent of the cubic flight volume.
    pub boundary: f32,
    /// Distance from the boundary at which agents start turning back.
    pub boundary_margin: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub boundary_weight: f32,
    pub attraction_weight: f32,
    /// Distance along the pointer ray at which the attractor is placed.
    pub attraction_distance: f32,
    /// Agents spawn uniformly inside a cube of this edge length.
    pub spawn_extent: f32,
    /// Initial velocity components are drawn from [-spawn_speed/2, spawn_speed/2].
    pub spawn_speed: f32,
}

impl Default for FlockingConfig {
    fn default() -> Self {
        Self {
            agent_count: 200,
            max_speed: 2.0,
            max_force: 0.03,
            separation_radius: 1.0,
            neighbor_radius: 2.0,
            boundary: 8.0,
            boundary_margin: 2.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            boundary_weight: 2.0,
            attraction_weight: 0.3,
            attraction_distance: 10.0,
            spawn_extent: 10.0,
            spawn_speed: 2.0,
        }
    }
}

// ============================================================================
// PHYSICS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: Vec3,
    /// Fixed step handed to the world by the frame clock (seconds).
    pub time_step: f32,
    /// Per-tick multiplicative velocity decay.
    pub air_friction: f32,
    pub ground_level: f32,
    /// Half extent of the playground on X/Z and its ceiling on Y.
    pub boundary: f32,
    /// Velocity factor applied (with sign flip) when a body hits the boundary.
    pub boundary_damping: f32,
    /// Ground friction is applied as `1 - friction * dt * ground_friction_scale`.
    pub ground_friction_scale: f32,
    /// Horizontal speed above which landing bodies start rolling or tumbling.
    pub rolling_threshold: f32,
    pub rolling_factor: f32,
    pub tumble_factor: f32,
    /// Horizontal speed below which grounded bodies are damped to rest.
    pub rest_threshold: f32,
    pub rest_damping: f32,
    /// Spin decay applied on slow landings and while dragging.
    pub spin_decay: f32,
    /// Angular speeds below this are not integrated.
    pub angular_epsilon: f32,
    pub drag_strength: f32,
    pub drag_max_speed: f32,
    pub drag_lerp: f32,
    pub drag_stop_distance: f32,
    pub drag_brake: f32,
    /// Width of the random spin kick added on body-body contact.
    pub contact_spin: f32,
    /// Density used by the sphere and box presets.
    pub density: f32,
    pub soft_impact_scale: f32,
    pub soft_max_deformation: f32,
    pub soft_wobble: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            time_step: 1.0 / 60.0,
            air_friction: 0.995,
            ground_level: 0.0,
            boundary: 25.0,
            boundary_damping: 0.8,
            ground_friction_scale: 10.0,
            rolling_threshold: 0.5,
            rolling_factor: 0.3,
            tumble_factor: 0.5,
            rest_threshold: 0.1,
            rest_damping: 0.9,
            spin_decay: 0.8,
            angular_epsilon: 0.01,
            drag_strength: 20.0,
            drag_max_speed: 15.0,
            drag_lerp: 0.3,
            drag_stop_distance: 0.1,
            drag_brake: 0.8,
            contact_spin: 0.2,
            density: 800.0,
            soft_impact_scale: 0.15,
            soft_max_deformation: 0.4,
            soft_wobble: 0.05,
        }
    }
}

// ============================================================================
// CUTTING
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CutConfig {
    /// New path points closer than this to the previous one are dropped.
    pub min_point_spacing: f32,
    /// Fallback depth along the pointer ray when nothing is hit.
    pub projection_distance: f32,
    /// Hits farther than this from the drawn path are not cut.
    pub path_distance_threshold: f32,

    pub sphere_radius_ratio: f32,
    pub sphere_offset_ratio: f32,
    pub sphere_separation_speed: f32,
    pub sphere_spin: f32,
    pub sphere_mass_fraction: f32,

    pub box_extent_ratio: f32,
    pub box_offset_ratio: f32,
    pub box_separation_speed: f32,
    pub box_spin: f32,
    pub box_mass_fraction: f32,

    pub compound_scale: f32,
    pub compound_offset: f32,
    pub compound_separation_speed: f32,
    pub compound_spin: f32,
    pub compound_mass_fraction: f32,

    pub min_fragments: usize,
    pub max_fragments: usize,
    pub fragment_spin: f32,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            min_point_spacing: 0.1,
            projection_distance: 10.0,
            path_distance_threshold: 2.0,

            sphere_radius_ratio: 0.8,
            sphere_offset_ratio: 0.2,
            sphere_separation_speed: 1.5,
            sphere_spin: 1.0,
            sphere_mass_fraction: 0.5,

            box_extent_ratio: 0.6,
            box_offset_ratio: 0.15,
            box_separation_speed: 2.0,
            box_spin: 0.75,
            box_mass_fraction: 0.108,

            compound_scale: 0.7,
            compound_offset: 0.8,
            compound_separation_speed: 3.0,
            compound_spin: 2.0,
            compound_mass_fraction: 0.5,

            min_fragments: 2,
            max_fragments: 4,
            fragment_spin: 3.0,
        }
    }
}

// ============================================================================
// TERRAIN
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Samples per side; the island spans `size` world units.
    pub size: usize,
    pub octaves: u32,
    pub base_frequency: f32,
    pub height_scale: f32,
    /// Falloff radius as a fraction of `size`.
    pub falloff_ratio: f32,
    /// Cells beyond `water_cutoff * falloff radius` are forced to sea level.
    pub water_cutoff: f32,
    /// Maximum shift of biome thresholds from the secondary noise field.
    pub border_jitter: f32,
    pub sea_level: f32,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 100,
            octaves: 6,
            base_frequency: 0.01,
            height_scale: 20.0,
            falloff_ratio: 0.4,
            water_cutoff: 1.0,
            border_jitter: 0.5,
            sea_level: 0.0,
        }
    }
}

// ============================================================================
// CAMERA
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of orbit per pixel of pointer travel.
    pub orbit_speed: f32,
    /// Polar angle is kept inside [min_phi, PI - min_phi].
    pub min_phi: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            orbit_speed: 0.01,
            min_phi: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = SimConfig::from_toml_str(
            r#"
            seed = 7

            [flocking]
            separation_weight = 2.5

            [physics]
            gravity = [0.0, -3.0, 0.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.flocking.separation_weight, 2.5);
        assert_eq!(config.flocking.alignment_weight, 1.0);
        assert_eq!(config.physics.gravity, Vec3::new(0.0, -3.0, 0.0));
        assert_eq!(config.physics.air_friction, 0.995);
        assert_eq!(config.terrain.size, 100);
    }

    #[test]
    fn test_validate_rejects_inverted_fragment_range() {
        let mut config = SimConfig::default();
        config.cutting.min_fragments = 5;
        config.cutting.max_fragments = 3;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "cutting.min_fragments", .. }));
    }

    #[test]
    fn test_validate_rejects_tiny_terrain() {
        let mut config = SimConfig::default();
        config.terrain.size = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = SimConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
