// Demo lifecycle and scene output.
//
// `Showcase` owns exactly one running demo. Switching tears the old one down
// and builds the new one from config; pausing stops stepping but keeps state.
// Each frame the host asks the demo for `SceneInstance`s (mesh kind, model
// matrix, colour) and, for the island, a freshly built terrain mesh.

use std::time::Instant;

use glam::{Mat4, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::camera::OrbitCamera;
use super::clock::FrameClock;
use super::commands::Playground;
use super::components::Tint;
use super::config::{FlockingConfig, SimConfig};
use super::controller::{
    BoidsController, IslandsController, Key, KeyPress, PhysicsController, PointerEvent, Viewport,
};
use super::flocking::FlockingEngine;
use super::mesh::{RenderMesh, triangulate_smooth};
use super::shapes::Shape;
use super::terrain::{Biome, Heightmap, TerrainGenerator};

/// Playground floor edge length.
const GROUND_SIZE: f32 = 50.0;
const GROUND_TINT: u32 = 0x808080;
/// Water extends past the island by this factor.
const WATER_SCALE: f32 = 1.5;

// ============================================================================
// SCENE OUTPUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoKind {
    Boids,
    Islands,
    Physics,
}

impl DemoKind {
    pub const ALL: [DemoKind; 3] = [DemoKind::Boids, DemoKind::Islands, DemoKind::Physics];

    pub fn label(self) -> &'static str {
        match self {
            DemoKind::Boids => "Boids",
            DemoKind::Islands => "Islands",
            DemoKind::Physics => "Physics",
        }
    }
}

/// Shared meshes the viewer uploads once; `Terrain` is rebuilt on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Cone,
    Sphere,
    Cube,
    Plane,
    Terrain,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneInstance {
    pub mesh: MeshKind,
    pub model: Mat4,
    /// Linear RGBA; multiplied with the mesh's vertex colour.
    pub color: [f32; 4],
}

/// Directional light steered by Shift+drag in the playground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunLight {
    pub azimuth: f32,
    pub elevation: f32,
}

impl Default for SunLight {
    fn default() -> Self {
        Self { azimuth: 0.785, elevation: 0.9 }
    }
}

impl SunLight {
    /// Unit vector from the scene toward the sun.
    pub fn direction(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        Vec3::new(cos_el * self.azimuth.cos(), sin_el, cos_el * self.azimuth.sin())
    }

    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.azimuth += dx * 0.01;
        self.elevation = (self.elevation - dy * 0.01).clamp(0.1, 1.5);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoStats {
    pub objects: usize,
    pub detail: String,
}

// ============================================================================
// DEMO TRAIT
// ============================================================================

pub trait Demo {
    fn kind(&self) -> DemoKind;
    fn camera(&self) -> &OrbitCamera;
    fn camera_mut(&mut self) -> &mut OrbitCamera;
    fn update(&mut self, dt: f32);
    fn pointer(&mut self, event: &PointerEvent, viewport: Viewport);
    fn key(&mut self, key: &KeyPress);
    fn instances(&mut self, out: &mut Vec<SceneInstance>);
    fn stats(&mut self) -> DemoStats;

    /// New terrain geometry, returned once per regeneration.
    fn take_dirty_mesh(&mut self) -> Option<RenderMesh> {
        None
    }

    fn light(&self) -> Vec3 {
        SunLight::default().direction()
    }

    /// Live-tunable flock weights, for the overlay sliders.
    fn flocking_mut(&mut self) -> Option<&mut FlockingConfig> {
        None
    }

    /// World-space points of the cut being drawn, if any.
    fn cut_path(&self) -> Option<&[Vec3]> {
        None
    }

    fn teardown(&mut self) {}
}

pub fn start_demo(kind: DemoKind, config: &SimConfig) -> Box<dyn Demo> {
    log::info!("starting {} demo", kind.label());
    match kind {
        DemoKind::Boids => Box::new(BoidsDemo::new(config)),
        DemoKind::Islands => Box::new(IslandsDemo::new(config)),
        DemoKind::Physics => Box::new(PhysicsDemo::new(config)),
    }
}

// ============================================================================
// BOIDS
// ============================================================================

pub struct BoidsDemo {
    engine: FlockingEngine,
    camera: OrbitCamera,
    controller: BoidsController,
}

impl BoidsDemo {
    pub fn new(config: &SimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        Self {
            engine: FlockingEngine::spawn_random(config.flocking.clone(), &mut rng),
            camera: OrbitCamera::boids(&config.camera),
            controller: BoidsController::default(),
        }
    }

    pub fn engine(&self) -> &FlockingEngine {
        &self.engine
    }
}

impl Demo for BoidsDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Boids
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    fn update(&mut self, dt: f32) {
        self.engine.update(dt);
    }

    fn pointer(&mut self, event: &PointerEvent, viewport: Viewport) {
        self.controller.pointer(event, viewport, &mut self.camera, &mut self.engine);
    }

    fn key(&mut self, _key: &KeyPress) {}

    fn instances(&mut self, out: &mut Vec<SceneInstance>) {
        out.extend(self.engine.agents().iter().map(|agent| SceneInstance {
            mesh: MeshKind::Cone,
            model: Mat4::from_rotation_translation(agent.heading(), agent.position),
            color: agent.tint().to_array(1.0),
        }));
    }

    fn stats(&mut self) -> DemoStats {
        DemoStats {
            objects: self.engine.agents().len(),
            detail: match self.engine.attractor() {
                Some(p) => format!("attractor ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z),
                None => "attractor off".to_string(),
            },
        }
    }

    fn flocking_mut(&mut self) -> Option<&mut FlockingConfig> {
        Some(self.engine.config_mut())
    }
}

// ============================================================================
// ISLANDS
// ============================================================================

pub struct IslandsDemo {
    generator: TerrainGenerator,
    map: Heightmap,
    camera: OrbitCamera,
    controller: IslandsController,
    seeds: StdRng,
    dirty: bool,
    elapsed: f32,
}

impl IslandsDemo {
    pub fn new(config: &SimConfig) -> Self {
        let generator = TerrainGenerator::new(config.terrain.clone(), config.seed);
        let map = generator.generate();
        Self {
            camera: OrbitCamera::islands(&config.camera, config.terrain.size as f32),
            generator,
            map,
            controller: IslandsController::default(),
            seeds: StdRng::seed_from_u64(config.seed),
            dirty: true,
            elapsed: 0.0,
        }
    }

    pub fn map(&self) -> &Heightmap {
        &self.map
    }

    /// Build a new island from a fresh seed.
    pub fn regenerate(&mut self) {
        let seed = self.seeds.gen_range(0..u64::MAX);
        self.generator.reseed(seed);
        self.map = self.generator.generate();
        self.dirty = true;
    }

    fn map_size(&self) -> f32 {
        self.generator.config().size as f32
    }
}

impl Demo for IslandsDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Islands
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    // Only the water moves.
    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    fn pointer(&mut self, event: &PointerEvent, _viewport: Viewport) {
        self.controller.pointer(event, &mut self.camera);
    }

    fn key(&mut self, key: &KeyPress) {
        let size = self.map_size();
        if self.controller.key(key, &mut self.camera, size) {
            self.regenerate();
        }
    }

    fn instances(&mut self, out: &mut Vec<SceneInstance>) {
        out.push(SceneInstance {
            mesh: MeshKind::Terrain,
            model: Mat4::IDENTITY,
            color: [1.0, 1.0, 1.0, 1.0],
        });
        let water = self.map_size() * WATER_SCALE;
        out.push(SceneInstance {
            mesh: MeshKind::Plane,
            model: Mat4::from_scale_rotation_translation(
                Vec3::new(water, 1.0, water),
                Quat::IDENTITY,
                Vec3::new(0.0, self.generator.config().sea_level, 0.0),
            ),
            color: Biome::Water.color().to_array(0.6 + self.elapsed.sin() * 0.1),
        });
    }

    fn take_dirty_mesh(&mut self) -> Option<RenderMesh> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(triangulate_smooth(&self.map.to_poly_mesh()))
    }

    fn stats(&mut self) -> DemoStats {
        let size = self.map.size();
        DemoStats {
            objects: size * size,
            detail: format!(
                "seed {}  peak {:.1}  {}",
                self.generator.seed(),
                self.map.max_height(),
                if self.camera.is_top_down() { "top-down" } else { "perspective" }
            ),
        }
    }
}

// ============================================================================
// PHYSICS
// ============================================================================

pub struct PhysicsDemo {
    playground: Playground,
    camera: OrbitCamera,
    controller: PhysicsController,
    sun: SunLight,
}

impl PhysicsDemo {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            playground: Playground::new(config),
            camera: OrbitCamera::physics(&config.camera),
            controller: PhysicsController::new(),
            sun: SunLight::default(),
        }
    }

    pub fn playground(&self) -> &Playground {
        &self.playground
    }

    pub fn playground_mut(&mut self) -> &mut Playground {
        &mut self.playground
    }
}

impl Demo for PhysicsDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Physics
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    fn update(&mut self, dt: f32) {
        self.playground.update(&self.camera, dt);
    }

    fn pointer(&mut self, event: &PointerEvent, viewport: Viewport) {
        self.controller
            .pointer(event, viewport, &mut self.camera, &mut self.playground, &mut self.sun);
    }

    fn key(&mut self, key: &KeyPress) {
        self.controller.key(key, &mut self.playground);
    }

    fn instances(&mut self, out: &mut Vec<SceneInstance>) {
        let ground = self.playground.world().config().ground_level;
        out.push(SceneInstance {
            mesh: MeshKind::Plane,
            model: Mat4::from_scale_rotation_translation(
                Vec3::new(GROUND_SIZE, 1.0, GROUND_SIZE),
                Quat::IDENTITY,
                Vec3::new(0.0, ground, 0.0),
            ),
            color: Tint::hex(GROUND_TINT).to_array(1.0),
        });

        for body in self.playground.world_mut().bodies() {
            let color = body.tint.to_array(1.0);
            let (rotation, position) = (body.transform.rotation, body.transform.position);
            match &body.shape {
                Shape::Sphere { radius } => out.push(SceneInstance {
                    mesh: MeshKind::Sphere,
                    model: Mat4::from_scale_rotation_translation(Vec3::splat(*radius), rotation, position),
                    color,
                }),
                Shape::Box { size } => out.push(SceneInstance {
                    mesh: MeshKind::Cube,
                    model: Mat4::from_scale_rotation_translation(*size, rotation, position),
                    color,
                }),
                Shape::Compound { parts } => {
                    for (i, part) in parts.iter().enumerate() {
                        let scale = body.part_scales.get(i).copied().unwrap_or(1.0);
                        out.push(SceneInstance {
                            mesh: MeshKind::Sphere,
                            model: Mat4::from_scale_rotation_translation(
                                Vec3::splat(part.radius * scale),
                                rotation,
                                body.transform.transform_point(part.offset),
                            ),
                            color,
                        });
                    }
                }
            }
        }
    }

    fn light(&self) -> Vec3 {
        self.sun.direction()
    }

    fn cut_path(&self) -> Option<&[Vec3]> {
        let tool = self.playground.cut_tool();
        tool.is_drawing().then(|| tool.path().points())
    }

    fn stats(&mut self) -> DemoStats {
        let objects = self.playground.world_mut().len();
        DemoStats {
            objects,
            detail: format!(
                "cuts {}  mode {}",
                self.playground.cut_count(),
                if self.controller.cutting() { "cut" } else { "drag" }
            ),
        }
    }

    fn teardown(&mut self) {
        self.playground.push(super::commands::Command::EndDrag);
        self.playground.push(super::commands::Command::CancelCut);
        self.playground.process_commands(&self.camera);
    }
}

// ============================================================================
// SHOWCASE
// ============================================================================

pub struct Showcase {
    config: SimConfig,
    demo: Box<dyn Demo>,
    clock: FrameClock,
    paused: bool,
}

impl Showcase {
    pub fn new(config: SimConfig, kind: DemoKind) -> Self {
        let demo = start_demo(kind, &config);
        let clock = FrameClock::new(60.0, config.physics.time_step);
        Self { config, demo, clock, paused: false }
    }

    pub fn kind(&self) -> DemoKind {
        self.demo.kind()
    }

    pub fn demo(&self) -> &dyn Demo {
        self.demo.as_ref()
    }

    pub fn demo_mut(&mut self) -> &mut dyn Demo {
        self.demo.as_mut()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Tear the current demo down and start `kind`, unpaused.
    pub fn switch(&mut self, kind: DemoKind) {
        if kind == self.kind() {
            return;
        }
        let aspect = self.demo.camera().aspect;
        self.demo.teardown();
        self.demo = start_demo(kind, &self.config);
        self.demo.camera_mut().aspect = aspect;
        self.paused = false;
        self.clock.reset();
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::info!("{} paused", self.kind().label());
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::info!("{} resumed", self.kind().label());
            self.clock.reset();
        }
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        if self.paused { self.resume() } else { self.pause() }
    }

    /// Step the demo if one is due at `now`. Returns whether it stepped.
    pub fn frame_at(&mut self, now: Instant) -> bool {
        if self.paused {
            return false;
        }
        match self.clock.tick_at(now) {
            Some(dt) => {
                self.demo.update(dt);
                true
            }
            None => false,
        }
    }

    pub fn pointer(&mut self, event: &PointerEvent, viewport: Viewport) {
        if !self.paused {
            self.demo.pointer(event, viewport);
        }
    }

    /// Global keys (`1`/`2`/`3` switch, `P` pauses), else the demo's own.
    pub fn key(&mut self, key: &KeyPress) {
        match key.key {
            Key::Char('1') => self.switch(DemoKind::Boids),
            Key::Char('2') => self.switch(DemoKind::Islands),
            Key::Char('3') => self.switch(DemoKind::Physics),
            Key::Char('p') | Key::Char('P') => self.toggle_pause(),
            _ if !self.paused => self.demo.key(key),
            _ => {}
        }
    }
}
