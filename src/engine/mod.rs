// Engine module - simulation cores, camera, input, and viewer support.
//
// Leaves first: math/noise/shapes feed flocking, physics and terrain;
// cutting and commands sit on the physics world; controller and showcase
// tie demos to input; mesh and debug_overlay serve the viewer.

pub mod camera;
pub mod clock;
pub mod collision;
pub mod commands;
pub mod components;
pub mod config;
pub mod controller;
pub mod cutting;
pub mod debug_overlay;
pub mod error;
pub mod flocking;
pub mod input;
pub mod math;
pub mod mesh;
pub mod noise;
pub mod physics;
pub mod shapes;
pub mod showcase;
pub mod systems;
pub mod terrain;

pub use camera::{CameraView, OrbitCamera};
pub use commands::{Command, Playground};
pub use config::SimConfig;
pub use error::ConfigError;
pub use physics::{BodyDesc, BodyId, PhysicsWorld};
pub use showcase::{DemoKind, Showcase};
