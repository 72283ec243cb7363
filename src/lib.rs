// codeblocks: boids flocking, procedural islands and a cuttable physics
// playground, with a small wgpu viewer in main.rs.

pub mod engine;
