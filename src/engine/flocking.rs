// Boids flocking: separation, alignment, cohesion, soft walls, and an
// optional attractor point.
//
// Every tick reads the previous tick's agents as an immutable snapshot and
// writes new velocities/positions afterwards, so the result does not depend
// on iteration order. O(n²) neighbour search; fine for a few hundred agents.

use glam::{Quat, Vec3};
use rand::Rng;

use super::components::Tint;
use super::config::FlockingConfig;
use super::math::{random_spread, steer};

/// Speeds below this keep the previous heading.
const HEADING_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Accumulated steering, cleared after each integration.
    pub acceleration: Vec3,
    pub max_speed: f32,
    pub max_force: f32,
}

impl Agent {
    pub fn new(position: Vec3, velocity: Vec3, config: &FlockingConfig) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            max_speed: config.max_speed,
            max_force: config.max_force,
        }
    }

    /// Rotation taking the +Y axis onto the direction of travel.
    pub fn heading(&self) -> Quat {
        if self.velocity.length() > HEADING_EPSILON {
            Quat::from_rotation_arc(Vec3::Y, self.velocity.normalize())
        } else {
            Quat::IDENTITY
        }
    }

    /// Top-down colour wheel: hue from the agent's angle around the Y axis.
    pub fn hue(&self) -> f32 {
        (self.position.z.atan2(self.position.x) + std::f32::consts::PI) / std::f32::consts::TAU
    }

    pub fn tint(&self) -> Tint {
        Tint::from_hsl(self.hue(), 0.7, 0.6)
    }

    fn seek(&self, target: Vec3) -> Vec3 {
        steer(target - self.position, self.velocity, self.max_speed, self.max_force)
    }
}

/// Unweighted steering terms for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    pub separation: Vec3,
    pub alignment: Vec3,
    pub cohesion: Vec3,
    pub boundary: Vec3,
    pub attraction: Vec3,
}

impl Steering {
    pub fn weighted(&self, config: &FlockingConfig) -> Vec3 {
        self.separation * config.separation_weight
            + self.alignment * config.alignment_weight
            + self.cohesion * config.cohesion_weight
            + self.boundary * config.boundary_weight
            + self.attraction * config.attraction_weight
    }
}

pub struct FlockingEngine {
    config: FlockingConfig,
    agents: Vec<Agent>,
    attractor: Option<Vec3>,
}

impl FlockingEngine {
    pub fn new(config: FlockingConfig) -> Self {
        Self::with_agents(config, Vec::new())
    }

    pub fn with_agents(config: FlockingConfig, agents: Vec<Agent>) -> Self {
        Self { config, agents, attractor: None }
    }

    /// `config.agent_count` agents scattered in a cube of edge
    /// `spawn_extent` with small random velocities.
    pub fn spawn_random<R: Rng + ?Sized>(config: FlockingConfig, rng: &mut R) -> Self {
        let agents = (0..config.agent_count)
            .map(|_| {
                let position = random_spread(rng, config.spawn_extent * 0.5);
                let velocity = random_spread(rng, config.spawn_speed * 0.5);
                Agent::new(position, velocity, &config)
            })
            .collect::<Vec<_>>();
        log::info!("spawned {} boids", agents.len());
        Self::with_agents(config, agents)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn config(&self) -> &FlockingConfig {
        &self.config
    }

    /// Live-tune weights and radii; agents keep their own speed limits.
    pub fn config_mut(&mut self) -> &mut FlockingConfig {
        &mut self.config
    }

    pub fn attractor(&self) -> Option<Vec3> {
        self.attractor
    }

    /// Point every agent seeks with `attraction_weight`; `None` disables it.
    pub fn set_attractor(&mut self, target: Option<Vec3>) {
        self.attractor = target;
    }

    /// Steering terms agent `index` would receive from the current state.
    pub fn steering(&self, index: usize) -> Steering {
        let agent = &self.agents[index];
        let cfg = &self.config;

        let mut away = Vec3::ZERO;
        let mut separating = 0usize;
        let mut heading_sum = Vec3::ZERO;
        let mut centre_sum = Vec3::ZERO;
        let mut neighbours = 0usize;

        for other in &self.agents {
            let d = agent.position.distance(other.position);
            if d <= 0.0 {
                continue;
            }
            if d < cfg.separation_radius {
                away += (agent.position - other.position).normalize_or_zero() / d;
                separating += 1;
            }
            if d < cfg.neighbor_radius {
                heading_sum += other.velocity;
                centre_sum += other.position;
                neighbours += 1;
            }
        }

        let separation = if separating > 0 {
            steer(away / separating as f32, agent.velocity, agent.max_speed, agent.max_force)
        } else {
            Vec3::ZERO
        };

        let (alignment, cohesion) = if neighbours > 0 {
            let n = neighbours as f32;
            (
                steer(heading_sum / n, agent.velocity, agent.max_speed, agent.max_force),
                agent.seek(centre_sum / n),
            )
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };

        Steering {
            separation,
            alignment,
            cohesion,
            boundary: self.boundary_steer(agent),
            attraction: self.attractor.map(|t| agent.seek(t)).unwrap_or(Vec3::ZERO),
        }
    }

    /// Linear push back from each wall once inside the margin, allowed twice
    /// the usual force.
    fn boundary_steer(&self, agent: &Agent) -> Vec3 {
        let inner = self.config.boundary - self.config.boundary_margin;
        let margin = self.config.boundary_margin;
        let push = |p: f32| {
            if p > inner {
                -(p - inner) / margin
            } else if p < -inner {
                -(p + inner) / margin
            } else {
                0.0
            }
        };
        let wall = Vec3::new(push(agent.position.x), push(agent.position.y), push(agent.position.z));
        if wall == Vec3::ZERO {
            return Vec3::ZERO;
        }
        steer(wall, agent.velocity, agent.max_speed, agent.max_force * 2.0)
    }

    /// Advance every agent by one tick of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let accelerations: Vec<Vec3> = (0..self.agents.len())
            .map(|i| self.steering(i).weighted(&self.config))
            .collect();

        for (agent, acceleration) in self.agents.iter_mut().zip(accelerations) {
            agent.acceleration += acceleration;
            agent.velocity = (agent.velocity + agent.acceleration).clamp_length_max(agent.max_speed);
            agent.position += agent.velocity * dt;
            agent.acceleration = Vec3::ZERO;
        }
    }
}
