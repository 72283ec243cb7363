use codeblocks::engine::config::FlockingConfig;
use codeblocks::engine::flocking::{Agent, FlockingEngine};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn line_of_three() -> FlockingEngine {
    let cfg = FlockingConfig::default();
    let agents = [-0.5, 0.0, 0.5]
        .into_iter()
        .map(|x| Agent::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO, &cfg))
        .collect();
    FlockingEngine::with_agents(cfg, agents)
}

#[test]
fn collinear_middle_agent_is_balanced() {
    let engine = line_of_three();
    let middle = engine.steering(1).weighted(engine.config());
    assert!(middle.length() < 1e-6);
}

#[test]
fn collinear_outer_agents_drift_outward() {
    let mut engine = line_of_three();

    // Separation -0.03 * 1.5 outweighs cohesion +0.03 * 1.0.
    let left = engine.steering(0).weighted(engine.config());
    assert!((left - Vec3::new(-0.015, 0.0, 0.0)).length() < 1e-6);
    let right = engine.steering(2).weighted(engine.config());
    assert!((right - Vec3::new(0.015, 0.0, 0.0)).length() < 1e-6);

    engine.update(1.0 / 60.0);
    let agents = engine.agents();
    assert!(agents[0].velocity.x < 0.0 && agents[0].position.x < -0.5);
    assert!(agents[2].velocity.x > 0.0 && agents[2].position.x > 0.5);
    assert!(agents[1].velocity.length() < 1e-6);
}

#[test]
fn isolated_agent_keeps_velocity() {
    let cfg = FlockingConfig::default();
    let agent = Agent::new(Vec3::new(2.0, 1.0, -3.0), Vec3::new(0.0, 0.5, 0.5), &cfg);
    let mut engine = FlockingEngine::with_agents(cfg, vec![agent]);
    for _ in 0..10 {
        engine.update(1.0 / 60.0);
    }
    assert!((engine.agents()[0].velocity - Vec3::new(0.0, 0.5, 0.5)).length() < 1e-6);
}

#[test]
fn speed_and_steering_limits_hold_over_a_long_run() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut engine = FlockingEngine::spawn_random(FlockingConfig::default(), &mut rng);
    engine.set_attractor(Some(Vec3::new(3.0, 2.0, 0.0)));
    for _ in 0..300 {
        engine.update(1.0 / 60.0);
    }
    for (i, agent) in engine.agents().iter().enumerate() {
        assert!(agent.velocity.length() <= agent.max_speed + 1e-5);
        assert!(agent.position.is_finite());
        let s = engine.steering(i);
        assert!(s.separation.length() <= agent.max_force + 1e-6);
        assert!(s.boundary.length() <= 2.0 * agent.max_force + 1e-6);
        assert!(s.attraction.length() <= agent.max_force + 1e-6);
    }
}

#[test]
fn update_does_not_depend_on_agent_order() {
    let cfg = FlockingConfig::default();
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.6, 0.2, 0.0),
        Vec3::new(-0.4, 0.5, 0.3),
        Vec3::new(1.2, -0.3, 0.8),
    ];
    let agents: Vec<Agent> = positions
        .iter()
        .map(|p| Agent::new(*p, Vec3::new(0.1, 0.0, -0.1), &cfg))
        .collect();
    let mut reversed = agents.clone();
    reversed.reverse();

    let mut a = FlockingEngine::with_agents(cfg.clone(), agents);
    let mut b = FlockingEngine::with_agents(cfg, reversed);
    a.update(1.0 / 60.0);
    b.update(1.0 / 60.0);

    for (x, y) in a.agents().iter().zip(b.agents().iter().rev()) {
        assert!((x.position - y.position).length() < 1e-6);
        assert!((x.velocity - y.velocity).length() < 1e-6);
    }
}
