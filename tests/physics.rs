use codeblocks::engine::components::Tint;
use codeblocks::engine::config::PhysicsConfig;
use codeblocks::engine::physics::PhysicsWorld;
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

#[test]
fn dropped_sphere_bounces_with_its_restitution() {
    let mut world = PhysicsWorld::new(&PhysicsConfig::default(), 1);
    let id = world.spawn_sphere(Vec3::new(0.0, 10.0, 0.0), 1.0, Tint::hex(0xff4444));

    let mut previous = 0.0;
    for _ in 0..300 {
        world.step(DT);
        let vy = world.body(id).unwrap().velocity.linear.y;
        if previous < 0.0 && vy > 0.0 {
            // Air friction trims the free-fall speed below sqrt(2 * 9.81 * 9).
            assert!(previous < -5.0);
            let ratio = vy / -previous;
            assert!((ratio - 0.6).abs() < 0.6 * 0.05, "bounce ratio {ratio}");
            assert!((world.body(id).unwrap().transform.position.y - 1.0).abs() < 1e-6);
            return;
        }
        previous = vy;
    }
    panic!("sphere never bounced");
}

#[test]
fn bodies_come_to_rest_on_the_ground() {
    let mut world = PhysicsWorld::new(&PhysicsConfig::default(), 2);
    world.populate_demo();
    for _ in 0..600 {
        world.step(DT);
    }
    for body in world.bodies() {
        assert!(body.transform.position.y >= body.shape.ground_offset() - 1e-4);
        assert!(body.velocity.linear.length() < 1.0);
    }
}

fn kinetic_energy(world: &mut PhysicsWorld) -> f32 {
    world
        .bodies()
        .iter()
        .map(|b| 0.5 * b.body.mass * b.velocity.linear.length_squared())
        .sum()
}

#[test]
fn head_on_collision_separates_and_loses_energy() {
    let config = PhysicsConfig { gravity: Vec3::ZERO, ..PhysicsConfig::default() };
    let mut world = PhysicsWorld::new(&config, 3);
    let a = world.spawn_sphere(Vec3::new(-3.0, 10.0, 0.0), 1.0, Tint::hex(0xff0000));
    let b = world.spawn_sphere(Vec3::new(3.0, 10.0, 0.0), 1.0, Tint::hex(0x0000ff));
    world.set_velocity(a, Vec3::new(4.0, 0.0, 0.0));
    world.set_velocity(b, Vec3::new(-4.0, 0.0, 0.0));

    let initial = kinetic_energy(&mut world);
    let mut last = initial;
    for _ in 0..120 {
        world.step(DT);
        let pa = world.body(a).unwrap().transform.position;
        let pb = world.body(b).unwrap().transform.position;
        assert!(pa.distance(pb) >= 2.0 - 1e-3);
        let energy = kinetic_energy(&mut world);
        assert!(energy <= last + 1e-3);
        last = energy;
    }

    let va = world.body(a).unwrap().velocity.linear;
    let vb = world.body(b).unwrap().velocity.linear;
    assert!(va.x < 0.0 && vb.x > 0.0);
    assert!(last < initial * 0.5);
}

#[test]
fn static_body_blocks_without_moving() {
    use codeblocks::engine::components::BodyKind;
    use codeblocks::engine::physics::BodyDesc;

    let config = PhysicsConfig { gravity: Vec3::ZERO, ..PhysicsConfig::default() };
    let mut world = PhysicsWorld::new(&config, 4);
    let wall = world.spawn(
        BodyDesc::sphere(1.0, &config)
            .with_kind(BodyKind::Static)
            .at(Vec3::new(0.0, 5.0, 0.0)),
    );
    let ball = world.spawn_sphere(Vec3::new(-3.0, 5.0, 0.0), 0.5, Tint::hex(0xffffff));
    world.set_velocity(ball, Vec3::new(5.0, 0.0, 0.0));

    for _ in 0..60 {
        world.step(DT);
        let pw = world.body(wall).unwrap().transform.position;
        let pb = world.body(ball).unwrap().transform.position;
        assert_eq!(pw, Vec3::new(0.0, 5.0, 0.0));
        assert!(pw.distance(pb) >= 1.5 - 1e-3);
    }
    assert!(world.body(ball).unwrap().velocity.linear.x < 0.0);
}
