// Physics playground: the world, the cutting tool, and the queue of input
// intents waiting to be applied to them.
//
// Input handlers only ever `push`; the queue is drained at the start of the
// next `update`, before the world steps, so a tick never observes a half-
// applied gesture.

use std::collections::VecDeque;

use glam::{Vec2, Vec3};

use super::camera::CameraView;
use super::config::SimConfig;
use super::cutting::{CutOutcome, CutTool};
use super::math::Plane;
use super::physics::{BodyDesc, BodyId, PhysicsWorld};

#[derive(Debug, Clone)]
pub enum Command {
    /// Grab `body` under the pointer at `ndc`.
    BeginDrag { body: BodyId, ndc: Vec2 },
    MoveDrag { ndc: Vec2 },
    EndDrag,
    /// Flip between pointer-drags-bodies and pointer-draws-cuts.
    ToggleCutMode,
    BeginCut { ndc: Vec2 },
    ExtendCutPath { ndc: Vec2 },
    ResolveCut,
    CancelCut,
    Spawn(BodyDesc),
    Reset,
}

/// Active drag: the body follows the pointer across a camera-facing plane
/// through the grab point.
#[derive(Debug, Clone, Copy)]
struct DragGrab {
    body: BodyId,
    plane: Plane,
    /// Body centre relative to the grab point.
    offset: Vec3,
}

pub struct Playground {
    world: PhysicsWorld,
    cut_tool: CutTool,
    cutting_mode: bool,
    drag: Option<DragGrab>,
    queue: VecDeque<Command>,
    cuts: usize,
}

impl Playground {
    /// A fresh world holding the demo scene.
    pub fn new(config: &SimConfig) -> Self {
        let mut world = PhysicsWorld::new(&config.physics, config.seed);
        world.populate_demo();
        Self::with_world(world, config)
    }

    pub fn with_world(world: PhysicsWorld, config: &SimConfig) -> Self {
        Self {
            world,
            cut_tool: CutTool::new(config.cutting.clone()),
            cutting_mode: false,
            drag: None,
            queue: VecDeque::new(),
            cuts: 0,
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn cut_tool(&self) -> &CutTool {
        &self.cut_tool
    }

    pub fn cutting_mode(&self) -> bool {
        self.cutting_mode
    }

    pub fn dragged_body(&self) -> Option<BodyId> {
        self.drag.map(|grab| grab.body)
    }

    /// Bodies cut since the playground was created.
    pub fn cut_count(&self) -> usize {
        self.cuts
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Nearest body under `ndc`, for deciding whether a press grabs or orbits.
    pub fn pick(&mut self, camera: &dyn CameraView, ndc: Vec2) -> Option<BodyId> {
        let ray = camera.unproject_ray(ndc);
        self.world.raycast(&ray).first().map(|hit| hit.body)
    }

    /// Drain and apply every queued command in order.
    pub fn process_commands(&mut self, camera: &dyn CameraView) -> Vec<CutOutcome> {
        let mut outcomes = Vec::new();
        while let Some(command) = self.queue.pop_front() {
            match command {
                Command::BeginDrag { body, ndc } => self.begin_drag(camera, body, ndc),
                Command::MoveDrag { ndc } => self.move_drag(camera, ndc),
                Command::EndDrag => self.end_drag(),
                Command::ToggleCutMode => {
                    self.cutting_mode = !self.cutting_mode;
                    if !self.cutting_mode {
                        self.cut_tool.cancel();
                    }
                    log::debug!("cutting mode {}", if self.cutting_mode { "on" } else { "off" });
                }
                Command::BeginCut { ndc } => {
                    if self.cutting_mode {
                        self.end_drag();
                        self.cut_tool.begin(&mut self.world, camera, ndc);
                    }
                }
                Command::ExtendCutPath { ndc } => {
                    self.cut_tool.extend(&mut self.world, camera, ndc);
                }
                Command::ResolveCut => {
                    let cut = self.cut_tool.resolve(&mut self.world, camera);
                    self.cuts += cut.len();
                    outcomes.extend(cut);
                }
                Command::CancelCut => self.cut_tool.cancel(),
                Command::Spawn(desc) => {
                    self.world.spawn(desc);
                }
                Command::Reset => {
                    self.end_drag();
                    self.cut_tool.cancel();
                    self.world.reset();
                }
            }
        }
        self.drop_stale_drag();
        outcomes
    }

    /// Apply queued input, then advance the world by `dt`.
    pub fn update(&mut self, camera: &dyn CameraView, dt: f32) -> Vec<CutOutcome> {
        let outcomes = self.process_commands(camera);
        self.world.step(dt);
        outcomes
    }

    fn begin_drag(&mut self, camera: &dyn CameraView, body: BodyId, ndc: Vec2) {
        self.end_drag();
        let ray = camera.unproject_ray(ndc);
        let Some(view) = self.world.body(body) else {
            return;
        };
        let grab_point = self
            .world
            .raycast_body(body, &ray)
            .map(|hit| hit.point)
            .unwrap_or(view.transform.position);
        let plane = Plane::from_normal_and_point(-camera.view_direction(), grab_point);
        if self.world.begin_drag(body, view.transform.position) {
            self.drag = Some(DragGrab {
                body,
                plane,
                offset: view.transform.position - grab_point,
            });
        }
    }

    fn move_drag(&mut self, camera: &dyn CameraView, ndc: Vec2) {
        let Some(grab) = self.drag else {
            return;
        };
        let ray = camera.unproject_ray(ndc);
        if let Some(point) = ray.intersect_plane(&grab.plane) {
            self.world.set_drag_target(grab.body, point + grab.offset);
        }
    }

    fn end_drag(&mut self) {
        if let Some(grab) = self.drag.take() {
            self.world.end_drag(grab.body);
        }
    }

    // A cut or reset can remove the body out from under the pointer.
    fn drop_stale_drag(&mut self) {
        if let Some(grab) = self.drag {
            if !self.world.contains(grab.body) {
                log::debug!("dropping drag of removed body {:?}", grab.body);
                self.drag = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::camera::OrbitCamera;
    use crate::engine::components::Tint;
    use crate::engine::config::CameraConfig;

    fn camera() -> OrbitCamera {
        OrbitCamera::physics(&CameraConfig::default())
    }

    fn empty_playground() -> Playground {
        let config = SimConfig::default();
        Playground::with_world(PhysicsWorld::new(&config.physics, config.seed), &config)
    }

    #[test]
    fn test_commands_wait_for_update() {
        let mut playground = empty_playground();
        let cfg = playground.world().config().clone();
        playground.push(Command::Spawn(BodyDesc::sphere(0.5, &cfg).at(Vec3::new(0.0, 3.0, 0.0))));
        assert_eq!(playground.pending(), 1);
        assert!(playground.world_mut().is_empty());

        playground.update(&camera(), 1.0 / 60.0);

        assert_eq!(playground.pending(), 0);
        assert_eq!(playground.world_mut().len(), 1);
    }

    #[test]
    fn test_pick_and_drag_body_under_pointer() {
        let mut playground = empty_playground();
        let start = Vec3::new(0.0, 3.0, 0.0);
        let id = playground.world_mut().spawn_sphere(start, 1.0, Tint::hex(0xff4444));
        let cam = camera();
        let ndc = cam.project(start).truncate();

        assert_eq!(playground.pick(&cam, ndc), Some(id));
        assert_eq!(playground.pick(&cam, Vec2::new(0.9, -0.9)), None);

        playground.push(Command::BeginDrag { body: id, ndc });
        playground.push(Command::MoveDrag { ndc: ndc + Vec2::new(0.0, 0.3) });
        playground.process_commands(&cam);
        assert_eq!(playground.dragged_body(), Some(id));
        assert!(playground.world().body(id).unwrap().dragged);

        for _ in 0..30 {
            playground.update(&cam, 1.0 / 60.0);
        }
        // Dragged upward on screen, so the body rose instead of falling.
        assert!(playground.world().body(id).unwrap().transform.position.y > 4.0);

        playground.push(Command::EndDrag);
        playground.process_commands(&cam);
        assert_eq!(playground.dragged_body(), None);
        assert!(!playground.world().body(id).unwrap().dragged);
    }

    #[test]
    fn test_cut_commands_ignored_outside_cutting_mode() {
        let mut playground = empty_playground();
        playground.world_mut().spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xff4444));
        let cam = camera();

        playground.push(Command::BeginCut { ndc: Vec2::new(-0.1, 0.0) });
        playground.push(Command::ExtendCutPath { ndc: Vec2::new(0.1, 0.0) });
        playground.push(Command::ResolveCut);
        assert!(playground.process_commands(&cam).is_empty());
        assert_eq!(playground.world_mut().len(), 1);
    }

    #[test]
    fn test_reset_drops_drag_and_restores_demo() {
        let mut playground = empty_playground();
        let id = playground.world_mut().spawn_sphere(Vec3::ZERO, 1.0, Tint::hex(0xff4444));
        let cam = camera();
        playground.push(Command::BeginDrag { body: id, ndc: Vec2::ZERO });
        playground.push(Command::Reset);
        playground.process_commands(&cam);

        assert_eq!(playground.dragged_body(), None);
        assert!(!playground.world().contains(id));
        assert_eq!(playground.world_mut().len(), 2);
    }

    #[test]
    fn test_toggle_off_cancels_stroke() {
        let mut playground = empty_playground();
        let cam = camera();
        playground.push(Command::ToggleCutMode);
        playground.push(Command::BeginCut { ndc: Vec2::ZERO });
        playground.process_commands(&cam);
        assert!(playground.cutting_mode());
        assert!(playground.cut_tool().is_drawing());

        playground.push(Command::ToggleCutMode);
        playground.process_commands(&cam);
        assert!(!playground.cutting_mode());
        assert!(!playground.cut_tool().is_drawing());
    }
}
