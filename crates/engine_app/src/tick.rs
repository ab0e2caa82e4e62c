//! Fixed-timestep tick loop.
//!
//! Each tick advances every registered physics scene by one fixed step:
//! entity transforms are pushed into the physics world, the world is stepped,
//! and moving bodies are written back onto their entities.

use std::time::{Duration, Instant};

use engine_component::SceneId;
use engine_physics::{PhysicsSync, StepReport};
use engine_scene::World;
use tracing::{debug, info, warn};

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// Sleep between ticks to hold `tick_rate` in wall-clock time.
    pub realtime: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            realtime: true,
        }
    }
}

/// A simulated scene and the synchroniser driving it.
#[derive(Debug)]
struct SimulatedScene {
    id: SceneId,
    sync: PhysicsSync,
}

#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
    scenes: Vec<SimulatedScene>,
    /// Simulated seconds since the loop started.
    elapsed: f64,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
            scenes: Vec::new(),
            elapsed: 0.0,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Step `scene` with `sync` on every tick.
    pub fn simulate(&mut self, scene: SceneId, sync: PhysicsSync) {
        self.scenes.push(SimulatedScene { id: scene, sync });
    }

    /// Advance the clock by `dt` seconds and every simulated scene by its
    /// configured fixed step. Returns one report per scene, in registration
    /// order.
    pub fn tick(&mut self, dt: f64) -> Vec<StepReport> {
        self.tick_id += 1;
        self.elapsed += dt;

        let reports: Vec<StepReport> = self
            .scenes
            .iter()
            .map(|scene| {
                let fixed = scene.sync.config().fixed_timestep;
                scene
                    .sync
                    .step(&mut self.world, scene.id, fixed, self.elapsed as f32)
            })
            .collect();

        debug!(
            tick_id = self.tick_id,
            dt,
            scenes = reports.len(),
            written_back = reports.iter().map(|r| r.written_back).sum::<usize>(),
            "tick"
        );
        reports
    }

    /// Run for the configured number of ticks, or indefinitely.
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            scenes = self.scenes.len(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, elapsed = self.elapsed, "tick loop complete");
                break;
            }

            if !self.config.realtime {
                continue;
            }
            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_component::ComponentRegistry;
    use engine_math::{Transform3D, Vec3};
    use engine_physics::{HeadlessWorld, PhysicsConfig, RIGIDBODY, register_physics_components};
    use engine_schema::{Record, Value};

    use super::*;

    fn moving_body(velocity: Vec3) -> (TickLoop, engine_component::EntityId) {
        let mut registry = ComponentRegistry::new();
        register_physics_components(&mut registry).unwrap();
        let mut world = World::new(Arc::new(registry));
        let scene = world.create_scene("main");
        let sync = PhysicsSync::new(PhysicsConfig::default().with_fixed_timestep(0.001));
        sync.attach(&mut world, scene, Box::new(HeadlessWorld::default()))
            .unwrap();

        let body = world.spawn_in(scene, "body").unwrap();
        world
            .set_local_transform(body, Transform3D::from_position(Vec3::new(0.0, 10.0, 0.0)))
            .unwrap();
        let mut data = Record::new();
        data.insert("linearVelocity".into(), Value::from(velocity));
        world.add_component(body, RIGIDBODY, data).unwrap();

        let config = TickConfig {
            tick_rate: 1000.0,
            max_ticks: 5,
            realtime: false,
        };
        let mut tick_loop = TickLoop::new(config, world);
        tick_loop.simulate(scene, sync);
        (tick_loop, body)
    }

    #[test]
    fn test_tick_advances_counter_and_clock() {
        let (mut tick_loop, _) = moving_body(Vec3::ZERO);
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick(0.5);
        tick_loop.tick(0.5);
        assert_eq!(tick_loop.tick_id(), 2);
        assert!((tick_loop.elapsed() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_reports_each_scene() {
        let (mut tick_loop, _) = moving_body(Vec3::ZERO);
        let reports = tick_loop.tick(1.0 / 60.0);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].stepped);
        assert_eq!(reports[0].written_back, 1);
    }

    #[test]
    fn test_run_limited_ticks_writes_motion_back() {
        let (mut tick_loop, body) = moving_body(Vec3::new(0.0, -1.0, 0.0));
        tick_loop.run();
        assert_eq!(tick_loop.tick_id(), 5);
        let y = tick_loop.world().entity(body).unwrap().transform().position.y;
        assert!((y - 9.995).abs() < 1e-4);
    }
}
