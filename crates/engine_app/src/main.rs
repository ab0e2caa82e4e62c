//! # engine_app
//!
//! Builds the demo scene, attaches a headless physics world to it and runs
//! the fixed-timestep tick loop, logging where every rigidbody ended up.
//!
//! ```text
//! engine_app --ticks 120
//! RUST_LOG=engine_physics=debug engine_app --fast
//! ```

mod demo;
mod tick;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use engine_component::ComponentRegistry;
use engine_physics::{PhysicsConfig, RIGIDBODY, register_physics_components};
use engine_scene::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tick::{TickConfig, TickLoop};

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Run the demo scene through the physics tick loop")]
struct Args {
    /// Number of ticks to run (0 = until interrupted).
    #[arg(long, default_value_t = 120)]
    ticks: u64,

    /// Target ticks per second.
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Run ticks back to back instead of in wall-clock time.
    #[arg(long)]
    fast: bool,

    /// Default log directive, refined by `RUST_LOG`.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(args.log.parse()?))
        .init();

    let mut registry = ComponentRegistry::new();
    register_physics_components(&mut registry)?;
    let mut world = World::new(Arc::new(registry));

    let physics = PhysicsConfig::default().with_fixed_timestep((1.0 / args.tick_rate) as f32);
    let (scene, sync) = demo::build(&mut world, physics)?;

    let config = TickConfig {
        tick_rate: args.tick_rate,
        max_ticks: args.ticks,
        realtime: !args.fast,
    };
    let mut tick_loop = TickLoop::new(config, world);
    tick_loop.simulate(scene, sync);
    tick_loop.run();

    let world = tick_loop.world();
    for &instance in world.collection(scene, RIGIDBODY)? {
        let Some(node) = world.owner_of(instance).and_then(|id| world.entity(id)) else {
            continue;
        };
        let position = world.world_matrix(node.id())?.w_axis.truncate();
        info!(entity = %node.id(), name = node.name(), ?position, "final position");
    }
    Ok(())
}
