//! The demo scene: a kinematic platform, a spinning crate, and a ball on a
//! hinge under a moving parent.
//!
//! Built through the same calls an external loader would make, with
//! component data in authoring (JSON) form.

use anyhow::{Context, Result};
use engine_component::{EntityId, SceneId};
use engine_math::{Quat, Transform3D, Vec3};
use engine_physics::{COLLIDER, HeadlessWorld, JOINT, PhysicsConfig, PhysicsSync, RIGIDBODY};
use engine_scene::World;
use serde_json::json;
use tracing::{debug, info};

/// Create the demo scene in `world` with a headless physics world attached.
///
/// The physics world is attached before any entity so that rigidbodies
/// find it when they are enabled.
pub fn build(world: &mut World, config: PhysicsConfig) -> Result<(SceneId, PhysicsSync)> {
    let sync = PhysicsSync::new(config);
    let scene = world.create_scene("demo");
    sync.attach(world, scene, Box::new(HeadlessWorld::new(sync.config().gravity)))?;

    let platform = spawn(
        world,
        scene,
        "platform",
        Transform3D::from_position(Vec3::new(0.0, -0.5, 0.0)),
    )?;
    let kinematic = json!({ "isKinematic": true, "linearVelocity": [0.5, 0.0, 0.0] });
    add(world, platform, RIGIDBODY, kinematic)?;
    add(world, platform, COLLIDER, json!({ "shape": "box", "halfExtents": [10.0, 0.5, 10.0] }))?;

    let crate_ = spawn(
        world,
        scene,
        "crate",
        Transform3D::from_position_rotation(Vec3::new(0.0, 5.0, 0.0), Quat::from_rotation_y(0.25)),
    )?;
    add(world, crate_, RIGIDBODY, json!({ "mass": 2, "angularVelocity": [0.0, 1.0, 0.0] }))?;
    add(world, crate_, COLLIDER, json!({ "shape": "box" }))?;

    let arm = spawn(world, scene, "arm", Transform3D::from_position(Vec3::new(3.0, 4.0, 0.0)))?;
    let bob = world.spawn_child(arm, "bob")?;
    world.set_local_transform(
        bob,
        Transform3D::from_position(Vec3::new(0.0, -1.0, 0.0)).with_scale(Vec3::splat(0.5)),
    )?;
    add(world, bob, RIGIDBODY, json!({ "linearVelocity": { "x": 0.0, "y": 0.0, "z": 1.0 } }))?;
    add(world, bob, COLLIDER, json!({ "shape": "sphere" }))?;
    add(world, bob, JOINT, json!({ "type": "hinge", "anchor": [0.0, 1.0, 0.0] }))?;

    info!(scene = %scene, entities = world.entity_count(), "demo scene built");
    Ok((scene, sync))
}

fn spawn(
    world: &mut World,
    scene: SceneId,
    name: &str,
    transform: Transform3D,
) -> Result<EntityId> {
    let entity = world.spawn_in(scene, name)?;
    world.set_local_transform(entity, transform)?;
    debug!(entity = %entity, name, "entity spawned");
    Ok(entity)
}

fn add(
    world: &mut World,
    entity: EntityId,
    type_name: &str,
    data: serde_json::Value,
) -> Result<()> {
    world
        .add_component_json(entity, type_name, &data)
        .with_context(|| format!("adding '{type_name}' to {entity}"))?;
    Ok(())
}
