//! Physical behavior against the rapier3d backend

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;

use super::{floor_collider, ghost_collider, node_at, rapier_engine, sphere_collider};
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::physics::{
    BodyKind, Collider, CollisionEvent, CollisionObject, DeferredCommands, Material, Ray, Shape,
};
use crate::scene::{NodeTable, SceneNodes};

const DT: f32 = 1.0 / 60.0;

#[test]
fn test_sphere_falls_onto_plane_and_rests() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    engine.add_collider(floor_collider(&mut nodes), &nodes).unwrap();
    let ball = sphere_collider(&mut nodes, Vec3::new(0.0, 10.0, 0.0), 1.0, 1.0);
    let ball_node = ball.node();
    engine.add_collider(ball, &nodes).unwrap();

    let mut previous = 10.0;
    let mut lowest = f32::MAX;
    for _ in 0..300 {
        engine.step(DT, &mut nodes).unwrap();
        let height = nodes.world_transform(ball_node).unwrap().position.y;
        if previous > 1.25 {
            assert!(height < previous, "height went from {previous} to {height} while falling");
        }
        lowest = lowest.min(height);
        previous = height;
    }

    assert!(lowest > 0.95, "sphere penetrated the plane down to {lowest}");
    assert_relative_eq!(previous, 1.0, epsilon = 0.05);
}

#[test]
fn test_static_node_is_bit_identical_after_steps() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let rotation = Quat::from_euler_angles(0.3, 0.7, -0.2);
    let transform = Transform::from_position_rotation(Vec3::new(1.5, 0.25, -3.0), rotation)
        .with_scale(Vec3::new(2.0, 1.0, 2.0));
    let node = nodes.insert("ramp", transform);
    let ramp = Collider::new(
        CollisionObject::rigid_body(Shape::cuboid(Vec3::new(2.0, 0.25, 2.0)).unwrap(), 0.0).unwrap(),
        Material::default(),
        node,
    );
    engine.add_collider(ramp, &nodes).unwrap();
    engine
        .add_collider(sphere_collider(&mut nodes, Vec3::new(1.5, 3.0, -3.0), 0.5, 1.0), &nodes)
        .unwrap();

    let before = nodes.local_transform(node).unwrap();
    for _ in 0..120 {
        engine.step(DT, &mut nodes).unwrap();
    }
    assert_eq!(nodes.local_transform(node).unwrap(), before);
}

#[test]
fn test_static_override_keeps_dynamic_node_untouched() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let pinned = sphere_collider(&mut nodes, Vec3::new(0.0, 4.0, 0.0), 0.5, 1.0).with_static(true);
    let node = pinned.node();
    let handle = engine.add_collider(pinned, &nodes).unwrap();

    for _ in 0..30 {
        engine.step(DT, &mut nodes).unwrap();
    }
    assert_eq!(nodes.world_transform(node).unwrap().position, Vec3::new(0.0, 4.0, 0.0));
    assert!(engine.world_transform(handle).unwrap().position.y < 4.0);
}

#[test]
fn test_sync_preserves_node_scale() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let node = nodes.insert(
        "big ball",
        Transform::from_position(Vec3::new(0.0, 5.0, 0.0)).with_scale(Vec3::new(3.0, 3.0, 3.0)),
    );
    let ball = Collider::new(
        CollisionObject::rigid_body(Shape::sphere(1.5).unwrap(), 1.0).unwrap(),
        Material::default(),
        node,
    );
    engine.add_collider(ball, &nodes).unwrap();
    engine.step(DT, &mut nodes).unwrap();

    let synced = nodes.world_transform(node).unwrap();
    assert!(synced.position.y < 5.0);
    assert_relative_eq!(synced.scale, Vec3::new(3.0, 3.0, 3.0), epsilon = 1e-5);
}

#[test]
fn test_ghost_reports_overlap_without_slowing_the_body() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let events: Arc<Mutex<Vec<CollisionEvent>>> = Arc::default();
    let sink = events.clone();
    let ghost = ghost_collider(&mut nodes, Vec3::new(0.0, 5.0, 0.0), 3.0).with_handler(
        move |event: &CollisionEvent, _: &mut DeferredCommands| sink.lock().unwrap().push(event.clone()),
    );
    let ghost_node = ghost.node();
    let ghost_handle = engine.add_collider(ghost, &nodes).unwrap();
    let ball = engine
        .add_collider(sphere_collider(&mut nodes, Vec3::new(0.0, 6.0, 0.0), 0.25, 1.0), &nodes)
        .unwrap();

    let steps = 10;
    for _ in 0..steps {
        engine.step(DT, &mut nodes).unwrap();
    }

    let events = events.lock().unwrap();
    assert!(!events.is_empty(), "ghost never reported the overlapping body");
    for event in events.iter() {
        assert_eq!(event.collider, ghost_handle);
        assert!(event.contacts.iter().all(|c| c.other == ball && c.other_kind == BodyKind::Dynamic));
        assert!(event.contacts.iter().all(|c| c.impulse == 0.0));
    }

    let free_fall = -9.8 * DT * steps as f32;
    assert_relative_eq!(engine.linear_velocity(ball).unwrap().y, free_fall, epsilon = 1e-3);
    assert_eq!(nodes.world_transform(ghost_node).unwrap().position, Vec3::new(0.0, 5.0, 0.0));
}

#[test]
fn test_deferred_impulse_pushes_overlapping_bodies_up() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let mut ghost = ghost_collider(&mut nodes, Vec3::zeros(), 2.0);
    ghost.on_collision(|event: &CollisionEvent, commands: &mut DeferredCommands| {
        for contact in &event.contacts {
            if contact.other_kind == BodyKind::Dynamic {
                commands.apply_impulse(contact.other, Vec3::new(0.0, 20.0, 0.0), contact.point);
            }
        }
    });
    engine.add_collider(ghost, &nodes).unwrap();
    let ball = engine
        .add_collider(sphere_collider(&mut nodes, Vec3::new(0.0, 0.5, 0.0), 0.25, 1.0), &nodes)
        .unwrap();

    let stats = engine.step(DT, &mut nodes).unwrap();
    assert!(stats.command_errors.is_empty());
    assert!(engine.linear_velocity(ball).unwrap().y > 0.0);
}

#[test]
fn test_rejected_dt_leaves_transforms_unchanged() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let ball = sphere_collider(&mut nodes, Vec3::new(0.0, 3.0, 0.0), 0.5, 1.0);
    let node = ball.node();
    let handle = engine.add_collider(ball, &nodes).unwrap();
    engine.step(DT, &mut nodes).unwrap();

    let node_before = nodes.world_transform(node).unwrap();
    let body_before = engine.world_transform(handle).unwrap();
    for dt in [0.0, -DT, f32::NAN, f32::INFINITY] {
        assert!(matches!(
            engine.step(dt, &mut nodes),
            Err(crate::PhysicsError::InvalidArgument(_))
        ));
    }
    assert_eq!(nodes.world_transform(node).unwrap(), node_before);
    assert_eq!(engine.world_transform(handle).unwrap(), body_before);
}

#[test]
fn test_large_frames_are_clamped() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();
    engine
        .add_collider(sphere_collider(&mut nodes, Vec3::new(0.0, 3.0, 0.0), 0.5, 1.0), &nodes)
        .unwrap();

    let stats = engine.step(1.0, &mut nodes).unwrap();
    assert_eq!(stats.sub_steps, 10);
    assert_relative_eq!(stats.simulated_time, 10.0 / 60.0, epsilon = 1e-6);

    let stats = engine.step(0.04, &mut nodes).unwrap();
    assert_eq!(stats.sub_steps, 3);
    assert_relative_eq!(stats.simulated_time, 0.04, epsilon = 1e-6);
}

#[test]
fn test_teleport_moves_body_and_node() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();
    let ghost = ghost_collider(&mut nodes, Vec3::zeros(), 1.0);
    let node = ghost.node();
    let handle = engine.add_collider(ghost, &nodes).unwrap();

    let target = Transform::from_position(Vec3::new(4.0, 2.0, -1.0));
    engine.set_world_transform(handle, &target, &mut nodes).unwrap();
    engine.step(DT, &mut nodes).unwrap();

    assert_relative_eq!(engine.world_transform(handle).unwrap().position, target.position, epsilon = 1e-5);
    assert_relative_eq!(nodes.world_transform(node).unwrap().position, target.position, epsilon = 1e-5);
}

#[test]
fn test_ray_cast_skips_ghosts() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();

    let floor = engine.add_collider(floor_collider(&mut nodes), &nodes).unwrap();
    engine
        .add_collider(ghost_collider(&mut nodes, Vec3::new(0.0, 5.0, 0.0), 1.0), &nodes)
        .unwrap();
    engine.step(DT, &mut nodes).unwrap();

    let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -1.0, 0.0)).unwrap();
    let hit = engine.cast_ray(&ray, 100.0).unwrap();
    assert_eq!(hit.collider, floor);
    assert_relative_eq!(hit.distance, 10.0, epsilon = 1e-4);
    assert_relative_eq!(hit.point, Vec3::zeros(), epsilon = 1e-4);

    assert!(engine.cast_ray(&ray, 5.0).is_none());
}

#[test]
fn test_gravity_can_change_at_runtime() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();
    let ball = engine
        .add_collider(sphere_collider(&mut nodes, Vec3::zeros(), 0.5, 1.0), &nodes)
        .unwrap();

    engine.set_gravity(Vec3::new(0.0, 9.8, 0.0)).unwrap();
    assert_eq!(engine.gravity(), Vec3::new(0.0, 9.8, 0.0));
    engine.step(DT, &mut nodes).unwrap();
    assert!(engine.linear_velocity(ball).unwrap().y > 0.0);
    assert!(engine.set_gravity(Vec3::new(f32::NAN, 0.0, 0.0)).is_err());
}

#[test]
fn test_missing_node_is_skipped_during_sync() {
    let mut engine = rapier_engine();
    let mut nodes = NodeTable::new();
    let ball = sphere_collider(&mut nodes, Vec3::new(0.0, 2.0, 0.0), 0.5, 1.0);
    let node = ball.node();
    let other = node_at(&mut nodes, "bystander", Vec3::new(7.0, 0.0, 0.0));
    engine.add_collider(ball, &nodes).unwrap();

    nodes.remove(node);
    engine.step(DT, &mut nodes).unwrap();
    assert_eq!(nodes.world_transform(other).unwrap().position, Vec3::new(7.0, 0.0, 0.0));
}
