//! Scene builders shared by the physics benchmarks.

use anyhow::Result;
use glam::Vec2;
use rein_physics2d::physics::contact::Manifold;
use rein_physics2d::{
    Body, BroadphaseKind, Collider, ColliderShape, PhysicsConfig, PhysicsWorld, RigidBody, Shape,
    Transform,
};

/// Deterministic pseudo-random value in `[0, 1)` for index `i`.
pub fn hash01(i: usize) -> f32 {
    let mut x = (i as u32).wrapping_mul(0x9E37_79B9) ^ 0x85EB_CA6B;
    x ^= x >> 16;
    x = x.wrapping_mul(0x7FEB_352D);
    x ^= x >> 15;
    (x & 0x00FF_FFFF) as f32 / 16_777_216.0
}

/// `n` bodies stacked in columns above a static floor, alternating circles and boxes.
pub fn setup_body_world(n: usize, broadphase: BroadphaseKind) -> Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(PhysicsConfig {
        broadphase,
        ..PhysicsConfig::default()
    })?;
    world.add_body(Body::new_static(Shape::rect(200.0, 1.0)?, Vec2::new(0.0, -1.0)));

    let columns = (n as f32).sqrt().ceil().max(1.0) as usize;
    for i in 0..n {
        let x = (i % columns) as f32 * 2.2 - columns as f32 * 1.1;
        let y = (i / columns) as f32 * 2.1 + 1.0 + hash01(i) * 0.5;
        let shape = if i % 2 == 0 {
            Shape::circle(0.5 + hash01(i + n) * 0.4)?
        } else {
            Shape::rect(0.5, 0.5 + hash01(i + 2 * n) * 0.4)?
        };
        world.add_body(Body::new(shape, Vec2::new(x, y)));
    }
    Ok(world)
}

/// Bodies and the solved manifolds of `n` overlapping circle pairs.
pub fn setup_contacts(n: usize) -> Result<(Vec<Body>, Vec<Manifold>)> {
    let mut bodies = Vec::with_capacity(n * 2);
    let mut manifolds = Vec::with_capacity(n);
    for i in 0..n {
        let base = Vec2::new(i as f32 * 5.0, 0.0);
        let a = Body::new(Shape::circle(1.0)?, base).with_velocity(Vec2::new(1.0, 0.0));
        let b = Body::new(Shape::circle(1.0)?, base + Vec2::new(1.5, 0.2))
            .with_velocity(Vec2::new(-1.0, 0.0));
        let mut manifold = Manifold::new(bodies.len(), bodies.len() + 1);
        manifold.solve(&a, &b);
        manifold.initialize(&a, &b, Vec2::new(0.0, -9.81), 1.0 / 60.0);
        bodies.push(a);
        bodies.push(b);
        manifolds.push(manifold);
    }
    Ok((bodies, manifolds))
}

/// A tile floor plus `n` falling boxes for the ECS collision driver.
pub fn setup_ecs_scene(n: usize) -> hecs::World {
    let mut world = hecs::World::new();
    let tiles = (n / 2).max(8);
    for i in 0..tiles {
        world.spawn((
            Transform::from_position(Vec2::new(i as f32 * 16.0, 400.0)),
            ColliderShape::Aabb {
                size: Vec2::splat(16.0),
            },
            Collider::new(),
        ));
    }
    for i in 0..n {
        let x = hash01(i) * (tiles as f32 * 16.0 - 12.0);
        let y = hash01(i + n) * 350.0;
        world.spawn((
            Transform::from_position(Vec2::new(x, y)),
            ColliderShape::Aabb {
                size: Vec2::splat(12.0),
            },
            Collider::new(),
            RigidBody::default().with_velocity(Vec2::new(0.0, 200.0 + hash01(i) * 300.0)),
        ));
    }
    world
}
