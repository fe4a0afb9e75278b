//! Velocity response to the manifolds recorded by the collision system.

use crate::ecs::components::{Collider, RigidBody};

/// Remove the velocity each rigid body carries into the colliders it overlaps.
///
/// Every manifold normal points away from the owner, so a positive dot
/// product means the body is still moving into the other collider. That
/// component is reflected with the body's restitution. Run after
/// [`CollisionSystem::update`](super::CollisionSystem::update).
pub fn impulse_system(world: &mut hecs::World) {
    for (_, (collider, body)) in world.query_mut::<(&Collider, &mut RigidBody)>() {
        for manifold in &collider.manifolds {
            let approach = body.velocity.dot(manifold.normal);
            if approach > 0.0 {
                body.velocity -= manifold.normal * approach * (1.0 + body.restitution);
            }
        }
    }
}
