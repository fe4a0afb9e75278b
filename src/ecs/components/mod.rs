//! ECS components (placement, collision shape, collision results, velocity).

pub mod physics;

pub use crate::physics::collider::ColliderShape;
pub use crate::physics::transform::Transform;
pub use physics::*;
