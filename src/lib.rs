//! Rein 2D Physics
//!
//! Collision detection and impulse resolution for 2D rigid bodies.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **math** - Small 2D helpers on top of glam
//! 2. **physics** - Shapes, bodies, narrowphase, manifold solver, swept and static passes
//! 3. **ecs** - hecs components and the per-frame collision driver (feature = "ecs")

pub mod error;
pub mod math;
pub mod physics;

#[cfg(feature = "ecs")]
pub mod ecs;

pub use error::{PhysicsError, ShapeError};

pub use physics::broadphase::BroadphaseKind;
pub use physics::collider::{Aabb, ColliderShape};
pub use physics::contact::{ContactInfo, Manifold};
pub use physics::intersection::{static_intersection, StaticManifold};
pub use physics::narrowphase::detect_collision;
pub use physics::rigid_body::{find_terminal_velocity, Body};
pub use physics::shape::{Circle, MassData, Polygon, Shape, ShapeKind};
pub use physics::swept::{sweep_and_resolve, RayHit, SweepResult};
pub use physics::transform::Transform;
pub use physics::{PhysicsConfig, PhysicsWorld};

#[cfg(feature = "ecs")]
pub use ecs::prelude::*;

// Re-export glam for convenience
pub use glam;
