//! ECS systems (per-frame collision, manifold response).

pub mod collision;
pub mod impulse;

pub use collision::{CollisionConfig, CollisionStats, CollisionSystem};
pub use impulse::impulse_system;
