//! Entity Component System integration with hecs.

pub mod components;
pub mod systems;

pub mod prelude {
    pub use super::components::*;
    pub use super::systems::{impulse_system, CollisionConfig, CollisionStats, CollisionSystem};
}
