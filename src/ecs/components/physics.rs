//! Collision components for ECS entities.

use glam::Vec2;

use crate::physics::intersection::StaticManifold;

/// Collision results for one entity, rebuilt every frame.
#[derive(Debug, Clone)]
pub struct Collider {
    /// If false, the entity is skipped by both collision passes.
    pub collideable: bool,
    /// Overlaps found this frame. Normals point away from this entity.
    pub manifolds: Vec<StaticManifold>,
    /// Entity on the other side of each manifold, parallel to `manifolds`.
    pub colliding: Vec<hecs::Entity>,
    /// Entities this one was swept against and now rests on, with the hit normal.
    pub touching: Vec<(hecs::Entity, Vec2)>,
}

impl Default for Collider {
    fn default() -> Self {
        Self {
            collideable: true,
            manifolds: Vec::new(),
            colliding: Vec::new(),
            touching: Vec::new(),
        }
    }
}

impl Collider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collider that records nothing and is ignored by other colliders.
    pub fn disabled() -> Self {
        Self {
            collideable: false,
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.manifolds.clear();
        self.colliding.clear();
        self.touching.clear();
    }

    #[inline]
    pub fn is_colliding(&self) -> bool {
        !self.colliding.is_empty()
    }

    pub fn is_colliding_with(&self, entity: hecs::Entity) -> bool {
        self.colliding.contains(&entity)
    }

    /// True when resting on something below (a touching hit whose normal points up
    /// in screen coordinates, i.e. toward negative y).
    pub fn is_grounded(&self) -> bool {
        self.touching.iter().any(|(_, normal)| normal.y < 0.0)
    }

    /// Pairs of (other entity, manifold).
    pub fn contacts(&self) -> impl Iterator<Item = (hecs::Entity, &StaticManifold)> + '_ {
        self.colliding.iter().copied().zip(self.manifolds.iter())
    }
}

/// Velocity for entities moved by the collision system.
///
/// Entities without this component never move. The inverse mass weights how
/// overlaps are shared: zero makes the entity immovable by push-out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub velocity: Vec2,
    pub inverse_mass: f32,
    /// Coefficient of restitution (0.0 - 1.0).
    pub restitution: f32,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            inverse_mass: 1.0,
            restitution: 0.0,
        }
    }
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        Self {
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            ..Self::default()
        }
    }

    /// Moves with its velocity but is never pushed by overlaps.
    pub fn new_kinematic() -> Self {
        Self {
            inverse_mass: 0.0,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }
}
