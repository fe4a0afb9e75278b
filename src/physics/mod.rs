//! 2D collision detection and impulse resolution.
//!
//! # Architecture
//!
//! [`PhysicsWorld`] runs a scene of [`Body`] values in a fixed timestep loop:
//!
//! 1. Broadphase over body bounds
//! 2. Narrowphase through the shape dispatch table, one [`Manifold`] per touching pair
//! 3. Integrate forces (half step)
//! 4. Initialize manifolds (material mixing, resting detection)
//! 5. Apply impulses for the configured number of iterations
//! 6. Integrate velocities
//! 7. Positional correction
//! 8. Clear force accumulators
//!
//! The swept and static passes in [`swept`] and [`intersection`] work on raw
//! boxes and circles and are driven per frame by the ECS collision system.

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod intersection;
pub mod narrowphase;
pub mod rigid_body;
pub mod shape;
pub mod solver;
pub mod swept;
pub mod transform;

use glam::Vec2;
use tracing::{debug, warn};

use crate::error::PhysicsError;

use self::broadphase::{Broadphase, BroadphaseKind};
use self::collider::Aabb;
use self::contact::{Manifold, CORRECTION_PERCENT, PENETRATION_SLOP};
use self::narrowphase::detect_collision;

pub use self::rigid_body::Body;
pub use self::shape::{Shape, ShapeKind};

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81).
    pub gravity: Vec2,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Number of impulse iterations per step. Default: 10.
    pub solver_iterations: u32,
    /// Penetration allowed before positional correction. Default: 0.01.
    pub penetration_slop: f32,
    /// Fraction of penetration removed per step. Default: 1.0.
    pub correction_percent: f32,
    /// Broadphase strategy. Default: brute force.
    pub broadphase: BroadphaseKind,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            solver_iterations: 10,
            penetration_slop: PENETRATION_SLOP,
            correction_percent: CORRECTION_PERCENT,
            broadphase: BroadphaseKind::BruteForce,
        }
    }
}

impl PhysicsConfig {
    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(PhysicsError::InvalidTimestep(self.fixed_timestep));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_substeps must be at least 1".into(),
            ));
        }
        if !(self.penetration_slop.is_finite() && self.penetration_slop >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "penetration_slop must be >= 0, got {}",
                self.penetration_slop
            )));
        }
        if !(self.correction_percent.is_finite() && (0.0..=1.0).contains(&self.correction_percent)) {
            return Err(PhysicsError::InvalidConfig(format!(
                "correction_percent must be in [0, 1], got {}",
                self.correction_percent
            )));
        }
        Ok(())
    }
}

/// A scene of bodies stepped with a fixed timestep.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    bodies: Vec<Body>,
    broadphase: Broadphase,
    contacts: Vec<Manifold>,
    bounds: Vec<Aabb>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self {
            broadphase: Broadphase::new(config.broadphase),
            config,
            accumulator: 0.0,
            bodies: Vec::new(),
            contacts: Vec::new(),
            bounds: Vec::new(),
        })
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Add a body and return its index.
    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Manifolds produced by the most recent step.
    pub fn contacts(&self) -> &[Manifold] {
        &self.contacts
    }

    /// Remove every body and contact.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.accumulator = 0.0;
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic simulation.
    /// Returns the number of fixed steps taken.
    pub fn step(&mut self, delta_time: f64) -> u32 {
        if !(delta_time.is_finite() && delta_time >= 0.0) {
            warn!(delta_time, "ignoring invalid frame time");
            return 0;
        }
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(self.config.fixed_timestep as f32);
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            debug!(accumulator = self.accumulator, "dropping accumulated time");
            self.accumulator = 0.0;
        }
        substeps
    }

    /// Advance the scene by exactly `dt` seconds.
    pub fn fixed_step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, "ignoring non-positive timestep");
            return;
        }
        let gravity = self.config.gravity;

        // 1-2. Broadphase and narrowphase
        self.bounds.clear();
        self.bounds.extend(self.bodies.iter().map(Body::bounds));
        let pairs = self.broadphase.find_pairs(&self.bounds);

        self.contacts.clear();
        for (i, j) in pairs {
            let (a, b) = (&self.bodies[i], &self.bodies[j]);
            if a.is_static() && b.is_static() {
                continue;
            }
            if let Some(info) = detect_collision(a, b) {
                self.contacts.push(Manifold::from_contact(i, j, info));
            }
        }

        // 3. Integrate forces
        for body in &mut self.bodies {
            body.integrate_forces(gravity, dt);
        }

        // 4-5. Resolve collisions
        solver::initialize_contacts(&mut self.contacts, &self.bodies, gravity, dt);
        solver::solve_contacts(&self.contacts, &mut self.bodies, self.config.solver_iterations);

        // 6. Integrate velocities
        for body in &mut self.bodies {
            body.integrate_velocity(gravity, dt);
        }

        // 7. Positional correction
        solver::correct_positions(
            &self.contacts,
            &mut self.bodies,
            self.config.penetration_slop,
            self.config.correction_percent,
        );

        // 8. Clear force accumulators
        for body in &mut self.bodies {
            body.clear_forces();
        }

        debug!(
            bodies = self.bodies.len(),
            contacts = self.contacts.len(),
            "physics step"
        );
    }
}
