//! Rigid body state and integration.

use glam::Vec2;

use super::collider::Aabb;
use super::shape::{MassData, Shape};

/// Default density used when a body is built without one.
pub const DEFAULT_DENSITY: f32 = 1.0;
/// Default static friction coefficient.
pub const DEFAULT_STATIC_FRICTION: f32 = 0.5;
/// Default dynamic friction coefficient.
pub const DEFAULT_DYNAMIC_FRICTION: f32 = 0.3;
/// Default restitution.
pub const DEFAULT_RESTITUTION: f32 = 0.2;

/// A simulated body owning its collision shape.
///
/// Mass and inertia are private so that `mass == 0` always implies
/// `inverse_mass == 0` (and likewise for inertia). A body with zero inverse
/// mass is static: solvers never move it.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    /// Accumulated force, cleared after each step.
    pub force: Vec2,
    /// Accumulated torque, cleared after each step.
    pub torque: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
    pub restitution: f32,
    orientation: f32,
    mass: f32,
    inverse_mass: f32,
    inertia: f32,
    inverse_inertia: f32,
    density: f32,
    shape: Shape,
}

impl Body {
    /// Create a dynamic body with [`DEFAULT_DENSITY`].
    pub fn new(shape: Shape, position: Vec2) -> Self {
        Self::with_density(shape, position, DEFAULT_DENSITY)
    }

    /// Create a body whose mass comes from `density`. A density of zero makes it static.
    pub fn with_density(shape: Shape, position: Vec2, density: f32) -> Self {
        let mut body = Self {
            position,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            static_friction: DEFAULT_STATIC_FRICTION,
            dynamic_friction: DEFAULT_DYNAMIC_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            orientation: 0.0,
            mass: 0.0,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            density,
            shape,
        };
        body.compute_mass(density);
        body
    }

    /// Create an immovable body.
    pub fn new_static(shape: Shape, position: Vec2) -> Self {
        let mut body = Self::new(shape, position);
        body.set_static();
        body
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, static_friction: f32, dynamic_friction: f32) -> Self {
        self.static_friction = static_friction;
        self.dynamic_friction = dynamic_friction;
        self
    }

    /// Recompute mass and inertia from the shape.
    pub fn compute_mass(&mut self, density: f32) -> MassData {
        self.density = density;
        let data = self.shape.compute_mass(density);
        self.set_mass_properties(data.mass, data.inertia);
        data
    }

    fn set_mass_properties(&mut self, mass: f32, inertia: f32) {
        let positive = |x: f32| x.is_finite() && x > 0.0;
        self.mass = if positive(mass) { mass } else { 0.0 };
        self.inverse_mass = if positive(mass) { 1.0 / mass } else { 0.0 };
        self.inertia = if positive(inertia) { inertia } else { 0.0 };
        self.inverse_inertia = if positive(inertia) { 1.0 / inertia } else { 0.0 };
    }

    pub fn set_static(&mut self) {
        self.set_mass_properties(0.0, 0.0);
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inverse_inertia(&self) -> f32 {
        self.inverse_inertia
    }

    #[inline]
    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    /// Set the orientation and keep the shape's cached rotation in sync.
    pub fn set_orientation(&mut self, radians: f32) {
        self.orientation = radians;
        self.shape.set_orientation(radians);
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Replace the shape, recomputing mass with the current density.
    /// Static bodies stay static.
    pub fn set_shape(&mut self, shape: Shape) {
        let was_static = self.is_static();
        self.shape = shape;
        self.shape.set_orientation(self.orientation);
        self.compute_mass(self.density);
        if was_static {
            self.set_static();
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// Apply `impulse` at `contact_vector` (offset from the body position).
    pub fn apply_impulse(&mut self, impulse: Vec2, contact_vector: Vec2) {
        self.velocity += self.inverse_mass * impulse;
        self.angular_velocity += self.inverse_inertia * contact_vector.perp_dot(impulse);
    }

    /// Half-step velocity update from accumulated forces and gravity.
    pub fn integrate_forces(&mut self, gravity: Vec2, dt: f32) {
        if self.is_static() {
            return;
        }
        let half_dt = dt * 0.5;
        self.velocity += (self.force * self.inverse_mass + gravity) * half_dt;
        self.angular_velocity += self.torque * self.inverse_inertia * half_dt;
    }

    /// Advance position and orientation, then apply the second force half-step.
    pub fn integrate_velocity(&mut self, gravity: Vec2, dt: f32) {
        if self.is_static() {
            return;
        }
        self.position += self.velocity * dt;
        self.set_orientation(self.orientation + self.angular_velocity * dt);
        self.integrate_forces(gravity, dt);
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// World-space bounding box of the shape.
    pub fn bounds(&self) -> Aabb {
        match &self.shape {
            Shape::Circle(circle) => Aabb::from_center(self.position, Vec2::splat(circle.radius())),
            Shape::Polygon(polygon) => {
                let mut min = Vec2::splat(f32::MAX);
                let mut max = Vec2::splat(f32::MIN);
                for i in 0..polygon.vertex_count() {
                    let v = polygon.world_vertex(i, self.position);
                    min = min.min(v);
                    max = max.max(v);
                }
                Aabb::from_min_max(min, max)
            }
        }
    }
}

/// Default convergence tolerance for [`find_terminal_velocity`].
pub const TERMINAL_VELOCITY_TOLERANCE: f32 = 1e-5;
/// Default iteration cap for [`find_terminal_velocity`].
pub const TERMINAL_VELOCITY_MAX_ITERATIONS: usize = 100_000;

/// One step of the drag model: gravity is added, then drag scales the result.
#[inline]
pub fn drag_step(velocity: Vec2, gravity: Vec2, drag: Vec2, dt: f32) -> Vec2 {
    (velocity + gravity * dt) * (Vec2::ONE - drag)
}

/// Iterate [`drag_step`] from rest until successive velocities agree within
/// `tolerance` on both axes.
///
/// Returns `None` when the iteration does not settle within `max_iterations`,
/// which is always the case for an axis with gravity and zero drag.
pub fn find_terminal_velocity(
    gravity: Vec2,
    drag: Vec2,
    dt: f32,
    tolerance: f32,
    max_iterations: usize,
) -> Option<Vec2> {
    let mut velocity = Vec2::ZERO;
    for _ in 0..max_iterations {
        let next = drag_step(velocity, gravity, drag, dt);
        if !next.is_finite() {
            return None;
        }
        let scale = next.abs().max_element().max(1.0);
        if (next - velocity).abs().max_element() <= tolerance * scale {
            return Some(next);
        }
        velocity = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Shape {
        Shape::rect(0.5, 0.5).unwrap()
    }

    #[test]
    fn test_static_has_zero_inverse_mass() {
        let body = Body::new_static(unit_box(), Vec2::ZERO);
        assert!(body.is_static());
        assert_eq!(body.mass(), 0.0);
        assert_eq!(body.inverse_mass(), 0.0);
        assert_eq!(body.inverse_inertia(), 0.0);
    }

    #[test]
    fn test_zero_density_is_static() {
        let body = Body::with_density(unit_box(), Vec2::ZERO, 0.0);
        assert!(body.is_static());
    }

    #[test]
    fn test_mass_from_density() {
        let eps = 1e-5;
        let body = Body::with_density(unit_box(), Vec2::ZERO, 3.0);
        assert!((body.mass() - 3.0).abs() < eps);
        assert!((body.inverse_mass() - 1.0 / 3.0).abs() < eps);
    }

    #[test]
    fn test_defaults() {
        let body = Body::new(Shape::circle(1.0).unwrap(), Vec2::ZERO);
        assert_eq!(body.static_friction, DEFAULT_STATIC_FRICTION);
        assert_eq!(body.dynamic_friction, DEFAULT_DYNAMIC_FRICTION);
        assert_eq!(body.restitution, DEFAULT_RESTITUTION);
    }

    #[test]
    fn test_static_ignores_integration() {
        let mut body = Body::new_static(unit_box(), Vec2::new(1.0, 2.0)).with_velocity(Vec2::X);
        body.apply_force(Vec2::new(100.0, 0.0));
        body.integrate_forces(Vec2::new(0.0, -9.81), 0.1);
        body.integrate_velocity(Vec2::new(0.0, -9.81), 0.1);
        assert_eq!(body.position, Vec2::new(1.0, 2.0));
        assert_eq!(body.velocity, Vec2::X);
    }

    #[test]
    fn test_integration_under_gravity() {
        let eps = 1e-5;
        let gravity = Vec2::new(0.0, -10.0);
        let mut body = Body::new(unit_box(), Vec2::ZERO);
        body.integrate_forces(gravity, 0.1);
        body.integrate_velocity(gravity, 0.1);
        // Two half steps: v = g * dt, position used the mid-step velocity.
        assert!((body.velocity - Vec2::new(0.0, -1.0)).length() < eps);
        assert!((body.position - Vec2::new(0.0, -0.05)).length() < eps);
    }

    #[test]
    fn test_impulse_spins_off_center() {
        let mut body = Body::new(unit_box(), Vec2::ZERO);
        body.apply_impulse(Vec2::Y, Vec2::X);
        assert!(body.velocity.y > 0.0);
        assert!(body.angular_velocity > 0.0);
    }

    #[test]
    fn test_orientation_syncs_shape() {
        let mut body = Body::new(unit_box(), Vec2::ZERO);
        body.set_orientation(std::f32::consts::FRAC_PI_4);
        let bounds = body.bounds();
        let half_diagonal = 0.5 * std::f32::consts::SQRT_2;
        assert!((bounds.half_extents().x - half_diagonal).abs() < 1e-5);
    }

    #[test]
    fn test_set_shape_keeps_static() {
        let mut body = Body::new_static(unit_box(), Vec2::ZERO);
        body.set_shape(Shape::circle(2.0).unwrap());
        assert!(body.is_static());
    }

    #[test]
    fn test_terminal_velocity_matches_fixed_point() {
        let gravity = Vec2::new(0.0, -9.81);
        let drag = Vec2::splat(0.1);
        let dt = 1.0 / 60.0;
        let v = find_terminal_velocity(
            gravity,
            drag,
            dt,
            TERMINAL_VELOCITY_TOLERANCE,
            TERMINAL_VELOCITY_MAX_ITERATIONS,
        )
        .unwrap();
        // v = (v + g dt)(1 - d)  =>  v = g dt (1 - d) / d
        let expected = gravity * dt * 0.9 / 0.1;
        assert!((v - expected).length() < 1e-3);
    }

    #[test]
    fn test_terminal_velocity_without_drag_diverges() {
        let v = find_terminal_velocity(Vec2::new(0.0, -9.81), Vec2::ZERO, 0.1, 1e-6, 1000);
        assert!(v.is_none());
    }
}
