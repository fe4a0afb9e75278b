//! Contact data and the per-pair impulse resolution.

use glam::Vec2;
use tracing::trace;

use crate::math::cross_sv;

use super::narrowphase::detect_collision;
use super::rigid_body::Body;

/// Allowed penetration before positional correction kicks in.
pub const PENETRATION_SLOP: f32 = 0.01;
/// Fraction of the remaining penetration removed per correction.
pub const CORRECTION_PERCENT: f32 = 1.0;

/// Result of a narrowphase test between two bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Contact normal (from body A to body B), unit length.
    pub normal: Vec2,
    /// Penetration depth, non-negative.
    pub penetration: f32,
    /// Contact points in world space; only the first `point_count` are valid.
    pub points: [Vec2; 2],
    pub point_count: usize,
}

impl ContactInfo {
    pub fn single(normal: Vec2, penetration: f32, point: Vec2) -> Self {
        Self {
            normal,
            penetration,
            points: [point, Vec2::ZERO],
            point_count: 1,
        }
    }

    #[inline]
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.point_count]
    }

    /// Same contact seen from the other body.
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Contact between two bodies of a scene plus the mixed material terms.
///
/// Bodies are referred to by index so that a manifold never owns or
/// borrows them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold {
    pub body_a: usize,
    pub body_b: usize,
    /// From A to B.
    pub normal: Vec2,
    pub penetration: f32,
    pub contacts: [Vec2; 2],
    pub contact_count: usize,
    pub restitution: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
}

impl Manifold {
    /// An empty manifold (no contacts yet) between two body indices.
    pub fn new(body_a: usize, body_b: usize) -> Self {
        Self {
            body_a,
            body_b,
            normal: Vec2::ZERO,
            penetration: 0.0,
            contacts: [Vec2::ZERO; 2],
            contact_count: 0,
            restitution: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
        }
    }

    pub fn from_contact(body_a: usize, body_b: usize, info: ContactInfo) -> Self {
        let mut manifold = Self::new(body_a, body_b);
        manifold.set_contact(info);
        manifold
    }

    fn set_contact(&mut self, info: ContactInfo) {
        self.normal = info.normal;
        self.penetration = info.penetration;
        self.contacts = info.points;
        self.contact_count = info.point_count;
    }

    /// Run the narrowphase for the pair and store the result.
    ///
    /// Returns `true` when the bodies touch.
    pub fn solve(&mut self, a: &Body, b: &Body) -> bool {
        match detect_collision(a, b) {
            Some(info) => self.set_contact(info),
            None => self.contact_count = 0,
        }
        self.has_contact()
    }

    #[inline]
    pub fn has_contact(&self) -> bool {
        self.contact_count > 0
    }

    #[inline]
    pub fn contacts(&self) -> &[Vec2] {
        &self.contacts[..self.contact_count]
    }

    /// Mix materials and detect resting contact.
    ///
    /// Restitution is the smaller of the two. Friction terms are the geometric
    /// mean. When the relative velocity at every contact is no larger than one
    /// step of gravity, the contact is resting and restitution is zeroed.
    pub fn initialize(&mut self, a: &Body, b: &Body, gravity: Vec2, dt: f32) {
        self.restitution = a.restitution.min(b.restitution);
        self.static_friction = (a.static_friction * b.static_friction).sqrt();
        self.dynamic_friction = (a.dynamic_friction * b.dynamic_friction).sqrt();

        let resting_threshold = (gravity * dt).length_squared() + f32::EPSILON;
        let resting = self.contacts().iter().any(|&contact| {
            let ra = contact - a.position;
            let rb = contact - b.position;
            relative_velocity(a, b, ra, rb).length_squared() < resting_threshold
        });
        if resting {
            self.restitution = 0.0;
        }
    }

    /// Apply normal and friction impulses at each contact point.
    pub fn apply_impulse(&self, a: &mut Body, b: &mut Body) {
        let inverse_mass_total = a.inverse_mass() + b.inverse_mass();
        if inverse_mass_total.abs() <= f32::EPSILON {
            Self::infinite_mass_correction(a, b);
            return;
        }

        let count = self.contact_count as f32;
        for &contact in self.contacts() {
            let ra = contact - a.position;
            let rb = contact - b.position;

            let rv = relative_velocity(a, b, ra, rb);
            let contact_velocity = rv.dot(self.normal);
            // Separating
            if contact_velocity > 0.0 {
                continue;
            }

            let ra_cross_n = ra.perp_dot(self.normal);
            let rb_cross_n = rb.perp_dot(self.normal);
            let inv_mass_sum = inverse_mass_total
                + ra_cross_n * ra_cross_n * a.inverse_inertia()
                + rb_cross_n * rb_cross_n * b.inverse_inertia();

            let j = -(1.0 + self.restitution) * contact_velocity / inv_mass_sum / count;
            let impulse = self.normal * j;
            a.apply_impulse(-impulse, ra);
            b.apply_impulse(impulse, rb);

            // Friction against the post-impulse velocity
            let rv = relative_velocity(a, b, ra, rb);
            let tangent = (rv - self.normal * rv.dot(self.normal)).normalize_or_zero();
            let jt = -rv.dot(tangent) / inv_mass_sum / count;
            if jt.abs() <= f32::EPSILON {
                continue;
            }

            // Coulomb's law
            let tangent_impulse = if jt.abs() < j * self.static_friction {
                tangent * jt
            } else {
                tangent * -j * self.dynamic_friction
            };
            a.apply_impulse(-tangent_impulse, ra);
            b.apply_impulse(tangent_impulse, rb);
        }
    }

    /// Push the bodies apart along the normal by the penetration beyond `slop`.
    pub fn positional_correction(&self, a: &mut Body, b: &mut Body, slop: f32, percent: f32) {
        let inverse_mass_total = a.inverse_mass() + b.inverse_mass();
        if inverse_mass_total <= 0.0 {
            return;
        }
        let depth = (self.penetration - slop).max(0.0);
        let correction = self.normal * (depth / inverse_mass_total * percent);
        a.position -= correction * a.inverse_mass();
        b.position += correction * b.inverse_mass();
    }

    /// Both bodies are immovable: stop them.
    pub fn infinite_mass_correction(a: &mut Body, b: &mut Body) {
        trace!("infinite mass pair, zeroing velocities");
        a.velocity = Vec2::ZERO;
        b.velocity = Vec2::ZERO;
    }
}

/// Velocity of B relative to A at the given contact offsets.
#[inline]
fn relative_velocity(a: &Body, b: &Body, ra: Vec2, rb: Vec2) -> Vec2 {
    b.velocity + cross_sv(b.angular_velocity, rb) - a.velocity - cross_sv(a.angular_velocity, ra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::Shape;

    fn circle(x: f32, velocity: Vec2) -> Body {
        Body::new(Shape::circle(1.0).unwrap(), Vec2::new(x, 0.0)).with_velocity(velocity)
    }

    fn colliding_pair(restitution: f32) -> (Body, Body, Manifold) {
        let a = circle(-0.9, Vec2::X).with_restitution(restitution);
        let b = circle(0.9, -Vec2::X).with_restitution(restitution);
        let mut m = Manifold::new(0, 1);
        assert!(m.solve(&a, &b));
        m.initialize(&a, &b, Vec2::ZERO, 1.0 / 60.0);
        (a, b, m)
    }

    #[test]
    fn test_elastic_reverses_relative_velocity() {
        let eps = 1e-4;
        let (mut a, mut b, m) = colliding_pair(1.0);
        assert_eq!(m.restitution, 1.0);
        m.apply_impulse(&mut a, &mut b);
        assert!((a.velocity - Vec2::new(-1.0, 0.0)).length() < eps);
        assert!((b.velocity - Vec2::new(1.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_inelastic_equalizes_normal_velocity() {
        let eps = 1e-4;
        let (mut a, mut b, m) = colliding_pair(0.0);
        m.apply_impulse(&mut a, &mut b);
        let rv = (b.velocity - a.velocity).dot(m.normal);
        assert!(rv.abs() < eps);
    }

    #[test]
    fn test_separating_pair_untouched() {
        let a = circle(-0.9, -Vec2::X);
        let b = circle(0.9, Vec2::X);
        let mut m = Manifold::new(0, 1);
        assert!(m.solve(&a, &b));
        m.initialize(&a, &b, Vec2::ZERO, 1.0 / 60.0);
        let (mut a2, mut b2) = (a.clone(), b.clone());
        m.apply_impulse(&mut a2, &mut b2);
        assert_eq!(a2.velocity, a.velocity);
        assert_eq!(b2.velocity, b.velocity);
    }

    #[test]
    fn test_resting_contact_zeroes_restitution() {
        let gravity = Vec2::new(0.0, -9.81);
        let a = circle(-0.9, Vec2::ZERO).with_restitution(1.0);
        let b = circle(0.9, Vec2::new(-0.01, 0.0)).with_restitution(1.0);
        let mut m = Manifold::new(0, 1);
        m.solve(&a, &b);
        m.initialize(&a, &b, gravity, 1.0 / 60.0);
        assert_eq!(m.restitution, 0.0);
    }

    #[test]
    fn test_material_mixing() {
        let a = circle(-0.9, Vec2::X).with_restitution(0.8).with_friction(0.4, 0.1);
        let b = circle(0.9, -Vec2::X).with_restitution(0.3).with_friction(0.9, 0.4);
        let mut m = Manifold::new(0, 1);
        m.solve(&a, &b);
        m.initialize(&a, &b, Vec2::ZERO, 1.0 / 60.0);
        assert_eq!(m.restitution, 0.3);
        assert!((m.static_friction - 0.6).abs() < 1e-5);
        assert!((m.dynamic_friction - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_friction_slows_sliding() {
        // Box sliding right on a static floor, pressed into it.
        let floor = Body::new_static(Shape::rect(5.0, 0.5).unwrap(), Vec2::ZERO);
        let block = Body::new(Shape::rect(0.5, 0.5).unwrap(), Vec2::new(0.0, 0.95))
            .with_velocity(Vec2::new(2.0, -1.0));
        let (mut floor, mut block) = (floor, block);
        let mut m = Manifold::new(0, 1);
        assert!(m.solve(&floor, &block));
        m.initialize(&floor, &block, Vec2::ZERO, 1.0 / 60.0);
        m.apply_impulse(&mut floor, &mut block);
        assert!(block.velocity.x < 2.0);
        assert!(block.velocity.x >= 0.0);
        assert!(block.velocity.y > -1.0);
        assert_eq!(floor.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_infinite_mass_pair_stops() {
        let mut a = Body::new_static(Shape::circle(1.0).unwrap(), Vec2::ZERO).with_velocity(Vec2::X);
        let mut b = Body::new_static(Shape::circle(1.0).unwrap(), Vec2::X).with_velocity(Vec2::Y);
        let mut m = Manifold::new(0, 1);
        m.solve(&a, &b);
        m.apply_impulse(&mut a, &mut b);
        assert_eq!(a.velocity, Vec2::ZERO);
        assert_eq!(b.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_positional_correction_moves_only_dynamic() {
        let eps = 1e-5;
        let mut wall = Body::new_static(Shape::circle(1.0).unwrap(), Vec2::ZERO);
        let mut ball = Body::new(Shape::circle(1.0).unwrap(), Vec2::new(1.5, 0.0));
        let mut m = Manifold::new(0, 1);
        assert!(m.solve(&wall, &ball));
        assert!((m.penetration - 0.5).abs() < eps);

        m.positional_correction(&mut wall, &mut ball, PENETRATION_SLOP, CORRECTION_PERCENT);
        assert_eq!(wall.position, Vec2::ZERO);
        assert!((ball.position.x - (1.5 + 0.5 - PENETRATION_SLOP)).abs() < eps);
    }

    #[test]
    fn test_positional_correction_converges_to_slop() {
        let mut a = Body::new(Shape::rect(0.5, 0.5).unwrap(), Vec2::ZERO);
        let mut b = Body::new(Shape::rect(0.5, 0.5).unwrap(), Vec2::new(0.6, 0.0));
        let mut m = Manifold::new(0, 1);
        let mut last = f32::MAX;
        for _ in 0..50 {
            if !m.solve(&a, &b) {
                break;
            }
            assert!(m.penetration <= last + 1e-6);
            last = m.penetration;
            m.positional_correction(&mut a, &mut b, PENETRATION_SLOP, 0.5);
        }
        assert!(last <= PENETRATION_SLOP + 1e-3);
    }
}
