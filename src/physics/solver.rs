//! Sequential impulse iteration over a scene's manifolds.

use glam::Vec2;

use super::contact::Manifold;
use super::rigid_body::Body;

/// Borrow two distinct bodies mutably. `None` if the indices match or are out of range.
pub fn body_pair_mut(bodies: &mut [Body], a: usize, b: usize) -> Option<(&mut Body, &mut Body)> {
    if a == b || a >= bodies.len() || b >= bodies.len() {
        return None;
    }
    if a < b {
        let (lo, hi) = bodies.split_at_mut(b);
        Some((&mut lo[a], &mut hi[0]))
    } else {
        let (lo, hi) = bodies.split_at_mut(a);
        Some((&mut hi[0], &mut lo[b]))
    }
}

/// Mix materials and flag resting contacts for every manifold.
pub fn initialize_contacts(manifolds: &mut [Manifold], bodies: &[Body], gravity: Vec2, dt: f32) {
    for manifold in manifolds.iter_mut() {
        let (Some(a), Some(b)) = (bodies.get(manifold.body_a), bodies.get(manifold.body_b)) else {
            continue;
        };
        manifold.initialize(a, b, gravity, dt);
    }
}

/// Solve contact constraints using sequential impulse iteration.
pub fn solve_contacts(manifolds: &[Manifold], bodies: &mut [Body], solver_iterations: u32) {
    for _ in 0..solver_iterations {
        for manifold in manifolds {
            if let Some((a, b)) = body_pair_mut(bodies, manifold.body_a, manifold.body_b) {
                manifold.apply_impulse(a, b);
            }
        }
    }
}

/// Apply positional correction once per manifold.
pub fn correct_positions(manifolds: &[Manifold], bodies: &mut [Body], slop: f32, percent: f32) {
    for manifold in manifolds {
        if let Some((a, b)) = body_pair_mut(bodies, manifold.body_a, manifold.body_b) {
            manifold.positional_correction(a, b, slop, percent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shape::Shape;

    fn ball(x: f32, vx: f32) -> Body {
        Body::new(Shape::circle(0.5).unwrap(), Vec2::new(x, 0.0)).with_velocity(Vec2::new(vx, 0.0))
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut bodies = vec![ball(0.0, 0.0), ball(1.0, 0.0), ball(2.0, 0.0)];
        {
            let (a, b) = body_pair_mut(&mut bodies, 2, 0).unwrap();
            assert_eq!(a.position.x, 2.0);
            assert_eq!(b.position.x, 0.0);
        }
        assert!(body_pair_mut(&mut bodies, 1, 1).is_none());
        assert!(body_pair_mut(&mut bodies, 0, 3).is_none());
    }

    #[test]
    fn test_solve_stops_approach() {
        let mut bodies = vec![ball(0.0, 1.0), ball(0.9, -1.0)];
        bodies[0].restitution = 0.0;
        bodies[1].restitution = 0.0;
        let mut manifold = Manifold::new(0, 1);
        assert!(manifold.solve(&bodies[0], &bodies[1]));
        let mut manifolds = vec![manifold];

        initialize_contacts(&mut manifolds, &bodies, Vec2::ZERO, 1.0 / 60.0);
        solve_contacts(&manifolds, &mut bodies, 10);

        let approach = (bodies[1].velocity - bodies[0].velocity).dot(Vec2::X);
        assert!(approach >= -1e-4);
    }

    #[test]
    fn test_correct_positions_separates() {
        let mut bodies = vec![ball(0.0, 0.0), ball(0.5, 0.0)];
        let mut manifold = Manifold::new(0, 1);
        manifold.solve(&bodies[0], &bodies[1]);
        correct_positions(&[manifold], &mut bodies, 0.0, 1.0);
        let gap = bodies[1].position.x - bodies[0].position.x;
        assert!((gap - 1.0).abs() < 1e-5);
    }
}
