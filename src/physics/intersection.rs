//! Static overlap tests between axis-aligned boxes and circles.
//!
//! Normals point from A to B. The penetration vector is how far A must move
//! against the normal (or B along it) to separate the pair.

use glam::Vec2;

use crate::math::sign_non_zero;

use super::collider::ColliderShape;
use super::shape::ShapeKind;
use super::transform::Transform;

/// Overlap between two colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticManifold {
    pub normal: Vec2,
    pub penetration: Vec2,
    pub contact_point: Vec2,
}

impl StaticManifold {
    /// Same overlap seen from the other collider.
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            penetration: -self.penetration,
            contact_point: self.contact_point,
        }
    }

    #[inline]
    pub fn depth(&self) -> f32 {
        self.penetration.length()
    }
}

pub type StaticCollisionFn =
    fn(&Transform, &Transform, &ColliderShape, &ColliderShape) -> Option<StaticManifold>;

/// Routines indexed by `[kind of A][kind of B]`; boxes use the polygon slot.
pub const STATIC_DISPATCH: [[StaticCollisionFn; ShapeKind::COUNT]; ShapeKind::COUNT] = [
    [circle_vs_circle, circle_vs_aabb],
    [aabb_vs_circle, aabb_vs_aabb],
];

/// Overlap test for any pair of collider shapes.
pub fn static_intersection(
    transform_a: &Transform,
    transform_b: &Transform,
    shape_a: &ColliderShape,
    shape_b: &ColliderShape,
) -> Option<StaticManifold> {
    STATIC_DISPATCH[shape_a.kind().index()][shape_b.kind().index()](
        transform_a,
        transform_b,
        shape_a,
        shape_b,
    )
}

/// Box vs box; separates along the axis of least overlap.
pub fn aabb_vs_aabb(
    transform_a: &Transform,
    transform_b: &Transform,
    shape_a: &ColliderShape,
    shape_b: &ColliderShape,
) -> Option<StaticManifold> {
    let (ColliderShape::Aabb { size: size_a }, ColliderShape::Aabb { size: size_b }) = (shape_a, shape_b)
    else {
        return None;
    };

    let half_a = *size_a * 0.5;
    let half_b = *size_b * 0.5;
    let center_a = transform_a.position + half_a;
    let center_b = transform_b.position + half_b;

    let distance = center_b - center_a;
    let overlap = half_a + half_b - distance.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return None;
    }

    if overlap.x < overlap.y {
        let sign = sign_non_zero(distance.x);
        let normal = Vec2::new(sign, 0.0);
        Some(StaticManifold {
            normal,
            penetration: normal * overlap.x,
            contact_point: Vec2::new(center_a.x + half_a.x * sign, center_b.y),
        })
    } else {
        let sign = sign_non_zero(distance.y);
        let normal = Vec2::new(0.0, sign);
        Some(StaticManifold {
            normal,
            penetration: normal * overlap.y,
            contact_point: Vec2::new(center_b.x, center_a.y + half_a.y * sign),
        })
    }
}

/// Circle vs circle.
pub fn circle_vs_circle(
    transform_a: &Transform,
    transform_b: &Transform,
    shape_a: &ColliderShape,
    shape_b: &ColliderShape,
) -> Option<StaticManifold> {
    let (ColliderShape::Circle { radius: radius_a }, ColliderShape::Circle { radius: radius_b }) =
        (shape_a, shape_b)
    else {
        return None;
    };

    let delta = transform_b.position - transform_a.position;
    let radius = radius_a + radius_b;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    let distance = dist_sq.sqrt();
    if distance == 0.0 {
        return Some(StaticManifold {
            normal: Vec2::X,
            penetration: Vec2::X * *radius_a,
            contact_point: transform_a.position,
        });
    }

    let normal = delta / distance;
    Some(StaticManifold {
        normal,
        penetration: normal * (radius - distance),
        contact_point: transform_a.position + normal * *radius_a,
    })
}

/// Box (A) vs circle (B).
pub fn aabb_vs_circle(
    transform_a: &Transform,
    transform_b: &Transform,
    shape_a: &ColliderShape,
    shape_b: &ColliderShape,
) -> Option<StaticManifold> {
    let (ColliderShape::Aabb { size }, ColliderShape::Circle { radius }) = (shape_a, shape_b) else {
        return None;
    };

    let half = *size * 0.5;
    let box_center = transform_a.position + half;
    let offset = transform_b.position - box_center;
    let clamped = offset.clamp(-half, half);

    if clamped == offset {
        // Circle center inside the box: leave through the nearest face.
        let face_distance = half - offset.abs();
        let (normal, depth) = if face_distance.x <= face_distance.y {
            (Vec2::new(sign_non_zero(offset.x), 0.0), face_distance.x)
        } else {
            (Vec2::new(0.0, sign_non_zero(offset.y)), face_distance.y)
        };
        return Some(StaticManifold {
            normal,
            penetration: normal * (depth + *radius),
            contact_point: transform_b.position,
        });
    }

    let closest = box_center + clamped;
    let delta = transform_b.position - closest;
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    // Nonzero: the center is outside the box.
    let distance = dist_sq.sqrt();
    let normal = delta / distance;
    Some(StaticManifold {
        normal,
        penetration: normal * (*radius - distance),
        contact_point: closest,
    })
}

/// Circle (A) vs box (B): the box-circle overlap seen from the circle.
pub fn circle_vs_aabb(
    transform_a: &Transform,
    transform_b: &Transform,
    shape_a: &ColliderShape,
    shape_b: &ColliderShape,
) -> Option<StaticManifold> {
    aabb_vs_circle(transform_b, transform_a, shape_b, shape_a).map(StaticManifold::flipped)
}
