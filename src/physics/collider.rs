//! Axis-aligned boxes and the shapes used by the static and swept passes.

use glam::Vec2;

use super::shape::ShapeKind;
use super::transform::Transform;

/// Axis-aligned bounding box stored as its min corner plus size.
///
/// In screen-style coordinates the min corner is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub position: Vec2,
    pub size: Vec2,
}

impl Aabb {
    #[inline]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    #[inline]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, half_extents * 2.0)
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min, max - min)
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.position + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size * 0.5
    }

    /// Test whether two boxes overlap. Touching edges count.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        a_min.x <= b_max.x && a_max.x >= b_min.x && a_min.y <= b_max.y && a_max.y >= b_min.y
    }

    /// Half-open point containment: min edges are inside, max edges are not.
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.y >= min.y && point.x < max.x && point.y < max.y
    }

    /// Minkowski sum with a box of `size` centered on the origin.
    #[inline]
    pub fn expanded_by(&self, size: Vec2) -> Aabb {
        Aabb::new(self.position - size * 0.5, self.size + size)
    }

    /// Box covering this box at its start and after moving by `displacement`.
    pub fn swept_bounds(&self, displacement: Vec2) -> Aabb {
        let min = self.position + displacement.min(Vec2::ZERO);
        Aabb::new(min, self.size + displacement.abs())
    }

    /// Smallest box containing both.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }
}

/// Collision shape for the static and swept passes.
///
/// Boxes are positioned by their min corner, circles by their center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Aabb { size: Vec2 },
    Circle { radius: f32 },
}

impl ColliderShape {
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            ColliderShape::Circle { .. } => ShapeKind::Circle,
            ColliderShape::Aabb { .. } => ShapeKind::Polygon,
        }
    }

    /// World-space bounds for a collider at `transform`.
    #[inline]
    pub fn compute_aabb(&self, transform: &Transform) -> Aabb {
        match self {
            ColliderShape::Aabb { size } => Aabb::new(transform.position, *size),
            ColliderShape::Circle { radius } => {
                Aabb::from_center(transform.position, Vec2::splat(*radius))
            }
        }
    }

    /// Center of the collider at `transform`.
    #[inline]
    pub fn center(&self, transform: &Transform) -> Vec2 {
        match self {
            ColliderShape::Aabb { size } => transform.position + *size * 0.5,
            ColliderShape::Circle { .. } => transform.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_inclusive() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let b = Aabb::new(Vec2::new(1.0, 0.0), Vec2::ONE);
        let c = Aabb::new(Vec2::new(1.01, 0.0), Vec2::ONE);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_contains_point_is_half_open() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        assert!(a.contains_point(Vec2::ZERO));
        assert!(a.contains_point(Vec2::splat(0.5)));
        assert!(!a.contains_point(Vec2::ONE));
    }

    #[test]
    fn test_swept_bounds_cover_both_ends() {
        let a = Aabb::new(Vec2::new(2.0, 2.0), Vec2::ONE);
        let swept = a.swept_bounds(Vec2::new(-3.0, 1.0));
        assert_eq!(swept.min(), Vec2::new(-1.0, 2.0));
        assert_eq!(swept.max(), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_expanded_keeps_center() {
        let a = Aabb::new(Vec2::new(4.0, 0.0), Vec2::new(2.0, 2.0));
        let e = a.expanded_by(Vec2::new(1.0, 3.0));
        assert_eq!(e.center(), a.center());
        assert_eq!(e.size, Vec2::new(3.0, 5.0));
    }

    #[test]
    fn test_collider_bounds() {
        let t = Transform::from_position(Vec2::new(1.0, 1.0));
        let circle = ColliderShape::Circle { radius: 0.5 };
        assert_eq!(
            circle.compute_aabb(&t),
            Aabb::new(Vec2::new(0.5, 0.5), Vec2::ONE)
        );
        let rect = ColliderShape::Aabb { size: Vec2::new(2.0, 1.0) };
        assert_eq!(rect.center(&t), Vec2::new(2.0, 1.5));
        assert_eq!(rect.kind(), ShapeKind::Polygon);
    }
}
