//! Collision shapes in body-local space.
//!
//! A [`Shape`] is owned by exactly one [`Body`](super::rigid_body::Body).
//! Cloning a shape is a deep copy, so bodies never share geometry.

use std::f32::consts::PI;

use glam::{Mat2, Vec2};

use crate::error::ShapeError;

/// Discriminant used to index the collision dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Circle = 0,
    /// Convex polygons. Axis-aligned boxes in the static pass share this slot.
    Polygon = 1,
}

impl ShapeKind {
    /// Number of shape kinds (dimension of the dispatch tables).
    pub const COUNT: usize = 2;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Mass properties derived from a shape's geometry and a density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassData {
    pub mass: f32,
    /// Moment of inertia about the centroid.
    pub inertia: f32,
    /// Centroid in the shape's original local frame.
    pub centroid: Vec2,
}

/// A circle centered on the body position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    radius: f32,
}

impl Circle {
    pub fn new(radius: f32) -> Result<Self, ShapeError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(ShapeError::InvalidRadius(radius));
        }
        Ok(Self { radius })
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn compute_mass(&self, density: f32) -> MassData {
        let r2 = self.radius * self.radius;
        let mass = PI * r2 * density;
        MassData {
            mass,
            inertia: mass * r2,
            centroid: Vec2::ZERO,
        }
    }
}

/// A convex polygon with counter-clockwise vertices and outward unit face normals.
///
/// `normals[i]` belongs to the edge `vertices[i] -> vertices[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    rotation: Mat2,
}

impl Polygon {
    /// Build the convex hull of `points` (gift wrapping).
    ///
    /// Interior and collinear points are dropped. Fails when fewer than three
    /// points are given or the hull has no area.
    pub fn from_points(points: &[Vec2]) -> Result<Self, ShapeError> {
        let count = points.len();
        if count < 3 {
            return Err(ShapeError::TooFewVertices { count });
        }
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(ShapeError::NonFiniteVertex { index });
        }

        // Right-most point, lowest y on ties, is always on the hull.
        let mut right_most = 0;
        for (i, p) in points.iter().enumerate().skip(1) {
            let best = points[right_most];
            if p.x > best.x || (p.x == best.x && p.y < best.y) {
                right_most = i;
            }
        }

        let mut hull = Vec::with_capacity(count);
        let mut current = right_most;
        loop {
            if hull.len() >= count {
                return Err(ShapeError::DegenerateHull { count: hull.len() });
            }
            hull.push(current);

            let mut next = 0;
            for i in 1..count {
                if next == current {
                    next = i;
                    continue;
                }
                let e1 = points[next] - points[current];
                let e2 = points[i] - points[current];
                let c = e1.perp_dot(e2);
                if c < 0.0 || (c == 0.0 && e2.length_squared() > e1.length_squared()) {
                    next = i;
                }
            }

            current = next;
            if next == right_most {
                break;
            }
        }

        // Every other point lies left of each chosen edge, so the hull is CCW.
        let vertices: Vec<Vec2> = hull.iter().map(|&i| points[i]).collect();
        if vertices.len() < 3 {
            return Err(ShapeError::DegenerateHull {
                count: vertices.len(),
            });
        }

        Self::from_hull(vertices)
    }

    /// Axis-aligned box centered on the local origin.
    pub fn new_box(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        let valid = |x: f32| x.is_finite() && x > 0.0;
        if !valid(half_width) || !valid(half_height) {
            return Err(ShapeError::InvalidHalfExtents {
                half_width,
                half_height,
            });
        }
        Ok(Self {
            vertices: vec![
                Vec2::new(-half_width, -half_height),
                Vec2::new(half_width, -half_height),
                Vec2::new(half_width, half_height),
                Vec2::new(-half_width, half_height),
            ],
            normals: vec![
                Vec2::new(0.0, -1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(-1.0, 0.0),
            ],
            rotation: Mat2::IDENTITY,
        })
    }

    fn from_hull(vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        let n = vertices.len();
        let mut normals = Vec::with_capacity(n);
        for i in 0..n {
            let face = vertices[(i + 1) % n] - vertices[i];
            if face.length_squared() <= f32::EPSILON * f32::EPSILON {
                return Err(ShapeError::ZeroLengthEdge { index: i });
            }
            normals.push(Vec2::new(face.y, -face.x).normalize());
        }
        Ok(Self {
            vertices,
            normals,
            rotation: Mat2::IDENTITY,
        })
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Local-to-world rotation.
    #[inline]
    pub fn rotation(&self) -> Mat2 {
        self.rotation
    }

    pub fn set_orientation(&mut self, radians: f32) {
        self.rotation = Mat2::from_angle(radians);
    }

    /// Local endpoints of face `index`.
    #[inline]
    pub fn face(&self, index: usize) -> (Vec2, Vec2) {
        let n = self.vertices.len();
        (self.vertices[index % n], self.vertices[(index + 1) % n])
    }

    /// World position of vertex `index` for a polygon placed at `position`.
    #[inline]
    pub fn world_vertex(&self, index: usize, position: Vec2) -> Vec2 {
        self.rotation * self.vertices[index] + position
    }

    /// Vertex with the largest projection onto `direction` (local space).
    pub fn support(&self, direction: Vec2) -> Vec2 {
        let mut best = self.vertices[0];
        let mut best_projection = best.dot(direction);
        for &v in &self.vertices[1..] {
            let projection = v.dot(direction);
            if projection > best_projection {
                best = v;
                best_projection = projection;
            }
        }
        best
    }

    /// Area, centroid and inertia via a triangle fan around the local origin.
    ///
    /// Vertices are shifted so the centroid becomes the local origin, and the
    /// returned inertia is taken about that centroid.
    pub fn compute_mass(&mut self, density: f32) -> MassData {
        const INV3: f32 = 1.0 / 3.0;

        let n = self.vertices.len();
        let mut centroid = Vec2::ZERO;
        let mut area = 0.0;
        let mut inertia = 0.0;

        for i in 0..n {
            let p1 = self.vertices[i];
            let p2 = self.vertices[(i + 1) % n];
            let d = p1.perp_dot(p2);
            let triangle_area = 0.5 * d;
            area += triangle_area;
            centroid += triangle_area * INV3 * (p1 + p2);

            let intx2 = p1.x * p1.x + p2.x * p1.x + p2.x * p2.x;
            let inty2 = p1.y * p1.y + p2.y * p1.y + p2.y * p2.y;
            inertia += (0.25 * INV3 * d) * (intx2 + inty2);
        }

        centroid /= area;
        for v in &mut self.vertices {
            *v -= centroid;
        }
        // Parallel axis: move the second moment from the old origin to the centroid.
        inertia -= area * centroid.length_squared();

        MassData {
            mass: density * area,
            inertia: density * inertia,
            centroid,
        }
    }
}

/// A body's collision geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
}

impl Shape {
    pub fn circle(radius: f32) -> Result<Self, ShapeError> {
        Circle::new(radius).map(Self::Circle)
    }

    pub fn polygon(points: &[Vec2]) -> Result<Self, ShapeError> {
        Polygon::from_points(points).map(Self::Polygon)
    }

    pub fn rect(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        Polygon::new_box(half_width, half_height).map(Self::Polygon)
    }

    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Circle(_) => ShapeKind::Circle,
            Self::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Circles are rotation invariant, so only polygons track orientation.
    pub fn set_orientation(&mut self, radians: f32) {
        if let Self::Polygon(polygon) = self {
            polygon.set_orientation(radians);
        }
    }

    pub fn compute_mass(&mut self, density: f32) -> MassData {
        match self {
            Self::Circle(circle) => circle.compute_mass(density),
            Self::Polygon(polygon) => polygon.compute_mass(density),
        }
    }

    pub fn as_circle(&self) -> Option<&Circle> {
        match self {
            Self::Circle(circle) => Some(circle),
            Self::Polygon(_) => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match self {
            Self::Polygon(polygon) => Some(polygon),
            Self::Circle(_) => None,
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon(polygon)
    }
}
