//! Narrowphase collision detection between body shapes.
//!
//! Every routine returns `None` when the bodies are separated and otherwise a
//! [`ContactInfo`] with the normal pointing from the first body to the second.

use glam::Vec2;
use tracing::trace;

use super::contact::ContactInfo;
use super::rigid_body::Body;
use super::shape::{Polygon, Shape, ShapeKind};

/// Signature shared by the pairwise routines.
pub type CollisionFn = fn(&Body, &Body) -> Option<ContactInfo>;

/// Routines indexed by `[kind of A][kind of B]`.
pub const DISPATCH: [[CollisionFn; ShapeKind::COUNT]; ShapeKind::COUNT] = [
    [circle_circle, circle_polygon],
    [polygon_circle, polygon_polygon],
];

/// Detect collision between two bodies using their shape kinds.
pub fn detect_collision(a: &Body, b: &Body) -> Option<ContactInfo> {
    DISPATCH[a.shape().kind().index()][b.shape().kind().index()](a, b)
}

/// Circle vs circle.
pub fn circle_circle(a: &Body, b: &Body) -> Option<ContactInfo> {
    let (Shape::Circle(circle_a), Shape::Circle(circle_b)) = (a.shape(), b.shape()) else {
        return None;
    };

    let delta = b.position - a.position;
    let radius = circle_a.radius() + circle_b.radius();
    let dist_sq = delta.length_squared();
    if dist_sq >= radius * radius {
        return None;
    }

    let distance = dist_sq.sqrt();
    if distance == 0.0 {
        // Coincident centers: pick a fixed axis.
        return Some(ContactInfo::single(Vec2::X, circle_a.radius(), a.position));
    }

    let normal = delta / distance;
    Some(ContactInfo::single(
        normal,
        radius - distance,
        a.position + normal * circle_a.radius(),
    ))
}

/// Circle (A) vs polygon (B), tested in the polygon's local frame.
pub fn circle_polygon(a: &Body, b: &Body) -> Option<ContactInfo> {
    let (Shape::Circle(circle), Shape::Polygon(polygon)) = (a.shape(), b.shape()) else {
        return None;
    };
    let radius = circle.radius();
    let rotation = polygon.rotation();
    let center = rotation.transpose() * (a.position - b.position);

    // Face of least penetration
    let mut separation = f32::MIN;
    let mut face = 0;
    for (i, (n, v)) in polygon.normals().iter().zip(polygon.vertices()).enumerate() {
        let s = n.dot(center - *v);
        if s > radius {
            return None;
        }
        if s > separation {
            separation = s;
            face = i;
        }
    }

    let face_normal = polygon.normals()[face];
    let (v1, v2) = polygon.face(face);

    // Center inside the polygon
    if separation < f32::EPSILON {
        let normal = -(rotation * face_normal);
        return Some(ContactInfo::single(
            normal,
            radius,
            a.position + normal * radius,
        ));
    }

    let dot1 = (center - v1).dot(v2 - v1);
    let dot2 = (center - v2).dot(v1 - v2);

    if dot1 <= 0.0 {
        vertex_contact(center, v1, radius, polygon, b.position)
    } else if dot2 <= 0.0 {
        vertex_contact(center, v2, radius, polygon, b.position)
    } else {
        if (center - v1).dot(face_normal) > radius {
            return None;
        }
        let normal = -(rotation * face_normal);
        Some(ContactInfo::single(
            normal,
            radius - separation,
            a.position + normal * radius,
        ))
    }
}

/// Circle center in the Voronoi region of `vertex` (both in polygon space).
fn vertex_contact(
    center: Vec2,
    vertex: Vec2,
    radius: f32,
    polygon: &Polygon,
    polygon_position: Vec2,
) -> Option<ContactInfo> {
    let dist_sq = center.distance_squared(vertex);
    if dist_sq > radius * radius {
        return None;
    }
    // Nonzero: the center sits at least EPSILON outside the face.
    let distance = dist_sq.sqrt();
    let rotation = polygon.rotation();
    let normal = rotation * ((vertex - center) / distance);
    Some(ContactInfo::single(
        normal,
        radius - distance,
        rotation * vertex + polygon_position,
    ))
}

/// Polygon (A) vs circle (B): the circle-polygon contact with the normal reversed.
pub fn polygon_circle(a: &Body, b: &Body) -> Option<ContactInfo> {
    circle_polygon(b, a).map(ContactInfo::flipped)
}

/// Polygon vs polygon using the separating axis test and reference-face clipping.
pub fn polygon_polygon(a: &Body, b: &Body) -> Option<ContactInfo> {
    let (Shape::Polygon(poly_a), Shape::Polygon(poly_b)) = (a.shape(), b.shape()) else {
        return None;
    };

    let (penetration_a, face_a) = find_axis_least_penetration(poly_a, a.position, poly_b, b.position);
    if penetration_a >= 0.0 {
        return None;
    }
    let (penetration_b, face_b) = find_axis_least_penetration(poly_b, b.position, poly_a, a.position);
    if penetration_b >= 0.0 {
        return None;
    }

    // Prefer A as reference unless B is clearly better.
    let (reference, ref_pos, incident, inc_pos, reference_index, flip) =
        if bias_greater_than(penetration_a, penetration_b) {
            (poly_a, a.position, poly_b, b.position, face_a, false)
        } else {
            (poly_b, b.position, poly_a, a.position, face_b, true)
        };

    let mut incident_face = find_incident_face(reference, incident, inc_pos, reference_index);

    let (v1, v2) = reference.face(reference_index);
    let v1 = reference.rotation() * v1 + ref_pos;
    let v2 = reference.rotation() * v2 + ref_pos;

    let side_plane_normal = (v2 - v1).normalize();
    let ref_face_normal = Vec2::new(side_plane_normal.y, -side_plane_normal.x);

    let ref_c = ref_face_normal.dot(v1);
    let neg_side = -side_plane_normal.dot(v1);
    let pos_side = side_plane_normal.dot(v2);

    // Clip the incident face to the reference face's side planes.
    if clip(-side_plane_normal, neg_side, &mut incident_face) < 2 {
        trace!("incident face clipped away (negative side)");
        return None;
    }
    if clip(side_plane_normal, pos_side, &mut incident_face) < 2 {
        trace!("incident face clipped away (positive side)");
        return None;
    }

    let normal = if flip { -ref_face_normal } else { ref_face_normal };

    // Keep points behind the reference face.
    let mut points = [Vec2::ZERO; 2];
    let mut point_count = 0;
    let mut penetration = 0.0;
    for point in incident_face {
        let separation = ref_face_normal.dot(point) - ref_c;
        if separation <= 0.0 {
            points[point_count] = point;
            penetration += -separation;
            point_count += 1;
        }
    }
    if point_count == 0 {
        return None;
    }
    penetration /= point_count as f32;

    Some(ContactInfo {
        normal,
        penetration,
        points,
        point_count,
    })
}

/// Largest signed distance from B's support point to each face of A.
///
/// Returns `(distance, face index of A)`. A non-negative distance means a
/// separating axis exists.
pub fn find_axis_least_penetration(
    a: &Polygon,
    a_position: Vec2,
    b: &Polygon,
    b_position: Vec2,
) -> (f32, usize) {
    let b_rotation_t = b.rotation().transpose();
    let mut best_distance = f32::MIN;
    let mut best_index = 0;

    for i in 0..a.vertex_count() {
        // Face normal and vertex of A in B's model space
        let n = b_rotation_t * (a.rotation() * a.normals()[i]);
        let v = b_rotation_t * (a.world_vertex(i, a_position) - b_position);
        let support = b.support(-n);
        let d = n.dot(support - v);
        if d > best_distance {
            best_distance = d;
            best_index = i;
        }
    }

    (best_distance, best_index)
}

/// World-space face of `incident` most anti-parallel to the reference normal.
fn find_incident_face(
    reference: &Polygon,
    incident: &Polygon,
    incident_position: Vec2,
    reference_index: usize,
) -> [Vec2; 2] {
    let reference_normal =
        incident.rotation().transpose() * (reference.rotation() * reference.normals()[reference_index]);

    let mut incident_index = 0;
    let mut min_dot = f32::MAX;
    for (i, n) in incident.normals().iter().enumerate() {
        let d = reference_normal.dot(*n);
        if d < min_dot {
            min_dot = d;
            incident_index = i;
        }
    }

    let next = (incident_index + 1) % incident.vertex_count();
    [
        incident.world_vertex(incident_index, incident_position),
        incident.world_vertex(next, incident_position),
    ]
}

/// Clip a segment against the half-plane `n·x <= c`. Returns how many points remain.
fn clip(n: Vec2, c: f32, face: &mut [Vec2; 2]) -> usize {
    let mut out = *face;
    let mut count = 0;

    let d1 = n.dot(face[0]) - c;
    let d2 = n.dot(face[1]) - c;

    if d1 <= 0.0 {
        out[count] = face[0];
        count += 1;
    }
    if d2 <= 0.0 {
        out[count] = face[1];
        count += 1;
    }
    // Endpoints on opposite sides: add the intersection.
    if d1 * d2 < 0.0 {
        let alpha = d1 / (d1 - d2);
        out[count] = face[0] + alpha * (face[1] - face[0]);
        count += 1;
    }

    debug_assert!(count <= 2);
    *face = out;
    count
}

/// Biased comparison that keeps the reference face stable between frames.
#[inline]
fn bias_greater_than(a: f32, b: f32) -> bool {
    const RELATIVE: f32 = 0.95;
    const ABSOLUTE: f32 = 0.01;
    a >= b * RELATIVE + a * ABSOLUTE
}
