//! Error types for shape construction and physics configuration.

use thiserror::Error;

/// Errors raised while building a shape.
///
/// These correspond to construction-time bugs (a polygon that cannot be a
/// convex hull, a negative radius). Collision queries themselves never fail.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ShapeError {
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("convex hull collapsed to {count} vertices (collinear or duplicate input)")]
    DegenerateHull { count: usize },

    #[error("polygon edge {index} has zero length")]
    ZeroLengthEdge { index: usize },

    #[error("vertex {index} is not finite")]
    NonFiniteVertex { index: usize },

    #[error("invalid circle radius: {0} (must be finite and >= 0)")]
    InvalidRadius(f32),

    #[error("invalid box half extents: ({half_width}, {half_height}) (must be finite and > 0)")]
    InvalidHalfExtents { half_width: f32, half_height: f32 },
}

/// Top-level error type for the physics crate.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Invalid timestep: {0} (must be finite and > 0)")]
    InvalidTimestep(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
