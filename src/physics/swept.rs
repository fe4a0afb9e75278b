//! Continuous collision of a moving box against static boxes.
//!
//! Works on raw positions, sizes and velocities so it can run inside any
//! driver. A mover is swept as a ray from its center against each target
//! expanded by the mover's size.

use std::cmp::Ordering;

use glam::Vec2;
use tracing::trace;

use super::collider::Aabb;

/// Where and when a ray (or swept box) first meets a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Entry time as a fraction of the ray direction.
    pub time: f32,
    /// Exit time as a fraction of the ray direction.
    pub far_time: f32,
    /// Surface normal at the entry point, facing the ray.
    pub normal: Vec2,
    /// Entry point in world space.
    pub point: Vec2,
}

impl RayHit {
    /// Hit at time zero with a real normal: the mover is resting against the target.
    #[inline]
    pub fn is_touching(&self) -> bool {
        self.time == 0.0 && self.normal != Vec2::ZERO
    }
}

/// Slab test of a ray against a box.
///
/// `direction` is not normalized; `time` is in units of it. Rays that graze a
/// box edge along a zero direction component are rejected.
pub fn ray_vs_aabb(origin: Vec2, direction: Vec2, target: &Aabb) -> Option<RayHit> {
    let inverse_direction = direction.recip();

    let mut near = (target.min() - origin) * inverse_direction;
    let mut far = (target.max() - origin) * inverse_direction;

    // 0 * inf: the origin lies on a slab boundary with no motion along that axis.
    if near.is_nan() || far.is_nan() {
        return None;
    }

    if near.x > far.x {
        std::mem::swap(&mut near.x, &mut far.x);
    }
    if near.y > far.y {
        std::mem::swap(&mut near.y, &mut far.y);
    }

    if near.x > far.y || near.y > far.x {
        return None;
    }

    let time = near.x.max(near.y);
    let far_time = far.x.min(far.y);

    // Box is behind the ray
    if far_time < 0.0 {
        return None;
    }

    let point = origin + time * direction;

    let normal = match near.x.partial_cmp(&near.y) {
        Some(Ordering::Greater) => {
            if inverse_direction.x < 0.0 {
                Vec2::X
            } else {
                -Vec2::X
            }
        }
        Some(Ordering::Less) => {
            if inverse_direction.y < 0.0 {
                Vec2::Y
            } else {
                -Vec2::Y
            }
        }
        // Exact corner hit
        _ => -crate::math::sign_or_zero(direction),
    };

    Some(RayHit {
        time,
        far_time,
        normal,
        point,
    })
}

/// Time of impact of `mover` travelling `velocity * dt` against a static `target`.
///
/// Only hits with `0 <= time < 1` count. A zero velocity never hits.
pub fn dynamic_aabb_vs_aabb(dt: f32, velocity: Vec2, mover: &Aabb, target: &Aabb) -> Option<RayHit> {
    if velocity == Vec2::ZERO {
        return None;
    }

    let expanded = target.expanded_by(mover.size);
    let hit = ray_vs_aabb(mover.center(), velocity * dt, &expanded)?;

    (hit.time >= 0.0 && hit.time < 1.0).then_some(hit)
}

/// Detect and, on a hit, remove the part of `velocity` that would carry the
/// mover past the contact surface.
pub fn resolve_dynamic_aabb_vs_aabb(
    dt: f32,
    velocity: &mut Vec2,
    mover: &Aabb,
    target: &Aabb,
) -> Option<RayHit> {
    let hit = dynamic_aabb_vs_aabb(dt, *velocity, mover, target)?;
    *velocity += hit.normal * velocity.abs() * (1.0 - hit.time);
    Some(hit)
}

/// A resolved hit tagged with the caller's key for the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweptHit<K> {
    pub key: K,
    pub hit: RayHit,
}

/// Order hits by time, then axis-aligned normals before diagonal ones.
pub fn sort_hits<K>(hits: &mut [SweptHit<K>]) {
    hits.sort_by(|a, b| hit_order(&a.hit, &b.hit));
}

fn hit_order(a: &RayHit, b: &RayHit) -> Ordering {
    a.time
        .total_cmp(&b.time)
        .then_with(|| a.normal.length_squared().total_cmp(&b.normal.length_squared()))
}

/// Outcome of sweeping one mover through a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult<K> {
    /// Velocity after every resolved hit.
    pub velocity: Vec2,
    /// Hits that were resolved, in the order they were applied.
    pub hits: Vec<SweptHit<K>>,
    /// Whether the corrected velocity was swept a second time.
    pub repeated: bool,
}

impl<K: Copy> SweepResult<K> {
    /// Targets the mover rests against (hit at time zero).
    pub fn touching(&self) -> impl Iterator<Item = &SweptHit<K>> + '_ {
        self.hits.iter().filter(|h| h.hit.is_touching())
    }
}

/// Sweep `mover` against every target and resolve hits in time order.
///
/// Targets outside the box covering the whole motion are skipped. If the
/// first pass changed the velocity the sweep runs once more with it, which
/// catches obstacles newly reachable after sliding along a surface.
pub fn sweep_and_resolve<K: Copy>(
    dt: f32,
    velocity: Vec2,
    mover: &Aabb,
    targets: &[(K, Aabb)],
) -> SweepResult<K> {
    let broad = mover.swept_bounds(velocity * dt);
    let candidates: Vec<&(K, Aabb)> = targets.iter().filter(|(_, t)| broad.overlaps(t)).collect();

    let mut result = SweepResult {
        velocity,
        hits: Vec::new(),
        repeated: false,
    };
    if candidates.is_empty() {
        return result;
    }

    resolve_pass(dt, &mut result, mover, &candidates);
    if result.velocity != velocity {
        trace!(?velocity, corrected = ?result.velocity, "repeating sweep");
        result.repeated = true;
        resolve_pass(dt, &mut result, mover, &candidates);
    }
    result
}

fn resolve_pass<K: Copy>(
    dt: f32,
    result: &mut SweepResult<K>,
    mover: &Aabb,
    candidates: &[&(K, Aabb)],
) {
    let mut pending: Vec<(K, &Aabb, RayHit)> = candidates
        .iter()
        .filter_map(|(key, target)| {
            dynamic_aabb_vs_aabb(dt, result.velocity, mover, target).map(|hit| (*key, target, hit))
        })
        .collect();
    pending.sort_by(|a, b| hit_order(&a.2, &b.2));

    // Earlier resolutions change the velocity, so each target is re-tested.
    for (key, target, _) in pending {
        if let Some(hit) = resolve_dynamic_aabb_vs_aabb(dt, &mut result.velocity, mover, target) {
            result.hits.push(SweptHit { key, hit });
        }
    }
}
