//! Per-frame collision driver.
//!
//! Order within one [`CollisionSystem::update`]:
//!
//! 1. Clear every [`Collider`]
//! 2. Sweep each moving box against the other boxes and correct its velocity
//! 3. Integrate its position
//! 4. Static overlap test for every collideable pair, recording manifolds on
//!    both colliders and pushing movable entities apart
//!
//! Entities are copied out of the world first and written back at the end,
//! so a single entity can appear in many pairs without borrow conflicts.

use glam::Vec2;
use tracing::{debug, trace, warn};

use crate::ecs::components::{Collider, ColliderShape, RigidBody, Transform};
use crate::physics::broadphase::{Broadphase, BroadphaseKind};
use crate::physics::collider::Aabb;
use crate::physics::intersection::{static_intersection, StaticManifold};
use crate::physics::swept::sweep_and_resolve;

/// Configuration for the collision system.
#[derive(Debug, Clone)]
pub struct CollisionConfig {
    /// Broadphase for the static pass. Default: brute force.
    pub broadphase: BroadphaseKind,
    /// Push overlapping entities apart after recording manifolds. Default: true.
    pub resolve_overlaps: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            broadphase: BroadphaseKind::BruteForce,
            resolve_overlaps: true,
        }
    }
}

/// Counters for one update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    /// Entities swept this frame.
    pub swept: usize,
    /// Swept hits that changed a velocity.
    pub swept_hits: usize,
    /// Sweeps that ran a second pass.
    pub repeated_sweeps: usize,
    /// Overlapping pairs found by the static pass.
    pub overlaps: usize,
}

/// Snapshot of one collider entity.
struct Entry {
    entity: hecs::Entity,
    transform: Transform,
    shape: ColliderShape,
    collideable: bool,
    body: Option<RigidBody>,
}

impl Entry {
    #[inline]
    fn bounds(&self) -> Aabb {
        self.shape.compute_aabb(&self.transform)
    }

    #[inline]
    fn inverse_mass(&self) -> f32 {
        self.body.map_or(0.0, |b| b.inverse_mass.max(0.0))
    }
}

/// Results gathered for one entity before write-back.
#[derive(Default)]
struct Record {
    manifolds: Vec<StaticManifold>,
    colliding: Vec<hecs::Entity>,
    touching: Vec<(hecs::Entity, Vec2)>,
}

/// Swept and static collision over every entity with a
/// `Transform`, `ColliderShape` and `Collider`.
pub struct CollisionSystem {
    config: CollisionConfig,
    broadphase: Broadphase,
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new(CollisionConfig::default())
    }
}

impl CollisionSystem {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            broadphase: Broadphase::new(config.broadphase),
            config,
        }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Run one frame of collision detection and response.
    pub fn update(&mut self, world: &mut hecs::World, dt: f32) -> CollisionStats {
        let mut stats = CollisionStats::default();
        if !(dt.is_finite() && dt > 0.0) {
            warn!(dt, "skipping collision update with non-positive dt");
            return stats;
        }

        // 1. Clear previous frame's results
        for (_, collider) in world.query_mut::<&mut Collider>() {
            collider.clear();
        }

        // Moving entities without a collider just integrate.
        for (_, (transform, body)) in
            world.query_mut::<hecs::Without<(&mut Transform, &RigidBody), &Collider>>()
        {
            transform.position += body.velocity * dt;
        }

        let mut entries: Vec<Entry> = world
            .query::<(&Transform, &ColliderShape, &Collider, Option<&RigidBody>)>()
            .iter()
            .map(|(entity, (transform, shape, collider, body))| Entry {
                entity,
                transform: *transform,
                shape: *shape,
                collideable: collider.collideable,
                body: body.copied(),
            })
            .collect();
        // Archetype order depends on spawn history; sort for stable pair order.
        entries.sort_by_key(|e| e.entity);

        let mut records: Vec<Record> = entries.iter().map(|_| Record::default()).collect();

        // 2-3. Sweep and integrate each mover
        for i in 0..entries.len() {
            let Some(mut body) = entries[i].body else {
                continue;
            };

            let sweepable = entries[i].collideable
                && matches!(entries[i].shape, ColliderShape::Aabb { .. })
                && body.velocity != Vec2::ZERO;
            if sweepable {
                let mover = entries[i].bounds();
                let targets: Vec<(usize, Aabb)> = entries
                    .iter()
                    .enumerate()
                    .filter(|(j, e)| {
                        *j != i && e.collideable && matches!(e.shape, ColliderShape::Aabb { .. })
                    })
                    .map(|(j, e)| (j, e.bounds()))
                    .collect();

                let result = sweep_and_resolve(dt, body.velocity, &mover, &targets);
                stats.swept += 1;
                stats.swept_hits += result.hits.len();
                if result.repeated {
                    stats.repeated_sweeps += 1;
                }
                for hit in result.touching() {
                    records[i].touching.push((entries[hit.key].entity, hit.hit.normal));
                }
                if result.velocity != body.velocity {
                    trace!(
                        entity = ?entries[i].entity,
                        from = ?body.velocity,
                        to = ?result.velocity,
                        "swept velocity adjusted"
                    );
                }
                body.velocity = result.velocity;
            }

            entries[i].transform.position += body.velocity * dt;
            entries[i].body = Some(body);
        }

        // 4. Static overlap pass
        let active: Vec<usize> = (0..entries.len()).filter(|&i| entries[i].collideable).collect();
        let bounds: Vec<Aabb> = active.iter().map(|&i| entries[i].bounds()).collect();
        let pairs = self.broadphase.find_pairs(&bounds);

        for (pa, pb) in pairs {
            let (i, j) = (active[pa], active[pb]);
            let Some(manifold) = static_intersection(
                &entries[i].transform,
                &entries[j].transform,
                &entries[i].shape,
                &entries[j].shape,
            ) else {
                continue;
            };

            if self.config.resolve_overlaps {
                push_apart(&mut entries, i, j, &manifold);
            }

            // Rounding left by a swept stop is a resting contact, not an overlap.
            if manifold.depth() <= overlap_tolerance(bounds[pa], bounds[pb]) {
                trace!(
                    a = ?entries[i].entity,
                    b = ?entries[j].entity,
                    depth = manifold.depth(),
                    "ignoring rounding-level overlap"
                );
                continue;
            }
            stats.overlaps += 1;

            records[i].manifolds.push(manifold);
            records[i].colliding.push(entries[j].entity);
            records[j].manifolds.push(manifold.flipped());
            records[j].colliding.push(entries[i].entity);
        }

        // Write back
        for (entry, record) in entries.into_iter().zip(records) {
            if let Ok(mut transform) = world.get::<&mut Transform>(entry.entity) {
                *transform = entry.transform;
            }
            if let Some(body) = entry.body {
                if let Ok(mut rb) = world.get::<&mut RigidBody>(entry.entity) {
                    rb.velocity = body.velocity;
                }
            }
            if let Ok(mut collider) = world.get::<&mut Collider>(entry.entity) {
                collider.manifolds = record.manifolds;
                collider.colliding = record.colliding;
                collider.touching = record.touching;
            }
        }

        debug!(
            swept = stats.swept,
            swept_hits = stats.swept_hits,
            repeated = stats.repeated_sweeps,
            overlaps = stats.overlaps,
            "collision update"
        );
        stats
    }
}

/// Depth below which an overlap is float noise at the pair's coordinate scale.
fn overlap_tolerance(a: Aabb, b: Aabb) -> f32 {
    const ULPS: f32 = 16.0;
    let scale = a
        .min()
        .abs()
        .max(a.max().abs())
        .max(b.min().abs())
        .max(b.max().abs())
        .max_element()
        .max(1.0);
    ULPS * f32::EPSILON * scale
}

/// Separate an overlapping pair, sharing the penetration by inverse mass.
fn push_apart(entries: &mut [Entry], i: usize, j: usize, manifold: &StaticManifold) {
    let weight_i = entries[i].inverse_mass();
    let weight_j = entries[j].inverse_mass();
    let total = weight_i + weight_j;
    if total <= 0.0 {
        return;
    }
    entries[i].transform.position -= manifold.penetration * (weight_i / total);
    entries[j].transform.position += manifold.penetration * (weight_j / total);
}
