use glam::{Mat2, Vec2};

use rein_physics2d::physics::contact::{CORRECTION_PERCENT, PENETRATION_SLOP};
use rein_physics2d::physics::swept::{dynamic_aabb_vs_aabb, sweep_and_resolve};
use rein_physics2d::{detect_collision, Aabb, Body, Manifold, Polygon, Shape};

fn circle(position: Vec2, radius: f32) -> Body {
    Body::new(Shape::circle(radius).unwrap(), position)
}

#[test]
fn circles_collide_only_when_closer_than_radii() {
    let eps = 1e-5;
    for &(distance, ra, rb) in &[(0.5, 1.0, 1.0), (1.9, 1.0, 1.0), (2.0, 1.0, 1.0), (3.5, 2.0, 1.0), (2.9, 2.0, 1.0)] {
        let a = circle(Vec2::ZERO, ra);
        let b = circle(Vec2::new(0.0, distance), rb);
        let contact = detect_collision(&a, &b);
        if distance >= ra + rb {
            assert!(contact.is_none(), "distance {distance} should not collide");
        } else {
            let info = contact.unwrap();
            assert!((info.penetration - ((ra + rb) - distance)).abs() < eps);
            assert!((info.normal - Vec2::Y).length() < eps);
        }
    }
}

#[test]
fn coincident_circles_use_fixed_axis() {
    let info = detect_collision(&circle(Vec2::ONE, 0.7), &circle(Vec2::ONE, 0.4)).unwrap();
    assert_eq!(info.normal, Vec2::new(1.0, 0.0));
    assert_eq!(info.penetration, 0.7);
}

#[test]
fn sat_picks_axis_of_least_overlap() {
    let eps = 1e-5;
    let square = |p: Vec2| Body::new(Shape::rect(0.5, 0.5).unwrap(), p);
    // Overlap 0.3 on x and 0.8 on y.
    let a = square(Vec2::ZERO);
    let b = square(Vec2::new(0.7, 0.2));
    let info = detect_collision(&a, &b).unwrap();
    assert!((info.normal.x.abs() - 1.0).abs() < eps);
    assert!(info.normal.y.abs() < eps);
    assert!((info.penetration - 0.3).abs() < eps);

    // Mirrored: the normal still points from A to B.
    let c = square(Vec2::new(-0.7, 0.2));
    let info = detect_collision(&a, &c).unwrap();
    assert!((info.normal - Vec2::new(-1.0, 0.0)).length() < eps);
}

#[test]
fn swept_box_hits_halfway_and_never_penetrates() {
    let eps = 1e-4;
    let mover = Aabb::new(Vec2::ZERO, Vec2::ONE);
    let target = Aabb::new(Vec2::new(6.0, 0.0), Vec2::ONE);

    let hit = dynamic_aabb_vs_aabb(1.0, Vec2::new(10.0, 0.0), &mover, &target).unwrap();
    assert!((hit.time - 0.5).abs() < eps);
    assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));

    let result = sweep_and_resolve(1.0, Vec2::new(10.0, 0.0), &mover, &[((), target)]);
    let end = Aabb::new(mover.position + result.velocity, mover.size);
    assert!(end.max().x <= target.min().x + eps);
}

#[test]
fn swept_boxes_do_not_tunnel_through_thin_walls() {
    let eps = 1e-3;
    let wall = Aabb::new(Vec2::new(5.0, -20.0), Vec2::new(0.05, 40.0));
    let mover = Aabb::new(Vec2::ZERO, Vec2::ONE);
    for speed in [6.0_f32, 20.0, 80.0, 500.0] {
        for &slope in &[-0.5_f32, -0.1, 0.0, 0.3, 0.9] {
            let velocity = Vec2::new(speed, speed * slope);
            let result = sweep_and_resolve(1.0, velocity, &mover, &[(0, wall)]);
            let end = Aabb::new(mover.position + result.velocity, mover.size);
            assert!(
                end.max().x <= wall.min().x + eps,
                "speed {speed} slope {slope} ended at {}",
                end.max().x
            );
        }
    }
}

#[test]
fn impulse_reverses_or_equalizes_head_on_circles() {
    let eps = 1e-4;
    for restitution in [1.0_f32, 0.0] {
        let mut a = circle(Vec2::new(-0.9, 0.0), 1.0).with_velocity(Vec2::new(2.0, 0.0));
        let mut b = circle(Vec2::new(0.9, 0.0), 1.0).with_velocity(Vec2::new(-2.0, 0.0));
        a.restitution = restitution;
        b.restitution = restitution;

        let mut manifold = Manifold::new(0, 1);
        assert!(manifold.solve(&a, &b));
        manifold.initialize(&a, &b, Vec2::ZERO, 1.0 / 60.0);
        let before = (b.velocity - a.velocity).dot(manifold.normal);
        manifold.apply_impulse(&mut a, &mut b);
        let after = (b.velocity - a.velocity).dot(manifold.normal);

        if restitution == 1.0 {
            assert!((after + before).abs() < eps);
        } else {
            assert!(after.abs() < eps);
        }
        // Equal masses: momentum stays zero.
        assert!((a.velocity + b.velocity).length() < eps);
    }
}

#[test]
fn positional_correction_converges_without_overshoot() {
    let mut floor = Body::new_static(Shape::rect(5.0, 0.5).unwrap(), Vec2::ZERO);
    let mut block = Body::new(Shape::rect(0.5, 0.5).unwrap(), Vec2::new(0.0, 0.6));
    let mut manifold = Manifold::new(0, 1);

    let mut previous_y = block.position.y;
    for _ in 0..20 {
        if !manifold.solve(&floor, &block) {
            break;
        }
        manifold.positional_correction(&mut floor, &mut block, PENETRATION_SLOP, CORRECTION_PERCENT * 0.5);
        // Correction only ever pushes the block out of the floor.
        assert!(block.position.y >= previous_y);
        previous_y = block.position.y;
    }
    manifold.solve(&floor, &block);
    assert!(manifold.penetration <= PENETRATION_SLOP + 1e-3);
    assert!(manifold.penetration >= 0.0);
    assert_eq!(floor.position, Vec2::ZERO);

    // Below the slop nothing moves.
    let y = block.position.y;
    manifold.positional_correction(&mut floor, &mut block, 1.0, CORRECTION_PERCENT);
    assert_eq!(block.position.y, y);
}

#[test]
fn polygon_mass_is_invariant_under_rigid_transforms() {
    let eps = 1e-3;
    let points = [
        Vec2::new(0.0, 0.0),
        Vec2::new(3.0, 0.0),
        Vec2::new(4.0, 2.0),
        Vec2::new(1.5, 3.5),
        Vec2::new(-0.5, 1.5),
    ];
    let mut reference = Polygon::from_points(&points).unwrap();
    let expected = reference.compute_mass(1.5);

    for (angle, offset) in [(0.3_f32, Vec2::new(3.0, -2.0)), (2.0, Vec2::new(-4.0, 2.5)), (4.4, Vec2::ZERO)] {
        let rotation = Mat2::from_angle(angle);
        let moved: Vec<Vec2> = points.iter().map(|p| rotation * *p + offset).collect();
        let mut polygon = Polygon::from_points(&moved).unwrap();
        let data = polygon.compute_mass(1.5);
        assert!((data.mass - expected.mass).abs() < eps);
        assert!(
            (data.inertia - expected.inertia).abs() < eps * expected.inertia,
            "angle {angle}: {} vs {}",
            data.inertia,
            expected.inertia
        );
        let expected_centroid = rotation * expected.centroid + offset;
        assert!((data.centroid - expected_centroid).length() < eps);
    }
}
