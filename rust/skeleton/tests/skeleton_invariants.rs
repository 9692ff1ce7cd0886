// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Properties every solved skeleton must have, checked on a handful of
//! convex, concave and mixed-speed polygons.

use approx::assert_relative_eq;
use nalgebra::Point2;
use roofline_geometry::compute_signed_area;
use roofline_skeleton::{
    solve_skeleton, ArcKind, EdgeSpeed, Skeleton, SkeletonInput, DEFAULT_BUDGET_FACTOR,
};

/// Nodes are snapped together within the coordinate tolerance
const TOLERANCE: f64 = 1e-2;

fn ring(points: &[(f64, f64)]) -> Vec<Point2<f64>> {
    points.iter().map(|&(x, y)| Point2::new(x, y)).collect()
}

fn input(points: &[(f64, f64)], speeds: Vec<EdgeSpeed>) -> SkeletonInput {
    SkeletonInput::new(ring(points), speeds)
}

fn uniform(points: &[(f64, f64)]) -> SkeletonInput {
    input(points, vec![EdgeSpeed::Moving(1.0); points.len()])
}

/// Inward distance of `p` from the line of edge `e`
fn inward_distance(input: &SkeletonInput, e: usize, p: &Point2<f64>) -> f64 {
    let (a, b, _) = input.edges()[e];
    let d = (b - a).normalize();
    let normal = nalgebra::Vector2::new(-d.y, d.x);
    normal.dot(&(p - a))
}

/// Every arc endpoint sits on the fronts of both adjoining edges at the
/// node's time.
fn assert_nodes_on_fronts(input: &SkeletonInput, skeleton: &Skeleton) {
    for arc in &skeleton.arcs {
        for id in [arc.start, arc.end] {
            let node = &skeleton.nodes[id];
            assert!(node.time >= -TOLERANCE, "node below the eave: {node:?}");
            for e in arc.edges {
                let expected = input.edges()[e].2.value() * node.time;
                let actual = inward_distance(input, e, &node.position);
                assert!(
                    (actual - expected).abs() <= TOLERANCE,
                    "node {id} at {:?} is {actual} from edge {e}, front is at {expected}",
                    node.position
                );
            }
        }
    }
}

fn assert_faces_tile(input: &SkeletonInput, skeleton: &Skeleton) {
    let moving = input.edges().iter().filter(|(_, _, s)| !s.is_static()).count();
    assert_eq!(skeleton.faces.len(), moving);
    let mut total = 0.0;
    for face in &skeleton.faces {
        let area = compute_signed_area(&face.polygon(&skeleton.nodes));
        assert!(area > 0.0, "face of edge {} is not counter-clockwise", face.edge);
        total += area;
    }
    // Holes are clockwise, so their signed areas subtract
    let expected: f64 = input.rings().map(|(r, _)| compute_signed_area(r)).sum();
    assert_relative_eq!(total, expected, max_relative = 1e-6);
}

fn check(input: &SkeletonInput) -> Skeleton {
    let skeleton = solve_skeleton(input, DEFAULT_BUDGET_FACTOR).unwrap();
    assert_nodes_on_fronts(input, &skeleton);
    assert_faces_tile(input, &skeleton);
    skeleton
}

#[test]
fn convex_pentagon() {
    let skeleton = check(&uniform(&[
        (0.0, 0.0),
        (7000.0, 0.0),
        (9000.0, 4000.0),
        (4000.0, 7500.0),
        (-1000.0, 3500.0),
    ]));
    assert_eq!(skeleton.count(ArcKind::Valley), 0);
    assert_eq!(skeleton.count(ArcKind::Hip), 5);
}

#[test]
fn t_shape() {
    let skeleton = check(&uniform(&[
        (4500.0, 0.0),
        (7500.0, 0.0),
        (7500.0, 6000.0),
        (12000.0, 6000.0),
        (12000.0, 10000.0),
        (0.0, 10000.0),
        (0.0, 6000.0),
        (4500.0, 6000.0),
    ]));
    assert!(skeleton.count(ArcKind::Valley) >= 2);
}

#[test]
fn u_shape_splits_into_two_arms() {
    let skeleton = check(&uniform(&[
        (0.0, 0.0),
        (10000.0, 0.0),
        (10000.0, 9000.0),
        (7000.0, 9000.0),
        (7000.0, 3500.0),
        (3000.0, 3500.0),
        (3000.0, 9000.0),
        (0.0, 9000.0),
    ]));
    assert!(skeleton.count(ArcKind::Valley) >= 2);
    assert!(skeleton.count(ArcKind::Ridge) >= 2);
}

#[test]
fn mixed_speeds_and_gable() {
    let skeleton = check(&input(
        &[(0.0, 0.0), (10000.0, 0.0), (10000.0, 6000.0), (0.0, 6000.0)],
        vec![
            EdgeSpeed::Moving(3f64.sqrt()),
            EdgeSpeed::Static,
            EdgeSpeed::Moving(1.0 / 3f64.sqrt()),
            EdgeSpeed::Moving(1.0),
        ],
    ));
    assert_eq!(skeleton.count(ArcKind::Rake), 2);
    assert_eq!(skeleton.count(ArcKind::Ridge), 1);
}

#[test]
fn solving_is_deterministic() {
    let input = uniform(&[
        (0.0, 0.0),
        (8000.0, 0.0),
        (8000.0, 4000.0),
        (4000.0, 4000.0),
        (4000.0, 8000.0),
        (0.0, 8000.0),
    ]);
    let a = solve_skeleton(&input, DEFAULT_BUDGET_FACTOR).unwrap();
    let b = solve_skeleton(&input, DEFAULT_BUDGET_FACTOR).unwrap();
    assert_eq!(a.nodes, b.nodes);
    assert_eq!(a.arcs, b.arcs);
    assert_eq!(a.faces, b.faces);
}

#[test]
fn courtyard_with_uneven_bands() {
    // West band 5000 wide, the others 3000
    let input = uniform(&[(0.0, 0.0), (14000.0, 0.0), (14000.0, 10000.0), (0.0, 10000.0)])
        .with_hole(
            ring(&[(5000.0, 3000.0), (5000.0, 7000.0), (11000.0, 7000.0), (11000.0, 3000.0)]),
            vec![EdgeSpeed::Moving(1.0); 4],
        );
    let skeleton = check(&input);
    // The wide band adds a hip at each end where it meets the narrow ones
    assert_eq!(skeleton.count(ArcKind::Hip), 6);
    assert_eq!(skeleton.count(ArcKind::Valley), 4);
    let top = skeleton
        .nodes
        .iter()
        .map(|n| n.time)
        .fold(0.0, f64::max);
    assert_relative_eq!(top, 2500.0, epsilon = 1e-3);
}
