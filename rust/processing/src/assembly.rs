// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof assembly for one footprint.
//!
//! Pipeline: orient the footprint, offset it by the overhang into the eave
//! polygon, solve the weighted skeleton of the eave with one wavefront
//! speed per edge, lift every node to `baseline + time`, classify the arcs
//! into roof lines and clip the faces back onto the eave.

use nalgebra::{Point2, Vector2};
use roofline_geometry::primitives::{contour_bounds, dot2, normalize, perp, Contour, EPSILON};
use roofline_skeleton::{solve_skeleton, ArcKind, EdgeSpeed, SkeletonInput, SkeletonNode};
use tracing::debug;

use crate::config::RoofConfig;
use crate::directive::EdgeDirective;
use crate::eave::{build_eaves, Eave, EaveEdge};
use crate::error::{Result, RoofError};
use crate::reconcile::reconcile_faces;
use crate::result::{Point3D, RoofFace, RoofResult, RoofSolution, Segment3D};

/// Plan slack in mm when checking that output stays over the eave
const BOUNDS_MARGIN: f64 = 1.0;

/// Solve the roof over one footprint.
///
/// `directives` are aligned with the footprint edges in the caller's vertex
/// order; a clockwise footprint is reversed internally and its directives
/// follow their edges.
pub fn solve_roof(
    footprint: &[Point2<f64>],
    directives: &[EdgeDirective],
    config: &RoofConfig,
) -> Result<RoofSolution> {
    config.validate()?;
    let eaves = build_eaves(0, footprint, Some(directives), config)?;
    solve_eaves(&eaves, config)
}

/// Solve a hip roof at the configured default pitch on every edge.
pub fn solve_hip_roof(footprint: &[Point2<f64>], config: &RoofConfig) -> Result<RoofSolution> {
    config.validate()?;
    let eaves = build_eaves(0, footprint, None, config)?;
    solve_eaves(&eaves, config)
}

pub(crate) fn solve_eaves(eaves: &[Eave], config: &RoofConfig) -> Result<RoofSolution> {
    let mut solution = RoofSolution::default();
    for eave in eaves {
        solution.extend(solve_eave(eave, config)?);
    }
    Ok(solution)
}

/// Solve one counter-clockwise eave ring and its courtyards.
///
/// Skeleton edges are numbered over the outer ring first, then each
/// courtyard in turn.
pub(crate) fn solve_eave(eave: &Eave, config: &RoofConfig) -> Result<RoofSolution> {
    let mut edges: Vec<EaveEdge> = Vec::new();
    let mut plan: Vec<(Point2<f64>, Point2<f64>)> = Vec::new();
    for ring in eave.rings() {
        for (segment, edge) in ring.segments() {
            plan.push(segment);
            edges.push(edge);
        }
    }
    if edges.is_empty() {
        return Err(RoofError::InvalidFootprint("empty eave ring".into()));
    }

    // Gable and flat edges carry no plane, so only sloped edges must agree
    let mut sloped = edges.iter().filter(|e| e.directive.is_sloped());
    let Some(first) = sloped.next() else {
        return Err(RoofError::InvalidDirective(
            "no edge carries a sloped roof plane".into(),
        ));
    };
    let baseline = first.directive.baseline;
    if let Some(other) = sloped.find(|e| (e.directive.baseline - baseline).abs() > EPSILON) {
        return Err(RoofError::InvalidDirective(format!(
            "baseline heights {} (wing {} edge {}) and {} (wing {} edge {}) meet in one roof",
            baseline, first.wing, first.edge, other.directive.baseline, other.wing, other.edge
        )));
    }
    let floor = edges
        .iter()
        .map(|e| e.directive.baseline)
        .fold(baseline, f64::min);

    let speeds = |ring: &Eave| -> Vec<EdgeSpeed> {
        ring.edges.iter().map(|e| e.directive.speed()).collect()
    };
    let input = eave.holes.iter().fold(
        SkeletonInput::new(eave.ring.clone(), speeds(eave)),
        |input, hole| input.with_hole(hole.ring.clone(), speeds(hole)),
    );
    let skeleton = solve_skeleton(&input, config.event_budget_factor)?;

    let lift = |node: &SkeletonNode| Point3D::on_plan(&node.position, baseline + node.time);

    let mut result = RoofResult::default();
    for ((a, b), edge) in plan.iter().zip(&edges) {
        let z = edge.directive.baseline;
        result
            .eaves
            .push(Segment3D::new(Point3D::on_plan(a, z), Point3D::on_plan(b, z)));
    }
    for arc in &skeleton.arcs {
        let segment = Segment3D::new(lift(&skeleton.nodes[arc.start]), lift(&skeleton.nodes[arc.end]));
        match arc.kind {
            ArcKind::Ridge => result.ridges.push(segment),
            ArcKind::Hip => result.hips.push(segment),
            ArcKind::Valley => result.valleys.push(segment),
            ArcKind::Rake => result.rakes.push(segment),
            ArcKind::Coplanar => {}
        }
    }
    join_ridges(&mut result);

    let candidates = skeleton
        .faces
        .iter()
        .map(|face| (face.edge, face.polygon(&skeleton.nodes)))
        .collect();
    let courtyards: Vec<Contour> = eave.holes.iter().map(|h| h.ring.clone()).collect();
    let faces = reconcile_faces(&eave.ring, &courtyards, candidates)?
        .into_iter()
        .map(|face| {
            let source = edges[face.edge];
            let (a, b) = plan[face.edge];
            let inward = normalize(&(b - a)).map(|d| perp(&d)).unwrap_or_else(Vector2::zeros);
            let slope = source.directive.slope();
            let outline = face
                .outline
                .iter()
                .map(|p| {
                    let run = dot2(&inward, &(p - a)).max(0.0);
                    Point3D::on_plan(p, baseline + run * slope)
                })
                .collect();
            RoofFace {
                wing: source.wing,
                edge: source.edge,
                pitch: source.directive.pitch,
                outline,
                plan_area: face.area,
                slope_area: face.area / source.directive.pitch.to_radians().cos(),
            }
        })
        .collect();

    check_bounds(&eave.ring, floor, &result)?;

    debug!(
        edges = edges.len(),
        courtyards = eave.holes.len(),
        ridges = result.ridges.len(),
        hips = result.hips.len(),
        valleys = result.valleys.len(),
        rakes = result.rakes.len(),
        "roof solved"
    );

    Ok(RoofSolution { result, faces })
}

/// Join ridge pieces that continue straight through a node nothing else
/// touches.
fn join_ridges(result: &mut RoofResult) {
    let same = |a: &Point3D, b: &Point3D| {
        (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON && (a.z - b.z).abs() <= EPSILON
    };

    loop {
        let ends: Vec<Point3D> = result
            .segments()
            .flat_map(|s| [s.start, s.end])
            .collect();
        let degree = |p: &Point3D| ends.iter().filter(|q| same(p, q)).count();

        let mut joined = None;
        'search: for i in 0..result.ridges.len() {
            for j in (i + 1)..result.ridges.len() {
                let (a, b) = (result.ridges[i], result.ridges[j]);
                let (shared, far_a, far_b) = if same(&a.end, &b.start) {
                    (a.end, a.start, b.end)
                } else if same(&a.end, &b.end) {
                    (a.end, a.start, b.start)
                } else if same(&a.start, &b.start) {
                    (a.start, a.end, b.end)
                } else if same(&a.start, &b.end) {
                    (a.start, a.end, b.start)
                } else {
                    continue;
                };
                if degree(&shared) != 2 {
                    continue;
                }
                let u = (shared.x - far_a.x, shared.y - far_a.y);
                let v = (far_b.x - shared.x, far_b.y - shared.y);
                let cross = u.0 * v.1 - u.1 * v.0;
                let len = (u.0.hypot(u.1)) * (v.0.hypot(v.1));
                if u.0 * v.0 + u.1 * v.1 > 0.0 && cross.abs() <= EPSILON * len.sqrt() {
                    joined = Some((i, j, Segment3D::new(far_a, far_b)));
                    break 'search;
                }
            }
        }

        match joined {
            Some((i, j, segment)) => {
                result.ridges[i] = segment;
                result.ridges.remove(j);
            }
            None => return,
        }
    }
}

/// Every output point lies over the eave and no lower than `floor`.
fn check_bounds(eave: &[Point2<f64>], floor: f64, result: &RoofResult) -> Result<()> {
    let Some(bounds) = contour_bounds(eave) else {
        return Err(RoofError::InvalidFootprint("empty eave ring".into()));
    };
    let bounds = bounds.expand(BOUNDS_MARGIN);

    for segment in result.segments() {
        for p in [segment.start, segment.end] {
            if !p.is_finite()
                || !bounds.contains(&Point2::new(p.x, p.y))
                || p.z < floor - EPSILON
            {
                return Err(RoofError::SkeletonInconsistent(format!(
                    "roof point ({}, {}, {}) escapes the eave",
                    p.x, p.y, p.z
                )));
            }
        }
    }
    Ok(())
}
