// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Straight-line polygon offsetting
//!
//! Every edge is moved along its outward normal by its own distance
//! (positive = outward) and consecutive offset lines are joined with a mitre.
//! Convex corners sharper than the mitre limit get a bevel edge instead.
//!
//! The mitred ring keeps a one-to-one edge correspondence with the input,
//! which the roof pipeline relies on to carry edge directives through. When
//! the mitred ring is not clean (a notch narrower than the offset, an edge
//! that flips direction) the offset is rebuilt from booleans: the polygon is
//! unioned with one quad per edge and one wedge per convex corner, and inward
//! quads are subtracted. Edge correspondence is then recovered by matching
//! each result edge to the nearest parallel offset line.

use crate::bool2d::{difference, union, Region};
use crate::primitives::{
    area_tolerance, compute_signed_area, cross2, dot2, is_simple, normalize, perimeter,
    point_line_distance, point_segment_distance, Contour, EPSILON, PARALLEL_EPSILON,
};
use nalgebra::{Point2, Vector2};
use smallvec::SmallVec;

/// Mitre length, in multiples of the offset distance, beyond which a convex
/// corner is bevelled
pub const DEFAULT_MITER_LIMIT: f64 = 4.0;

/// Sine tolerance used when matching result edges to source edges
const MATCH_PARALLEL_TOLERANCE: f64 = 1e-6;

/// A ring produced by offsetting, with per-edge provenance
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetRing {
    /// Counter-clockwise ring
    pub points: Contour,
    /// `sources[i]` is the input edge that ring edge `i` (from `points[i]` to
    /// `points[i + 1]`) was offset from. `None` marks bevel and step edges
    /// that have no single source.
    pub sources: Vec<Option<usize>>,
}

/// Offset a polygon by a uniform distance (positive = outward)
///
/// Returns an empty `Vec` when an inward offset consumes the polygon.
pub fn offset(polygon: &[Point2<f64>], distance: f64) -> Vec<Contour> {
    let distances = vec![distance; polygon.len()];
    offset_edges(polygon, &distances, DEFAULT_MITER_LIMIT)
        .into_iter()
        .map(|ring| ring.points)
        .collect()
}

/// Offset each edge `i` (from vertex `i` to vertex `i + 1`) by `distances[i]`
pub fn offset_edges(
    polygon: &[Point2<f64>],
    distances: &[f64],
    miter_limit: f64,
) -> Vec<OffsetRing> {
    if polygon.len() < 3 || distances.len() != polygon.len() {
        return Vec::new();
    }
    if distances.iter().any(|d| !d.is_finite()) {
        return Vec::new();
    }

    let Some(edges) = build_edges(polygon, distances) else {
        return Vec::new();
    };

    if edges.iter().all(|e| e.distance.abs() <= f64::EPSILON) {
        return vec![OffsetRing {
            points: edges.iter().map(|e| e.start).collect(),
            sources: edges.iter().map(|e| Some(e.source)).collect(),
        }];
    }

    if let Some(ring) = mitred_ring(&edges, miter_limit) {
        if ring_is_clean(&ring, &edges) {
            return vec![ring];
        }
    }

    boolean_offset(&edges, miter_limit)
}

/// Match every edge of `ring` to the closest reference segment, preferring
/// segments that are parallel, same-direction and collinear with it.
///
/// Returns `None` entries only when `references` is empty.
pub fn correspond_edges(
    ring: &[Point2<f64>],
    references: &[(Point2<f64>, Point2<f64>)],
) -> Vec<Option<usize>> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let p = ring[i];
            let q = ring[(i + 1) % n];
            let mid = Point2::from((p.coords + q.coords) * 0.5);
            let dir = normalize(&(q - p));

            references
                .iter()
                .enumerate()
                .map(|(j, (a, b))| {
                    let parallel = match (dir, normalize(&(b - a))) {
                        (Some(d), Some(r)) => {
                            cross2(&d, &r).abs() <= MATCH_PARALLEL_TOLERANCE && dot2(&d, &r) > 0.0
                        }
                        _ => false,
                    };
                    let tier = if parallel && point_line_distance(&mid, a, b) <= EPSILON {
                        0
                    } else if parallel {
                        1
                    } else {
                        2
                    };
                    (tier, point_segment_distance(&mid, a, b), j)
                })
                .min_by(|x, y| x.0.cmp(&y.0).then(x.1.total_cmp(&y.1)))
                .map(|(_, _, j)| j)
        })
        .collect()
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct OffsetEdge {
    start: Point2<f64>,
    end: Point2<f64>,
    dir: Vector2<f64>,
    /// Outward unit normal
    normal: Vector2<f64>,
    distance: f64,
    source: usize,
}

impl OffsetEdge {
    fn shifted(&self) -> (Point2<f64>, Point2<f64>) {
        let shift = self.normal * self.distance;
        (self.start + shift, self.end + shift)
    }
}

/// Normalize to counter-clockwise and drop zero-length edges, remembering
/// each surviving edge's input index
fn build_edges(polygon: &[Point2<f64>], distances: &[f64]) -> Option<Vec<OffsetEdge>> {
    let n = polygon.len();
    let area = compute_signed_area(polygon);
    if area.abs() <= area_tolerance(perimeter(polygon)) {
        return None;
    }

    // (start, end, source edge) in counter-clockwise order
    let raw: Vec<(Point2<f64>, Point2<f64>, usize)> = if area > 0.0 {
        (0..n).map(|i| (polygon[i], polygon[(i + 1) % n], i)).collect()
    } else {
        (0..n)
            .rev()
            .map(|i| (polygon[(i + 1) % n], polygon[i], i))
            .collect()
    };

    let edges: Vec<OffsetEdge> = raw
        .into_iter()
        .filter_map(|(start, end, source)| {
            let dir = normalize(&(end - start))?;
            if (end - start).norm() <= EPSILON {
                return None;
            }
            Some(OffsetEdge {
                start,
                end,
                dir,
                normal: Vector2::new(dir.y, -dir.x),
                distance: distances[source],
                source,
            })
        })
        .collect();

    (edges.len() >= 3).then_some(edges)
}

/// Intersection of the offset lines of two edges
fn line_intersection(a: &OffsetEdge, b: &OffsetEdge) -> Option<Point2<f64>> {
    let (pa, _) = a.shifted();
    let (pb, _) = b.shifted();
    let denom = cross2(&a.dir, &b.dir);
    if denom.abs() <= PARALLEL_EPSILON {
        return None;
    }
    let t = cross2(&(pb - pa), &b.dir) / denom;
    Some(pa + a.dir * t)
}

/// Points emitted for the corner at the start of `next`: one mitre point, or
/// two points joined by a bevel / step edge
fn corner_points(
    prev: &OffsetEdge,
    next: &OffsetEdge,
    miter_limit: f64,
) -> Option<SmallVec<[Point2<f64>; 2]>> {
    let v = next.start;
    let turn = cross2(&prev.dir, &next.dir);
    let p_prev = v + prev.normal * prev.distance;
    let p_next = v + next.normal * next.distance;

    if turn.abs() <= PARALLEL_EPSILON {
        if dot2(&prev.dir, &next.dir) < 0.0 {
            // Edge folds back on itself
            return None;
        }
        if (p_prev - p_next).norm() <= EPSILON {
            return Some(SmallVec::from_slice(&[p_next]));
        }
        return Some(SmallVec::from_slice(&[p_prev, p_next]));
    }

    let miter = line_intersection(prev, next)?;
    let reach = prev.distance.abs().max(next.distance.abs());
    let convex = turn > 0.0;
    let outward = prev.distance > 0.0 && next.distance > 0.0;

    if convex && outward && (miter - v).norm() > miter_limit * reach {
        return Some(SmallVec::from_slice(&[p_prev, p_next]));
    }

    Some(SmallVec::from_slice(&[miter]))
}

fn mitred_ring(edges: &[OffsetEdge], miter_limit: f64) -> Option<OffsetRing> {
    let n = edges.len();
    let mut points = Vec::with_capacity(n + 4);
    let mut sources = Vec::with_capacity(n + 4);

    for k in 0..n {
        let prev = &edges[(k + n - 1) % n];
        let next = &edges[k];
        let corner = corner_points(prev, next, miter_limit)?;
        if corner.len() == 2 {
            points.push(corner[0]);
            sources.push(None);
        }
        points.push(corner[corner.len() - 1]);
        sources.push(Some(next.source));
    }

    Some(OffsetRing { points, sources })
}

/// A mitred ring is usable when it is simple, counter-clockwise and every
/// sourced edge still runs in its source direction
fn ring_is_clean(ring: &OffsetRing, edges: &[OffsetEdge]) -> bool {
    let n = ring.points.len();
    if n < 3 || compute_signed_area(&ring.points) <= 0.0 || !is_simple(&ring.points) {
        return false;
    }

    (0..n).all(|i| {
        let seg = ring.points[(i + 1) % n] - ring.points[i];
        if seg.norm() <= EPSILON {
            return false;
        }
        match ring.sources[i] {
            Some(source) => edges
                .iter()
                .find(|e| e.source == source)
                .is_some_and(|e| dot2(&seg, &e.dir) > 0.0),
            None => true,
        }
    })
}

fn boolean_offset(edges: &[OffsetEdge], miter_limit: f64) -> Vec<OffsetRing> {
    let n = edges.len();
    let polygon: Contour = edges.iter().map(|e| e.start).collect();

    let mut grow: Vec<Contour> = vec![polygon.clone()];
    let mut shrink: Vec<Contour> = Vec::new();

    for e in edges {
        if e.distance.abs() <= EPSILON {
            continue;
        }
        let (a, b) = e.shifted();
        let quad = vec![e.start, e.end, b, a];
        if e.distance > 0.0 {
            grow.push(quad);
        } else {
            shrink.push(quad);
        }
    }

    for k in 0..n {
        let prev = &edges[(k + n - 1) % n];
        let next = &edges[k];
        let turn = cross2(&prev.dir, &next.dir);
        if turn.abs() <= PARALLEL_EPSILON {
            continue;
        }
        let v = next.start;
        let Some(corner) = corner_points(prev, next, miter_limit) else {
            continue;
        };
        let mut wedge: Contour = vec![v, v + prev.normal * prev.distance];
        if corner.len() == 1 {
            wedge.push(corner[0]);
        }
        wedge.push(v + next.normal * next.distance);

        if turn > 0.0 && prev.distance > 0.0 && next.distance > 0.0 {
            grow.push(wedge);
        } else if turn < 0.0 && prev.distance < 0.0 && next.distance < 0.0 {
            shrink.push(wedge);
        }
    }

    let grown = union(&grow);
    let regions: Vec<Region> = if shrink.is_empty() {
        grown
    } else {
        grown
            .iter()
            .flat_map(|region| difference(&region.outer, &shrink))
            .collect()
    };

    let references: Vec<(Point2<f64>, Point2<f64>)> = edges.iter().map(OffsetEdge::shifted).collect();

    regions
        .into_iter()
        .filter(|r| r.area() > area_tolerance(perimeter(&r.outer)))
        .map(|r| {
            let sources = correspond_edges(&r.outer, &references)
                .into_iter()
                .map(|idx| idx.map(|j| edges[j].source))
                .collect();
            OffsetRing {
                points: r.outer,
                sources,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(w: f64, h: f64) -> Contour {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    fn l_shape() -> Contour {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(10000.0, 0.0),
            Point2::new(10000.0, 4000.0),
            Point2::new(4000.0, 4000.0),
            Point2::new(4000.0, 10000.0),
            Point2::new(0.0, 10000.0),
        ]
    }

    #[test]
    fn test_outward_rectangle_keeps_edge_order() {
        let rings = offset_edges(&rect(5000.0, 5000.0), &[500.0; 4], DEFAULT_MITER_LIMIT);
        assert_eq!(rings.len(), 1);

        let ring = &rings[0];
        assert_eq!(ring.points.len(), 4);
        assert_eq!(ring.sources, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert_relative_eq!(ring.points[0].x, -500.0, epsilon = 1e-9);
        assert_relative_eq!(ring.points[0].y, -500.0, epsilon = 1e-9);
        assert_relative_eq!(compute_signed_area(&ring.points), 36.0e6, max_relative = 1e-9);
    }

    #[test]
    fn test_clockwise_input_maps_sources() {
        let cw: Contour = rect(4000.0, 2000.0).into_iter().rev().collect();
        let rings = offset_edges(&cw, &[100.0, 200.0, 300.0, 400.0], DEFAULT_MITER_LIMIT);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert!(compute_signed_area(&ring.points) > 0.0);
        // Every input edge is still represented exactly once
        let mut seen: Vec<usize> = ring.sources.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_reflex_corner_mitres_inward() {
        let rings = offset_edges(&l_shape(), &[500.0; 6], DEFAULT_MITER_LIMIT);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.points.len(), 6);
        assert!(is_simple(&ring.points));
        // Reflex corner moves diagonally into the polygon
        assert_relative_eq!(ring.points[3].x, 4500.0, epsilon = 1e-9);
        assert_relative_eq!(ring.points[3].y, 4500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_per_edge_distances() {
        let rings = offset_edges(&rect(4000.0, 2000.0), &[0.0, 800.0, 0.0, 800.0], DEFAULT_MITER_LIMIT);
        assert_eq!(rings.len(), 1);
        assert_relative_eq!(
            compute_signed_area(&rings[0].points),
            5600.0 * 2000.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_inward_collapse_is_empty() {
        assert!(offset(&rect(1000.0, 1000.0), -600.0).is_empty());
    }

    #[test]
    fn test_inward_offset_shrinks() {
        let rings = offset(&rect(1000.0, 1000.0), -100.0);
        assert_eq!(rings.len(), 1);
        assert_relative_eq!(compute_signed_area(&rings[0]), 640000.0, max_relative = 1e-6);
    }

    #[test]
    fn test_narrow_notch_falls_back_to_booleans() {
        // U shape with a 200 mm slot, offset outward by 300 mm closes the slot
        let u = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3000.0, 0.0),
            Point2::new(3000.0, 3000.0),
            Point2::new(1600.0, 3000.0),
            Point2::new(1600.0, 1000.0),
            Point2::new(1400.0, 1000.0),
            Point2::new(1400.0, 3000.0),
            Point2::new(0.0, 3000.0),
        ];
        let rings = offset_edges(&u, &[300.0; 8], DEFAULT_MITER_LIMIT);
        assert_eq!(rings.len(), 1);
        assert!(is_simple(&rings[0].points));
        assert_relative_eq!(
            compute_signed_area(&rings[0].points),
            3600.0 * 3600.0,
            max_relative = 1e-6
        );
        assert!(rings[0].sources.iter().all(Option::is_some));
    }

    #[test]
    fn test_correspond_edges_prefers_collinear() {
        let refs = vec![
            (Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)),
            (Point2::new(0.0, 1.0), Point2::new(10.0, 1.0)),
        ];
        let ring = vec![
            Point2::new(2.0, 1.0),
            Point2::new(8.0, 1.0),
            Point2::new(5.0, 5.0),
        ];
        let sources = correspond_edges(&ring, &refs);
        assert_eq!(sources[0], Some(1));
    }
}
