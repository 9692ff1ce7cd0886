// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar primitives shared by offsetting, skeleton solving and roof assembly
//!
//! Coordinates are millimetres in a y-up plan. A counter-clockwise ring has
//! positive signed area; every footprint is normalized to that orientation
//! before any roof work happens.

use crate::error::{Error, Result};
use nalgebra::{Point2, Vector2};

/// Coordinate tolerance in millimetres. Two points closer than this are the
/// same point, a point closer than this to a segment lies on it.
pub const EPSILON: f64 = 1e-3;

/// Sine of the largest angle between two directions still treated as parallel
pub const PARALLEL_EPSILON: f64 = 1e-9;

/// A closed ring of points, last point implicitly connected to the first
pub type Contour = Vec<Point2<f64>>;

/// Area tolerance for a region with the given boundary length: a strip of
/// width [`EPSILON`] along the whole boundary.
#[inline]
pub fn area_tolerance(perimeter: f64) -> f64 {
    perimeter.abs().max(1.0) * EPSILON
}

/// 2D cross product (z component of the 3D cross product)
#[inline]
pub fn cross2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

#[inline]
pub fn dot2(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

/// Left-hand normal of a direction. For an edge of a counter-clockwise ring
/// this points into the polygon.
#[inline]
pub fn perp(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

/// Unit vector in the direction of `v`, `None` for a zero-length vector
#[inline]
pub fn normalize(v: &Vector2<f64>) -> Option<Vector2<f64>> {
    let len = v.norm();
    if len <= f64::EPSILON || !len.is_finite() {
        None
    } else {
        Some(v / len)
    }
}

/// Signed angle in radians turning from `a` to `b`, in (-pi, pi]
#[inline]
pub fn angle_between(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    cross2(a, b).atan2(dot2(a, b))
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let n = contour.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y - contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Total boundary length of a closed ring
pub fn perimeter(contour: &[Point2<f64>]) -> f64 {
    let n = contour.len();
    (0..n)
        .map(|i| (contour[(i + 1) % n] - contour[i]).norm())
        .sum()
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Contour {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Contour {
    if compute_signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Drop consecutive duplicate points, including a repeated closing point
pub fn dedup_contour(contour: &[Point2<f64>]) -> Contour {
    let mut result: Contour = Vec::with_capacity(contour.len());
    for p in contour {
        if result.last().map_or(true, |q| (p - q).norm() > EPSILON) {
            result.push(*p);
        }
    }
    while result.len() > 1 && (result[0] - result[result.len() - 1]).norm() <= EPSILON {
        result.pop();
    }
    result
}

/// Simplify a contour by removing points lying within `epsilon` of the line
/// through their neighbours
pub fn simplify_contour(contour: &[Point2<f64>], epsilon: f64) -> Contour {
    let contour = dedup_contour(contour);
    if contour.len() <= 3 {
        return contour;
    }

    let mut result = Vec::with_capacity(contour.len());
    let n = contour.len();

    for i in 0..n {
        let prev = &contour[(i + n - 1) % n];
        let curr = &contour[i];
        let next = &contour[(i + 1) % n];

        let forward = (curr - prev).dot(&(next - curr)) > 0.0;
        if !forward || point_line_distance(curr, prev, next) > epsilon {
            result.push(*curr);
        }
    }

    if result.len() < 3 {
        return contour;
    }

    result
}

/// Distance from `p` to the infinite line through `a` and `b`
pub fn point_line_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len = ab.norm();
    if len <= f64::EPSILON {
        return (p - a).norm();
    }
    cross2(&ab, &(p - a)).abs() / len
}

/// Distance from `p` to the closed segment `a`-`b`
pub fn point_segment_distance(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Outcome of intersecting two closed segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    None,
    Point(Point2<f64>),
    /// Collinear segments sharing a run of positive length
    Overlap(Point2<f64>, Point2<f64>),
}

impl SegmentIntersection {
    pub fn is_none(&self) -> bool {
        matches!(self, SegmentIntersection::None)
    }
}

/// Intersect segments `a0`-`a1` and `b0`-`b1` with [`EPSILON`] tolerance
pub fn segment_intersection(
    a0: &Point2<f64>,
    a1: &Point2<f64>,
    b0: &Point2<f64>,
    b1: &Point2<f64>,
) -> SegmentIntersection {
    let r = a1 - a0;
    let s = b1 - b0;
    let r_len = r.norm();
    let s_len = s.norm();

    // Point-like segments
    if r_len <= EPSILON || s_len <= EPSILON {
        let (p, q0, q1) = if r_len <= EPSILON { (a0, b0, b1) } else { (b0, a0, a1) };
        return if point_segment_distance(p, q0, q1) <= EPSILON {
            SegmentIntersection::Point(*p)
        } else {
            SegmentIntersection::None
        };
    }

    let qp = b0 - a0;
    let denom = cross2(&r, &s);

    if denom.abs() <= PARALLEL_EPSILON * r_len * s_len {
        if cross2(&r, &qp).abs() / r_len > EPSILON {
            return SegmentIntersection::None;
        }
        let t0 = qp.dot(&r) / (r_len * r_len);
        let t1 = (b1 - a0).dot(&r) / (r_len * r_len);
        let lo = t0.min(t1).max(0.0);
        let hi = t0.max(t1).min(1.0);
        if (hi - lo) * r_len < -EPSILON {
            return SegmentIntersection::None;
        }
        if (hi - lo) * r_len <= EPSILON {
            return SegmentIntersection::Point(a0 + r * ((lo + hi) * 0.5).clamp(0.0, 1.0));
        }
        return SegmentIntersection::Overlap(a0 + r * lo, a0 + r * hi);
    }

    let t = cross2(&qp, &s) / denom;
    let u = cross2(&qp, &r) / denom;
    let tol_t = EPSILON / r_len;
    let tol_u = EPSILON / s_len;

    if t >= -tol_t && t <= 1.0 + tol_t && u >= -tol_u && u <= 1.0 + tol_u {
        SegmentIntersection::Point(a0 + r * t.clamp(0.0, 1.0))
    } else {
        SegmentIntersection::None
    }
}

/// Location of a point relative to a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    Outside,
    /// Within [`EPSILON`] of an edge
    Boundary,
}

/// Classify a point against a ring; points on an edge are reported as
/// [`PointLocation::Boundary`], never folded into inside or outside
pub fn classify_point(point: &Point2<f64>, contour: &[Point2<f64>]) -> PointLocation {
    let n = contour.len();
    if n < 3 {
        return PointLocation::Outside;
    }

    for i in 0..n {
        if point_segment_distance(point, &contour[i], &contour[(i + 1) % n]) <= EPSILON {
            return PointLocation::Boundary;
        }
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    if inside {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

/// Axis-aligned plan bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    /// Grow the bounds by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Smallest bounds covering both
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn contains(&self, p: &Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Compute bounding box of a contour
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<Bounds> {
    let first = contour.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in contour.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some(Bounds { min, max })
}

/// Find the first pair of edges that cross or touch away from their shared
/// vertex. Adjacent edges only count when they fold back onto each other.
pub fn find_self_intersection(contour: &[Point2<f64>]) -> Option<(usize, usize)> {
    let n = contour.len();
    for i in 0..n {
        let a0 = &contour[i];
        let a1 = &contour[(i + 1) % n];
        for j in (i + 1)..n {
            let b0 = &contour[j];
            let b1 = &contour[(j + 1) % n];
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            let hit = segment_intersection(a0, a1, b0, b1);
            if adjacent {
                if matches!(hit, SegmentIntersection::Overlap(..)) {
                    return Some((i, j));
                }
            } else if !hit.is_none() {
                return Some((i, j));
            }
        }
    }
    None
}

/// Check that no two edges of the ring intersect except at shared vertices
pub fn is_simple(contour: &[Point2<f64>]) -> bool {
    find_self_intersection(contour).is_none()
}

/// Validate a footprint-like ring: enough vertices, finite, non-zero area,
/// non-self-intersecting
pub fn validate_polygon(contour: &[Point2<f64>]) -> Result<()> {
    if contour.len() < 3 {
        return Err(Error::TooFewVertices(contour.len()));
    }
    if let Some(idx) = contour
        .iter()
        .position(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(Error::NonFinite(idx));
    }
    if compute_signed_area(contour).abs() <= area_tolerance(perimeter(contour)) {
        return Err(Error::ZeroArea);
    }
    if let Some((first, second)) = find_self_intersection(contour) {
        return Err(Error::SelfIntersecting { first, second });
    }
    Ok(())
}

/// True when two rings overlap or touch within [`EPSILON`]
pub fn polygons_touch(a: &[Point2<f64>], b: &[Point2<f64>]) -> bool {
    let (Some(ba), Some(bb)) = (contour_bounds(a), contour_bounds(b)) else {
        return false;
    };
    if !ba.expand(EPSILON).overlaps(&bb) {
        return false;
    }

    let na = a.len();
    let nb = b.len();
    for i in 0..na {
        for j in 0..nb {
            let hit = segment_intersection(&a[i], &a[(i + 1) % na], &b[j], &b[(j + 1) % nb]);
            if !hit.is_none() {
                return true;
            }
        }
    }

    // No boundary contact: touching only if one ring contains the other
    classify_point(&a[0], b) != PointLocation::Outside
        || classify_point(&b[0], a) != PointLocation::Outside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Contour {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ]
    }

    #[test]
    fn test_compute_signed_area_orientation() {
        let ccw = square(1000.0);
        assert_relative_eq!(compute_signed_area(&ccw), 1.0e6);

        let cw: Contour = ccw.iter().rev().cloned().collect();
        assert_relative_eq!(compute_signed_area(&cw), -1.0e6);
        assert!(compute_signed_area(&ensure_ccw(&cw)) > 0.0);
        assert!(compute_signed_area(&ensure_cw(&ccw)) < 0.0);
    }

    #[test]
    fn test_segment_intersection_cases() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(10.0, 0.0);

        match segment_intersection(&a0, &a1, &Point2::new(5.0, -5.0), &Point2::new(5.0, 5.0)) {
            SegmentIntersection::Point(p) => {
                assert_relative_eq!(p.x, 5.0);
                assert_relative_eq!(p.y, 0.0);
            }
            other => panic!("expected point, got {:?}", other),
        }

        assert!(segment_intersection(&a0, &a1, &Point2::new(0.0, 1.0), &Point2::new(10.0, 1.0))
            .is_none());

        match segment_intersection(&a0, &a1, &Point2::new(4.0, 0.0), &Point2::new(20.0, 0.0)) {
            SegmentIntersection::Overlap(p, q) => {
                assert_relative_eq!(p.x, 4.0);
                assert_relative_eq!(q.x, 10.0);
            }
            other => panic!("expected overlap, got {:?}", other),
        }

        // Collinear segments touching end to end meet in a single point
        assert!(matches!(
            segment_intersection(&a0, &a1, &Point2::new(10.0, 0.0), &Point2::new(12.0, 0.0)),
            SegmentIntersection::Point(_)
        ));
    }

    #[test]
    fn test_classify_point_boundary_is_distinct() {
        let sq = square(10.0);
        assert_eq!(classify_point(&Point2::new(5.0, 5.0), &sq), PointLocation::Inside);
        assert_eq!(classify_point(&Point2::new(15.0, 5.0), &sq), PointLocation::Outside);
        assert_eq!(classify_point(&Point2::new(10.0, 5.0), &sq), PointLocation::Boundary);
        assert_eq!(classify_point(&Point2::new(0.0, 0.0), &sq), PointLocation::Boundary);
    }

    #[test]
    fn test_validate_polygon() {
        assert!(validate_polygon(&square(10.0)).is_ok());
        assert_eq!(
            validate_polygon(&[Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]),
            Err(Error::TooFewVertices(2))
        );
        assert_eq!(
            validate_polygon(&[
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 0.0),
            ]),
            Err(Error::ZeroArea)
        );

        let bowtie = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(matches!(
            validate_polygon(&bowtie),
            Err(Error::SelfIntersecting { .. })
        ));
    }

    #[test]
    fn test_simplify_contour_drops_collinear_points() {
        let contour = vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let simplified = simplify_contour(&contour, EPSILON);
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn test_polygons_touch() {
        let a = square(10.0);
        let shifted = |dx: f64| -> Contour { a.iter().map(|p| Point2::new(p.x + dx, p.y)).collect() };

        assert!(polygons_touch(&a, &shifted(5.0)));
        assert!(polygons_touch(&a, &shifted(10.0)));
        assert!(!polygons_touch(&a, &shifted(10.5)));

        let inner = vec![
            Point2::new(2.0, 2.0),
            Point2::new(4.0, 2.0),
            Point2::new(4.0, 4.0),
        ];
        assert!(polygons_touch(&a, &inner));
    }

    #[test]
    fn test_angle_between_is_signed() {
        let x = Vector2::new(1.0, 0.0);
        let y = Vector2::new(0.0, 2.0);
        assert_relative_eq!(angle_between(&x, &y), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(angle_between(&y, &x), -std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(angle_between(&x, &-x), std::f64::consts::PI);
    }

    #[test]
    fn test_bounds_union_and_contains() {
        let a = contour_bounds(&square(10.0)).unwrap();
        let b = Bounds {
            min: Point2::new(20.0, -5.0),
            max: Point2::new(30.0, 5.0),
        };
        let both = a.union(&b);
        assert_eq!(both.min, Point2::new(0.0, -5.0));
        assert_eq!(both.max, Point2::new(30.0, 10.0));
        assert!(!a.overlaps(&b));
        assert!(a.expand(10.0).overlaps(&b));
        assert!(both.contains(&Point2::new(15.0, 0.0)));
    }
}
