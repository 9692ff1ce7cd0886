// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations for Eave Merging and Face Clipping
//!
//! Thin layer over the i_overlay crate. Wings whose eave polygons touch are
//! unioned into one roof outline, and candidate roof faces are clipped
//! against the eave polygon to check that they tile it.
//!
//! Degenerate inputs never error: an operation with nothing left returns an
//! empty `Vec`, and callers are expected to check for that.

use crate::primitives::{compute_signed_area, ensure_ccw, ensure_cw, simplify_contour, Contour, EPSILON};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - regions smaller than this are dropped as slivers
const MIN_AREA_THRESHOLD: f64 = EPSILON * EPSILON;

/// One connected region of a boolean result
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Outer boundary (counter-clockwise)
    pub outer: Contour,
    /// Holes (clockwise)
    pub holes: Vec<Contour>,
}

impl Region {
    pub fn new(outer: Contour) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Net area, holes subtracted
    pub fn area(&self) -> f64 {
        compute_signed_area(&self.outer).abs()
            - self
                .holes
                .iter()
                .map(|h| compute_signed_area(h).abs())
                .sum::<f64>()
    }
}

/// Sum of the net areas of a set of regions
pub fn total_area(regions: &[Region]) -> f64 {
    regions.iter().map(Region::area).sum()
}

/// Union any number of rings into one or more (possibly disjoint) regions
///
/// Rings are normalized to counter-clockwise first so that overlaps count
/// twice under the non-zero rule instead of cancelling.
pub fn union(polygons: &[Contour]) -> Vec<Region> {
    let mut valid = polygons.iter().filter(|c| is_valid_contour(c));

    let Some(first) = valid.next() else {
        return Vec::new();
    };

    let subject: Vec<Vec<[f64; 2]>> = vec![contour_to_path(&ensure_ccw(first))];
    let clip: Vec<Vec<[f64; 2]>> = valid.map(|c| contour_to_path(&ensure_ccw(c))).collect();

    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    shapes_to_regions(&result)
}

/// Intersection of two rings
pub fn intersection(a: &[Point2<f64>], b: &[Point2<f64>]) -> Vec<Region> {
    if !is_valid_contour(a) || !is_valid_contour(b) {
        return Vec::new();
    }

    let subject = vec![contour_to_path(&ensure_ccw(a))];
    let clip = vec![contour_to_path(&ensure_ccw(b))];

    let result = subject.overlay(&clip, OverlayRule::Intersect, FillRule::NonZero);
    shapes_to_regions(&result)
}

/// Subtract every ring in `cutters` from `subject`
pub fn difference(subject: &[Point2<f64>], cutters: &[Contour]) -> Vec<Region> {
    if !is_valid_contour(subject) {
        return Vec::new();
    }

    let subject_paths = vec![contour_to_path(&ensure_ccw(subject))];
    let clip: Vec<Vec<[f64; 2]>> = cutters
        .iter()
        .filter(|c| is_valid_contour(c))
        .map(|c| contour_to_path(&ensure_ccw(c)))
        .collect();

    if clip.is_empty() {
        return vec![Region::new(ensure_ccw(subject))];
    }

    let result = subject_paths.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);
    shapes_to_regions(&result)
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    contour.len() >= 3 && compute_signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Contour {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Convert i_overlay result shapes back to regions
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_regions(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Region> {
    let mut regions = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let Some(outer_path) = shape.first() else {
            continue;
        };

        let outer = simplify_contour(&path_to_contour(outer_path), EPSILON);
        if !is_valid_contour(&outer) {
            continue;
        }

        let holes = shape
            .iter()
            .skip(1)
            .map(|path| simplify_contour(&path_to_contour(path), EPSILON))
            .filter(|hole| is_valid_contour(hole))
            .map(|hole| ensure_cw(&hole))
            .collect();

        regions.push(Region {
            outer: ensure_ccw(&outer),
            holes,
        });
    }

    regions
}
