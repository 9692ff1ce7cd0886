// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face reconciliation.
//!
//! Skeleton faces are clipped against the eave polygon and its courtyards,
//! slivers left by near-simultaneous events are dropped, and the survivors
//! must tile the eave: their areas add up to the eave area and their union
//! loses nothing to overlap.

use nalgebra::Point2;
use roofline_geometry::primitives::{area_tolerance, compute_signed_area, perimeter, Contour};
use roofline_geometry::{difference, intersection, total_area, union, Region};
use tracing::{trace, warn};

use crate::error::{Result, RoofError};

/// Relative area slack for boolean round-off on large roofs
const RELATIVE_AREA_TOLERANCE: f64 = 1e-6;

/// A face after clipping, keyed by the eave edge it rises from. A face the
/// eave cuts apart yields one `ClippedFace` per piece.
#[derive(Debug, Clone)]
pub(crate) struct ClippedFace {
    pub edge: usize,
    pub outline: Contour,
    pub area: f64,
}

pub(crate) fn reconcile_faces(
    eave: &[Point2<f64>],
    courtyards: &[Contour],
    faces: Vec<(usize, Contour)>,
) -> Result<Vec<ClippedFace>> {
    let eave_area = compute_signed_area(eave).abs()
        - courtyards
            .iter()
            .map(|c| compute_signed_area(c).abs())
            .sum::<f64>();
    let boundary = perimeter(eave) + courtyards.iter().map(|c| perimeter(c)).sum::<f64>();
    let tolerance = (area_tolerance(boundary) * faces.len().max(1) as f64)
        .max(eave_area * RELATIVE_AREA_TOLERANCE);

    let mut clipped = Vec::with_capacity(faces.len());
    for (edge, polygon) in faces {
        let regions: Vec<Region> = intersection(&polygon, eave)
            .into_iter()
            .flat_map(|region| cut_courtyards(region, courtyards))
            .filter(|region| {
                let keep = region.area() > area_tolerance(perimeter(&region.outer));
                if !keep {
                    trace!(edge, area = region.area(), "dropping face sliver");
                }
                keep
            })
            .collect();

        if regions.is_empty() {
            warn!(edge, "face vanished when clipped to the eave");
            continue;
        }
        if regions.len() > 1 {
            trace!(edge, pieces = regions.len(), "face cut apart by the eave");
        }

        clipped.extend(regions.into_iter().map(|region| ClippedFace {
            edge,
            area: region.area(),
            outline: region.outer,
        }));
    }

    let covered: f64 = clipped.iter().map(|f| f.area).sum();
    if (covered - eave_area).abs() > tolerance {
        return Err(RoofError::SkeletonInconsistent(format!(
            "faces cover {covered:.1} mm² of a {eave_area:.1} mm² eave"
        )));
    }

    // Outlines drop any holes, so compare them against their own union
    let outlines: Vec<Contour> = clipped.iter().map(|f| f.outline.clone()).collect();
    let outlined: f64 = outlines.iter().map(|o| compute_signed_area(o).abs()).sum();
    let merged = total_area(&union(&outlines));
    if outlined - merged > tolerance {
        return Err(RoofError::SkeletonInconsistent(format!(
            "faces overlap by {:.1} mm²",
            outlined - merged
        )));
    }

    Ok(clipped)
}

fn cut_courtyards(region: Region, courtyards: &[Contour]) -> Vec<Region> {
    if courtyards.is_empty() {
        return vec![region];
    }
    difference(&region.outer, courtyards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pts(points: &[(f64, f64)]) -> Contour {
        points.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    #[test]
    fn test_triangles_tile_square() {
        let eave = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let c = (5.0, 5.0);
        let faces = vec![
            (0, pts(&[(0.0, 0.0), (10.0, 0.0), c])),
            (1, pts(&[(10.0, 0.0), (10.0, 10.0), c])),
            (2, pts(&[(10.0, 10.0), (0.0, 10.0), c])),
            (3, pts(&[(0.0, 10.0), (0.0, 0.0), c])),
        ];
        let clipped = reconcile_faces(&eave, &[], faces).unwrap();
        assert_eq!(clipped.len(), 4);
        assert_relative_eq!(clipped[0].area, 25.0, max_relative = 1e-6);
    }

    #[test]
    fn test_overlapping_faces_are_rejected() {
        let eave = pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let faces = vec![
            (0, pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 60.0), (0.0, 60.0)])),
            (1, pts(&[(0.0, 40.0), (100.0, 40.0), (100.0, 100.0), (0.0, 100.0)])),
        ];
        let err = reconcile_faces(&eave, &[], faces).unwrap_err();
        assert_eq!(err.code(), "SKELETON_INCONSISTENT");
    }

    #[test]
    fn test_gap_is_rejected() {
        let eave = pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]);
        let faces = vec![(0, pts(&[(0.0, 0.0), (100.0, 0.0), (100.0, 50.0), (0.0, 50.0)]))];
        assert!(reconcile_faces(&eave, &[], faces).is_err());
    }

    #[test]
    fn test_face_cut_in_two_keeps_both_pieces() {
        // U-shaped eave; the upper face spans the notch and clips into the
        // two arms
        let eave = pts(&[
            (0.0, 0.0),
            (30.0, 0.0),
            (30.0, 20.0),
            (20.0, 20.0),
            (20.0, 10.0),
            (10.0, 10.0),
            (10.0, 20.0),
            (0.0, 20.0),
        ]);
        let faces = vec![
            (0, pts(&[(0.0, 0.0), (30.0, 0.0), (30.0, 10.0), (0.0, 10.0)])),
            (1, pts(&[(0.0, 10.0), (30.0, 10.0), (30.0, 20.0), (0.0, 20.0)])),
        ];
        let clipped = reconcile_faces(&eave, &[], faces).unwrap();
        assert_eq!(clipped.len(), 3);
        assert_eq!(clipped.iter().filter(|f| f.edge == 1).count(), 2);
        let total: f64 = clipped.iter().map(|f| f.area).sum();
        assert_relative_eq!(total, 500.0, max_relative = 1e-6);
    }

    #[test]
    fn test_courtyard_is_cut_from_faces() {
        let eave = pts(&[(0.0, 0.0), (30.0, 0.0), (30.0, 30.0), (0.0, 30.0)]);
        let courtyard = pts(&[(10.0, 10.0), (10.0, 20.0), (20.0, 20.0), (20.0, 10.0)]);
        let faces = vec![
            (0, pts(&[(0.0, 0.0), (30.0, 0.0), (30.0, 15.0), (0.0, 15.0)])),
            (1, pts(&[(0.0, 15.0), (30.0, 15.0), (30.0, 30.0), (0.0, 30.0)])),
        ];
        let clipped = reconcile_faces(&eave, &[courtyard], faces).unwrap();
        let total: f64 = clipped.iter().map(|f| f.area).sum();
        assert_relative_eq!(total, 800.0, max_relative = 1e-6);
    }
}
