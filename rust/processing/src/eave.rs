// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Eave polygons: footprints pushed outward by the overhang, with the
//! directive of every edge carried along.

use nalgebra::Point2;
use roofline_geometry::primitives::{
    compute_signed_area, point_line_distance, validate_polygon, Contour, EPSILON,
};
use roofline_geometry::{correspond_edges, offset_edges};
use tracing::debug;

use crate::config::RoofConfig;
use crate::directive::{resolve_all, EdgeDirective, ResolvedDirective};
use crate::error::{Result, RoofError};

/// Directive of one eave edge and the footprint edge it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EaveEdge {
    pub directive: ResolvedDirective,
    pub wing: usize,
    pub edge: usize,
}

impl EaveEdge {
    /// Same plane, so the two edges may be joined into one
    fn same_plane(&self, other: &EaveEdge) -> bool {
        self.directive == other.directive
    }
}

/// Counter-clockwise eave ring, `edges[i]` for the edge from `ring[i]` to
/// `ring[i + 1]`. Courtyards enclosed by merged wings are clockwise `holes`
/// of their own.
#[derive(Debug, Clone)]
pub(crate) struct Eave {
    pub ring: Contour,
    pub edges: Vec<EaveEdge>,
    pub holes: Vec<Eave>,
}

impl Eave {
    pub fn new(ring: Contour, edges: Vec<EaveEdge>) -> Self {
        Self {
            ring,
            edges,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(mut self, holes: Vec<Eave>) -> Self {
        self.holes = holes;
        self
    }

    /// The outer ring, then every courtyard
    pub fn rings(&self) -> impl Iterator<Item = &Eave> + '_ {
        std::iter::once(self).chain(self.holes.iter())
    }

    /// Eave edges as segments, for matching against merged outlines
    pub fn segments(&self) -> impl Iterator<Item = ((Point2<f64>, Point2<f64>), EaveEdge)> + '_ {
        let n = self.ring.len();
        (0..n).map(move |i| ((self.ring[i], self.ring[(i + 1) % n]), self.edges[i]))
    }

    /// Drop zero-length edges and join collinear neighbours that carry the
    /// same plane.
    pub fn tidy(self) -> Self {
        self.drop_short_edges().join_collinear()
    }

    fn drop_short_edges(mut self) -> Self {
        while self.ring.len() > 3 {
            let n = self.ring.len();
            let Some(i) = (0..n).find(|&i| (self.ring[(i + 1) % n] - self.ring[i]).norm() <= EPSILON)
            else {
                break;
            };
            // The previous edge now runs straight to the end of edge i
            self.ring.remove(i);
            let removed = self.edges.remove(i);
            debug!(wing = removed.wing, edge = removed.edge, "dropped zero-length edge");
        }
        self
    }

    /// The first edge of a joined run keeps its provenance.
    fn join_collinear(mut self) -> Self {
        while self.ring.len() > 3 {
            let n = self.ring.len();
            let straight = (0..n).find(|&i| {
                let prev = (i + n - 1) % n;
                let next = (i + 1) % n;
                let (a, b, c) = (&self.ring[prev], &self.ring[i], &self.ring[next]);
                (b - a).dot(&(c - b)) > 0.0
                    && self.edges[prev].same_plane(&self.edges[i])
                    && point_line_distance(b, a, c) <= EPSILON
            });
            let Some(i) = straight else {
                break;
            };
            self.ring.remove(i);
            self.edges.remove(i);
        }
        self
    }
}

/// Reverse a clockwise footprint, keeping each directive on its edge.
pub(crate) fn orient_ccw<T: Copy>(polygon: &[Point2<f64>], edges: &[T]) -> (Contour, Vec<T>) {
    if compute_signed_area(polygon) >= 0.0 {
        return (polygon.to_vec(), edges.to_vec());
    }
    let n = polygon.len();
    let ring: Contour = polygon.iter().rev().copied().collect();
    // Reversed edge j runs from old vertex n-1-j to n-2-j: old edge n-2-j
    let edges = (0..n).map(|j| edges[(2 * n - 2 - j) % n]).collect();
    (ring, edges)
}

/// Validate a footprint, settle its directives and offset it into eave rings.
///
/// `directives` of `None` means HIP at the default pitch on every edge.
pub(crate) fn build_eaves(
    wing: usize,
    footprint: &[Point2<f64>],
    directives: Option<&[EdgeDirective]>,
    config: &RoofConfig,
) -> Result<Vec<Eave>> {
    if footprint.len() < 3 {
        return Err(roofline_geometry::Error::TooFewVertices(footprint.len()).into());
    }

    let resolved = match directives {
        Some(directives) => resolve_all(directives, footprint.len(), config)?,
        None => {
            let default = EdgeDirective::default_for(config);
            resolve_all(&vec![default; footprint.len()], footprint.len(), config)?
        }
    };

    let edges: Vec<EaveEdge> = resolved
        .into_iter()
        .enumerate()
        .map(|(edge, directive)| EaveEdge {
            directive,
            wing,
            edge,
        })
        .collect();
    let (ring, edges) = orient_ccw(footprint, &edges);
    let Eave {
        ring: polygon,
        edges,
        ..
    } = Eave::new(ring, edges).tidy();
    validate_polygon(&polygon)?;

    let distances: Vec<f64> = edges.iter().map(|e| e.directive.overhang(config)).collect();
    let rings = offset_edges(&polygon, &distances, config.miter_limit);
    if rings.is_empty() {
        return Err(RoofError::DegenerateOffset(format!(
            "overhang {} leaves nothing of wing {wing}",
            config.overhang
        )));
    }

    let eaves = rings
        .into_iter()
        .map(|ring| {
            let edges = inherit(&ring.sources, &edges)?;
            Ok(Eave::new(ring.points, edges).tidy())
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        wing,
        footprint_edges = polygon.len(),
        rings = eaves.len(),
        "built eave"
    );
    Ok(eaves)
}

/// Eave edges for a ring traced around several wings, each edge taking the
/// directive of the nearest parallel source edge. Works for outer rings and
/// clockwise courtyard rings alike, since both keep the roof on their left.
pub(crate) fn transfer(ring: &[Point2<f64>], sources: &[Eave]) -> Result<Eave> {
    let (segments, edges): (Vec<_>, Vec<_>) = sources.iter().flat_map(Eave::segments).unzip();
    let sources = correspond_edges(ring, &segments);
    let edges = inherit(&sources, &edges)?;
    Ok(Eave::new(ring.to_vec(), edges).tidy())
}

/// Map ring edges to source edges; unmatched edges (bevels) take the
/// directive of the edge before them.
fn inherit(sources: &[Option<usize>], edges: &[EaveEdge]) -> Result<Vec<EaveEdge>> {
    let Some(last) = sources.iter().rev().flatten().next() else {
        return Err(RoofError::DegenerateOffset(
            "eave ring lost every source edge".into(),
        ));
    };

    let mut carry = edges[*last];
    Ok(sources
        .iter()
        .map(|source| {
            if let Some(i) = source {
                carry = edges[*i];
            }
            carry
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::EdgeBehavior;
    use approx::assert_relative_eq;

    fn rect(w: f64, h: f64) -> Contour {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    #[test]
    fn test_orient_keeps_directives_on_their_edges() {
        let cw: Contour = rect(4.0, 2.0).into_iter().rev().collect();
        // Clockwise edges: top, right, bottom, left
        let labels = ['t', 'r', 'b', 'l'];
        let (ring, edges) = orient_ccw(&cw, &labels);
        assert!(compute_signed_area(&ring) > 0.0);
        // ccw ring starts at (0, 0): bottom, right, top, left
        assert_eq!(ring[0], Point2::new(0.0, 0.0));
        assert_eq!(edges, vec!['b', 'r', 't', 'l']);
    }

    #[test]
    fn test_build_eaves_offsets_every_edge() {
        let config = RoofConfig::default().with_overhang(500.0);
        let eaves = build_eaves(0, &rect(5000.0, 3000.0), None, &config).unwrap();
        assert_eq!(eaves.len(), 1);
        let area = compute_signed_area(&eaves[0].ring);
        assert_relative_eq!(area, 6000.0 * 4000.0, max_relative = 1e-9);
        assert_eq!(eaves[0].edges.len(), 4);
    }

    #[test]
    fn test_gable_overhang_applies_to_gable_edges_only() {
        let config = RoofConfig::default()
            .with_overhang(500.0)
            .with_gable_overhang(200.0);
        let directives = [
            EdgeDirective::hip(30.0),
            EdgeDirective::gable(),
            EdgeDirective::hip(30.0),
            EdgeDirective::gable(),
        ];
        let eaves = build_eaves(0, &rect(5000.0, 3000.0), Some(&directives), &config).unwrap();
        let area = compute_signed_area(&eaves[0].ring);
        assert_relative_eq!(area, 5400.0 * 4000.0, max_relative = 1e-9);
        let gables = eaves[0]
            .edges
            .iter()
            .filter(|e| e.directive.behavior == EdgeBehavior::Gable)
            .count();
        assert_eq!(gables, 2);
    }

    #[test]
    fn test_tidy_joins_collinear_edges_with_same_plane() {
        let config = RoofConfig::default();
        let directive = EdgeDirective::hip(30.0).resolve(0, &config).unwrap();
        let edge = |i| EaveEdge {
            directive,
            wing: 0,
            edge: i,
        };
        let eave = Eave::new(
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(5.0, 0.0),
                Point2::new(10.0, 0.0),
                Point2::new(10.0, 5.0),
                Point2::new(0.0, 5.0),
            ],
            (0..5).map(edge).collect(),
        )
        .tidy();
        assert_eq!(eave.ring.len(), 4);
        assert_eq!(eave.edges[0].edge, 0);
    }

    #[test]
    fn test_overhang_that_consumes_the_wing_is_degenerate() {
        let config = RoofConfig::default().with_overhang(-2000.0);
        let err = build_eaves(0, &rect(3000.0, 3000.0), None, &config).unwrap_err();
        assert_eq!(err.code(), "DEGENERATE_OFFSET");
    }
}
