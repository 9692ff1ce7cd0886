// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input and output types of the skeleton solver.

use nalgebra::Point2;
use roofline_geometry::Contour;

/// How fast an edge's wavefront advances into the polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeSpeed {
    /// Horizontal distance travelled per unit of time (rise). For a roof
    /// plane of pitch `p` this is `1 / tan(p)`.
    Moving(f64),
    /// The edge never advances: a gable wall or a flat edge. Neighbouring
    /// fronts slide along its line.
    Static,
}

impl EdgeSpeed {
    #[inline]
    pub fn value(&self) -> f64 {
        match self {
            EdgeSpeed::Moving(speed) => *speed,
            EdgeSpeed::Static => 0.0,
        }
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        matches!(self, EdgeSpeed::Static)
    }
}

/// A counter-clockwise simple polygon with one speed per edge. Edge `i` runs
/// from `polygon[i]` to `polygon[i + 1]`.
///
/// Holes are clockwise rings strictly inside the polygon. Their edges are
/// numbered after the outer edges, hole by hole, so edge `n + j` of an
/// `n`-gon with one hole runs from `holes[0].ring[j]` to `holes[0].ring[j + 1]`.
#[derive(Debug, Clone, Default)]
pub struct SkeletonInput {
    pub polygon: Contour,
    pub speeds: Vec<EdgeSpeed>,
    pub holes: Vec<SkeletonHole>,
}

/// Clockwise inner ring with one speed per edge; its fronts move away from
/// the hole.
#[derive(Debug, Clone, Default)]
pub struct SkeletonHole {
    pub ring: Contour,
    pub speeds: Vec<EdgeSpeed>,
}

impl SkeletonInput {
    pub fn new(polygon: Contour, speeds: Vec<EdgeSpeed>) -> Self {
        Self {
            polygon,
            speeds,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, ring: Contour, speeds: Vec<EdgeSpeed>) -> Self {
        self.holes.push(SkeletonHole { ring, speeds });
        self
    }

    /// Outer ring first, then the holes
    pub fn rings(&self) -> impl Iterator<Item = (&[Point2<f64>], &[EdgeSpeed])> + '_ {
        std::iter::once((self.polygon.as_slice(), self.speeds.as_slice())).chain(
            self.holes
                .iter()
                .map(|h| (h.ring.as_slice(), h.speeds.as_slice())),
        )
    }

    pub fn edge_count(&self) -> usize {
        self.rings().map(|(ring, _)| ring.len()).sum()
    }

    /// End points and speed of every edge in global edge order
    pub fn edges(&self) -> Vec<(Point2<f64>, Point2<f64>, EdgeSpeed)> {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (ring, speeds) in self.rings() {
            let n = ring.len();
            for i in 0..n {
                let speed = speeds.get(i).copied().unwrap_or(EdgeSpeed::Static);
                edges.push((ring[i], ring[(i + 1) % n], speed));
            }
        }
        edges
    }
}

/// How a skeleton node came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Polygon vertex at time zero
    Corner,
    /// Neighbouring fronts merged after an edge shrank to nothing
    Edge,
    /// A vertex reached a far edge or another vertex and split the front
    Split,
    /// A whole front shrank to a single point
    Peak,
    /// A front collapsed into a line; end or interior point of a ridge run
    Ridge,
}

/// Vertex of the skeleton graph. `time` is the rise above the eave at which
/// the fronts met here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonNode {
    pub position: Point2<f64>,
    pub time: f64,
    pub kind: NodeKind,
}

/// Classification of a skeleton arc by the planes meeting along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcKind {
    /// Horizontal arc at the meeting height of two fronts
    Ridge,
    /// Sloped arc over a convex corner
    Hip,
    /// Sloped arc over a reflex corner
    Valley,
    /// Sloped arc along a static edge's line (gable verge)
    Rake,
    /// Arc between two coplanar faces; no visible crease
    Coplanar,
}

/// Arc between two nodes, separating the faces of `edges[0]` and `edges[1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletonArc {
    pub start: usize,
    pub end: usize,
    pub edges: [usize; 2],
    pub kind: ArcKind,
}

impl SkeletonArc {
    pub fn touches_edge(&self, edge: usize) -> bool {
        self.edges[0] == edge || self.edges[1] == edge
    }
}

/// Region swept by one moving edge, as node ids in counter-clockwise order
/// starting with the edge's own two corners.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonFace {
    pub edge: usize,
    pub nodes: Vec<usize>,
}

impl SkeletonFace {
    pub fn polygon(&self, nodes: &[SkeletonNode]) -> Contour {
        self.nodes.iter().map(|&n| nodes[n].position).collect()
    }
}

/// Complete solver output.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub nodes: Vec<SkeletonNode>,
    pub arcs: Vec<SkeletonArc>,
    pub faces: Vec<SkeletonFace>,
    /// Number of structural changes applied while propagating
    pub steps: usize,
}

impl Skeleton {
    pub fn arcs_of_kind(&self, kind: ArcKind) -> impl Iterator<Item = &SkeletonArc> + '_ {
        self.arcs.iter().filter(move |arc| arc.kind == kind)
    }

    pub fn count(&self, kind: ArcKind) -> usize {
        self.arcs_of_kind(kind).count()
    }
}
