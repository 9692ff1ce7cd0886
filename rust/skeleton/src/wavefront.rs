// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Moving fronts and the active vertices that connect them.
//!
//! Front `i` is the line of polygon edge `i` translated along its inward
//! normal: at time `t` it is `{p : normal . p = offset + speed * t}`. An
//! active vertex is the intersection of its left (incoming) and right
//! (outgoing) fronts and moves linearly between events.

use nalgebra::{Point2, Vector2};
use roofline_geometry::primitives::{cross2, dot2, normalize, perp, PARALLEL_EPSILON};
use slotmap::new_key_type;

use crate::error::{Error, Result};
use crate::types::EdgeSpeed;

new_key_type! {
    /// Key for a vertex of the active wavefront.
    pub struct VertexKey;
}

/// Supporting line of one polygon edge.
#[derive(Debug, Clone)]
pub(crate) struct Wavefront {
    pub dir: Vector2<f64>,
    /// Inward unit normal
    pub normal: Vector2<f64>,
    pub speed: f64,
    pub offset: f64,
    pub is_static: bool,
}

impl Wavefront {
    pub fn new(start: &Point2<f64>, end: &Point2<f64>, speed: EdgeSpeed) -> Result<Self> {
        let dir = normalize(&(end - start))
            .ok_or_else(|| Error::InvalidInput("zero-length polygon edge".to_string()))?;
        let normal = perp(&dir);
        Ok(Self {
            dir,
            normal,
            speed: speed.value(),
            offset: dot2(&normal, &start.coords),
            is_static: speed.is_static() || speed.value() == 0.0,
        })
    }

    /// Signed distance from `p` to the front at time `t`, positive on the
    /// side the front is moving towards.
    #[inline]
    pub fn distance(&self, p: &Point2<f64>, t: f64) -> f64 {
        dot2(&self.normal, &p.coords) - self.offset - self.speed * t
    }

    /// Same plane: same direction and same speed
    pub fn coplanar_with(&self, other: &Wavefront) -> bool {
        !self.is_static
            && !other.is_static
            && cross2(&self.dir, &other.dir).abs() <= PARALLEL_EPSILON
            && dot2(&self.dir, &other.dir) > 0.0
            && (self.speed - other.speed).abs() <= PARALLEL_EPSILON * self.speed.max(1.0)
    }
}

/// Vertex of the active wavefront.
#[derive(Debug, Clone)]
pub(crate) struct ActiveVertex {
    pub origin: Point2<f64>,
    pub born: f64,
    pub velocity: Vector2<f64>,
    /// Skeleton node the vertex started from
    pub node: usize,
    /// Front of the edge arriving at this vertex
    pub left: usize,
    /// Front of the edge leaving this vertex
    pub right: usize,
    pub prev: VertexKey,
    pub next: VertexKey,
    /// Generation of the ring's event set; events with another stamp are stale
    pub stamp: u64,
    /// Between antiparallel fronts; waits in place for its ring to collapse
    pub stalled: bool,
}

impl ActiveVertex {
    #[inline]
    pub fn position(&self, t: f64) -> Point2<f64> {
        self.origin + self.velocity * (t - self.born)
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.norm_squared() > 0.0
    }
}

/// Velocity of the intersection point of two fronts.
///
/// Returns the velocity and whether the vertex is stalled between
/// antiparallel fronts.
pub(crate) fn vertex_velocity(left: &Wavefront, right: &Wavefront) -> (Vector2<f64>, bool) {
    let det = cross2(&left.normal, &right.normal);

    if det.abs() <= PARALLEL_EPSILON {
        if dot2(&left.normal, &right.normal) > 0.0 {
            return (left.normal * left.speed.min(right.speed), false);
        }
        return (Vector2::zeros(), true);
    }

    let (nl, nr) = (&left.normal, &right.normal);
    let (sl, sr) = (left.speed, right.speed);
    let velocity = Vector2::new(
        (sl * nr.y - sr * nl.y) / det,
        (nl.x * sr - nr.x * sl) / det,
    );
    (velocity, false)
}

/// Turn from the left front into the right front; negative at a reflex
/// vertex of a counter-clockwise ring.
#[inline]
pub(crate) fn turn(left: &Wavefront, right: &Wavefront) -> f64 {
    cross2(&left.dir, &right.dir)
}
