// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event prediction for the wavefront.
//!
//! Events only wake the solver up at the right time. The structural change
//! itself is found geometrically once every vertex has been advanced, which
//! lets simultaneous events resolve together.

use std::cmp::Ordering;

use roofline_geometry::primitives::{dot2, EPSILON};

use crate::wavefront::{ActiveVertex, VertexKey, Wavefront};

/// Closing rates at or below this magnitude never produce an event.
pub(crate) const RATE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum EventKind {
    /// Piece `u -> w` of one front shrinks to zero length
    EdgeCollapse { u: VertexKey, w: VertexKey },
    /// Reflex vertex `v` reaches the piece `x -> y` of another front. The
    /// piece may belong to another ring, which carries its own stamp.
    Split {
        v: VertexKey,
        x: VertexKey,
        y: VertexKey,
        piece_stamp: u64,
    },
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Event {
    pub time: f64,
    pub stamp: u64,
    pub kind: EventKind,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    // Reversed so that `BinaryHeap` pops the earliest event first
    fn cmp(&self, other: &Self) -> Ordering {
        other.time.total_cmp(&self.time)
    }
}

/// Time at which the piece `u -> w` on front `front` reaches zero length.
pub(crate) fn edge_collapse_time(
    u: &ActiveVertex,
    w: &ActiveVertex,
    front: &Wavefront,
    now: f64,
) -> Option<f64> {
    let length = dot2(&(w.position(now) - u.position(now)), &front.dir);
    let rate = dot2(&(w.velocity - u.velocity), &front.dir);
    if rate >= -RATE_EPSILON {
        return None;
    }
    let time = now + length.max(0.0) / -rate;
    time.is_finite().then_some(time)
}

/// Time at which `v` reaches the piece `x -> y` of `front`, if the hit
/// lands on the piece.
pub(crate) fn split_time(
    v: &ActiveVertex,
    x: &ActiveVertex,
    y: &ActiveVertex,
    front: &Wavefront,
    now: f64,
) -> Option<f64> {
    let distance = front.distance(&v.position(now), now);
    if distance < -EPSILON {
        return None;
    }
    let rate = dot2(&front.normal, &v.velocity) - front.speed;
    if rate >= -RATE_EPSILON {
        return None;
    }
    let time = now + distance.max(0.0) / -rate;
    if !time.is_finite() {
        return None;
    }

    let hit = v.position(time);
    let start = x.position(time);
    let end = y.position(time);
    let length = dot2(&(end - start), &front.dir);
    let along = dot2(&(hit - start), &front.dir);
    (along >= -EPSILON && along <= length + EPSILON).then_some(time)
}
