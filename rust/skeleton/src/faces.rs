// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face recovery from the finished skeleton graph.
//!
//! The face of edge `i` is bounded by the edge itself and by every arc that
//! names `i`. It is walked counter-clockwise from the edge's end corner
//! (the next vertex of the edge's own ring, outer or hole): at
//! each node the walk takes the first arc clockwise from the way it came in,
//! which keeps the face on its left.

use std::f64::consts::TAU;

use roofline_geometry::primitives::{compute_signed_area, cross2, dot2};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::types::{SkeletonArc, SkeletonFace, SkeletonNode};
use crate::wavefront::Wavefront;

pub(crate) fn trace_faces(
    nodes: &[SkeletonNode],
    arcs: &[SkeletonArc],
    fronts: &[Wavefront],
    edge_ends: &[usize],
) -> Result<Vec<SkeletonFace>> {
    let mut incident: FxHashMap<usize, SmallVec<[usize; 4]>> = FxHashMap::default();
    for (index, arc) in arcs.iter().enumerate() {
        incident.entry(arc.start).or_default().push(index);
        incident.entry(arc.end).or_default().push(index);
    }

    fronts
        .iter()
        .enumerate()
        .filter(|(_, front)| !front.is_static)
        .map(|(edge, _)| trace_face(edge, edge_ends[edge], nodes, arcs, &incident))
        .collect()
}

fn trace_face(
    edge: usize,
    end: usize,
    nodes: &[SkeletonNode],
    arcs: &[SkeletonArc],
    incident: &FxHashMap<usize, SmallVec<[usize; 4]>>,
) -> Result<SkeletonFace> {
    let start = edge;
    let mut previous = edge;
    let mut current = end;
    let mut path = vec![start, current];
    let mut used: SmallVec<[usize; 8]> = SmallVec::new();

    for _ in 0..=arcs.len() {
        let back = nodes[previous].position - nodes[current].position;

        let mut best: Option<(f64, usize, usize)> = None;
        for &index in incident.get(&current).into_iter().flatten() {
            let arc = &arcs[index];
            if !arc.touches_edge(edge) || used.contains(&index) {
                continue;
            }
            let other = if arc.start == current { arc.end } else { arc.start };
            let out = nodes[other].position - nodes[current].position;

            // Clockwise angle from `back` to `out`, in (0, TAU]
            let mut angle = cross2(&out, &back).atan2(dot2(&out, &back));
            if angle <= 0.0 {
                angle += TAU;
            }
            if best.map_or(true, |(a, _, _)| angle < a) {
                best = Some((angle, index, other));
            }
        }

        let Some((_, index, other)) = best else {
            return Err(Error::Inconsistent(format!(
                "face of edge {edge} is open at node {current}"
            )));
        };

        used.push(index);
        previous = current;
        current = other;

        if current == start {
            let face = SkeletonFace { edge, nodes: path };
            let area = compute_signed_area(&face.polygon(nodes));
            if area <= 0.0 {
                return Err(Error::Inconsistent(format!(
                    "face of edge {edge} has no positive area"
                )));
            }
            return Ok(face);
        }
        path.push(current);
    }

    Err(Error::Inconsistent(format!("face of edge {edge} does not close")))
}
