// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront propagation.
//!
//! The solver pops the earliest pending event, advances to its time and then
//! settles the wavefront: every ring is searched for the structural changes
//! that are due at that moment and they are applied one at a time until
//! nothing more changes. Settling is purely geometric, so several events
//! falling on the same instant (the two ends of a rectangle, equal-width
//! wings of an L) resolve together without a special case for each
//! combination.
//!
//! The changes, in the order they are looked for:
//!
//! 1. A run of coincident neighbours merges into one vertex (edge event).
//!    A ring that is entirely coincident ends in a peak.
//! 2. A vertex lying inside a piece of another front splits its ring there.
//! 3. Two coincident vertices that are not neighbours swap successors
//!    (vertex event).
//! 4. A ring without area collapses; the overlapping pieces become ridges.
//!
//! Only rings touched by a change get their events recomputed. Events carry
//! the ring's stamp so that predictions made before the change are dropped
//! when popped.

use std::collections::BinaryHeap;

use nalgebra::Point2;
use roofline_geometry::primitives::{
    area_tolerance, classify_point, compute_signed_area, cross2, perimeter, PointLocation,
    PARALLEL_EPSILON, EPSILON,
};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::events::{edge_collapse_time, split_time, Event, EventKind};
use crate::faces::trace_faces;
use crate::types::{
    ArcKind, EdgeSpeed, NodeKind, Skeleton, SkeletonArc, SkeletonInput, SkeletonNode,
};
use crate::wavefront::{turn, vertex_velocity, ActiveVertex, VertexKey, Wavefront};

/// Distance below which two wavefront points are the same point
const SNAP: f64 = EPSILON;

/// Structural changes allowed beyond `budget_factor * n`
const BUDGET_SLACK: usize = 64;

pub(crate) struct Solver {
    fronts: Vec<Wavefront>,
    /// End corner node of every polygon edge
    edge_ends: Vec<usize>,
    vertices: SlotMap<VertexKey, ActiveVertex>,
    nodes: Vec<SkeletonNode>,
    arcs: Vec<SkeletonArc>,
    queue: BinaryHeap<Event>,
    now: f64,
    /// Nodes created at the current time, for deduplication
    recent: Vec<usize>,
    /// Vertices created since the last reschedule
    fresh: Vec<VertexKey>,
    stamp: u64,
    steps: usize,
    budget: usize,
}

impl Solver {
    pub fn new(input: &SkeletonInput, budget_factor: usize) -> Result<Self> {
        for (index, (ring, speeds)) in input.rings().enumerate() {
            validate_ring(index, ring, speeds)?;
        }
        if compute_signed_area(&input.polygon) <= 0.0 {
            return Err(Error::InvalidInput(
                "polygon must be counter-clockwise".to_string(),
            ));
        }
        for (h, hole) in input.holes.iter().enumerate() {
            if compute_signed_area(&hole.ring) >= 0.0 {
                return Err(Error::InvalidInput(format!("hole {h} must be clockwise")));
            }
            if hole
                .ring
                .iter()
                .any(|p| classify_point(p, &input.polygon) != PointLocation::Inside)
            {
                return Err(Error::InvalidInput(format!(
                    "hole {h} is not inside the polygon"
                )));
            }
        }

        let fronts = input
            .edges()
            .iter()
            .map(|(a, b, speed)| Wavefront::new(a, b, *speed))
            .collect::<Result<Vec<_>>>()?;

        if fronts.iter().all(|f| f.is_static) {
            return Err(Error::InvalidInput("no edge moves".to_string()));
        }

        let n = fronts.len();
        let mut edge_ends = Vec::with_capacity(n);
        let mut base = 0;
        for (ring, _) in input.rings() {
            edge_ends.extend((0..ring.len()).map(|i| base + (i + 1) % ring.len()));
            base += ring.len();
        }

        let nodes = input
            .rings()
            .flat_map(|(ring, _)| ring.iter())
            .map(|p| SkeletonNode {
                position: *p,
                time: 0.0,
                kind: NodeKind::Corner,
            })
            .collect();

        let mut solver = Self {
            fronts,
            edge_ends,
            vertices: SlotMap::with_capacity_and_key(n * 2),
            nodes,
            arcs: Vec::new(),
            queue: BinaryHeap::new(),
            now: 0.0,
            recent: Vec::new(),
            fresh: Vec::new(),
            stamp: 0,
            steps: 0,
            budget: budget_factor.saturating_mul(n).saturating_add(BUDGET_SLACK),
        };

        // Global index of the ring's first vertex, edge and node alike
        let mut base = 0;
        for (ring, _) in input.rings() {
            let len = ring.len();
            let keys: Vec<VertexKey> = (0..len)
                .map(|i| {
                    let left = base + (i + len - 1) % len;
                    let right = base + i;
                    let (velocity, stalled) =
                        vertex_velocity(&solver.fronts[left], &solver.fronts[right]);
                    solver.vertices.insert(ActiveVertex {
                        origin: ring[i],
                        born: 0.0,
                        velocity,
                        node: right,
                        left,
                        right,
                        prev: VertexKey::default(),
                        next: VertexKey::default(),
                        stamp: 0,
                        stalled,
                    })
                })
                .collect();

            for i in 0..len {
                let vertex = solver.vertex_mut(keys[i])?;
                vertex.prev = keys[(i + len - 1) % len];
                vertex.next = keys[(i + 1) % len];
            }
            base += len;
        }

        Ok(solver)
    }

    pub fn run(mut self) -> Result<Skeleton> {
        let n = self.fronts.len();
        debug!(edges = n, budget = self.budget, "propagating wavefront");

        let rings = self.rings()?;
        let all: Vec<usize> = (0..rings.len()).collect();
        self.schedule(&rings, &all)?;

        let max_pops = self.budget.saturating_mul(n + 4);
        let mut pops = 0usize;

        while let Some(event) = self.queue.pop() {
            pops += 1;
            if pops > max_pops {
                return Err(Error::Inconsistent(format!(
                    "gave up after {max_pops} events"
                )));
            }
            if !self.is_current(&event) {
                continue;
            }

            let time = event.time.max(self.now);
            if time - self.now > EPSILON {
                self.recent.clear();
            }
            self.now = time;
            trace!(time, kind = ?event.kind, "event");

            if self.settle()? {
                self.reschedule()?;
            }
        }

        self.finish()
    }

    fn finish(self) -> Result<Skeleton> {
        let moving_left = self
            .vertices
            .values()
            .filter(|v| !self.fronts[v.left].is_static || !self.fronts[v.right].is_static)
            .count();
        if moving_left > 0 {
            return Err(Error::Inconsistent(format!(
                "no events left but {moving_left} vertices still move"
            )));
        }

        let faces = trace_faces(&self.nodes, &self.arcs, &self.fronts, &self.edge_ends)?;

        debug!(
            nodes = self.nodes.len(),
            arcs = self.arcs.len(),
            faces = faces.len(),
            steps = self.steps,
            "wavefront done"
        );

        Ok(Skeleton {
            nodes: self.nodes,
            arcs: self.arcs,
            faces,
            steps: self.steps,
        })
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn is_current(&self, event: &Event) -> bool {
        let stamped = |key: VertexKey, stamp: u64| {
            self.vertices
                .get(key)
                .filter(|v| v.stamp == stamp)
                .is_some()
        };
        match event.kind {
            EventKind::EdgeCollapse { u, w } => {
                stamped(u, event.stamp) && stamped(w, event.stamp) && self.vertices[u].next == w
            }
            EventKind::Split { v, x, y, piece_stamp } => {
                stamped(v, event.stamp)
                    && stamped(x, piece_stamp)
                    && stamped(y, piece_stamp)
                    && self.vertices[x].next == y
            }
        }
    }

    fn reschedule(&mut self) -> Result<()> {
        let fresh: FxHashSet<VertexKey> = std::mem::take(&mut self.fresh)
            .into_iter()
            .filter(|k| self.vertices.contains_key(*k))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }

        let rings = self.rings()?;
        // A hole ring can reach any other ring, so its neighbours' predictions
        // go stale with every change
        let targets: Vec<usize> = if self.hole_flags(&rings)?.contains(&true) {
            (0..rings.len()).collect()
        } else {
            (0..rings.len())
                .filter(|&r| rings[r].iter().any(|k| fresh.contains(k)))
                .collect()
        };
        self.schedule(&rings, &targets)
    }

    /// Restamp the `targets` rings and predict their events. Split events of
    /// a target's reflex vertices are predicted against its own pieces and,
    /// where a hole is involved, against the pieces of every other ring.
    fn schedule(&mut self, rings: &[Vec<VertexKey>], targets: &[usize]) -> Result<()> {
        for &r in targets {
            self.stamp += 1;
            let stamp = self.stamp;
            for &key in &rings[r] {
                self.vertex_mut(key)?.stamp = stamp;
            }
        }

        let holes = self.hole_flags(rings)?;
        let now = self.now;

        for &r in targets {
            let ring = &rings[r];
            let len = ring.len();
            if len < 3 {
                continue;
            }

            for i in 0..len {
                let (u, w) = (ring[i], ring[(i + 1) % len]);
                let (vu, vw) = (self.vertex(u)?, self.vertex(w)?);
                let stamp = vu.stamp;
                if let Some(time) = edge_collapse_time(vu, vw, &self.fronts[vu.right], now) {
                    self.queue.push(Event {
                        time,
                        stamp,
                        kind: EventKind::EdgeCollapse { u, w },
                    });
                }
            }

            for &v in ring {
                let vertex = self.vertex(v)?.clone();
                if vertex.stalled || !vertex.is_moving() || !self.is_reflex(&vertex) {
                    continue;
                }
                for (s, other) in rings.iter().enumerate() {
                    if s != r && !holes[r] && !holes[s] {
                        continue;
                    }
                    let other_len = other.len();
                    if other_len < 2 {
                        continue;
                    }
                    for i in 0..other_len {
                        let (x, y) = (other[i], other[(i + 1) % other_len]);
                        if x == v || y == v {
                            continue;
                        }
                        let (vx, vy) = (self.vertex(x)?, self.vertex(y)?);
                        let (front, piece_stamp) = (vx.right, vx.stamp);
                        if front == vertex.left || front == vertex.right {
                            continue;
                        }
                        if let Some(time) = split_time(&vertex, vx, vy, &self.fronts[front], now) {
                            self.queue.push(Event {
                                time,
                                stamp: vertex.stamp,
                                kind: EventKind::Split { v, x, y, piece_stamp },
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Which rings bound a hole: their vertices run clockwise around it.
    fn hole_flags(&self, rings: &[Vec<VertexKey>]) -> Result<Vec<bool>> {
        rings
            .iter()
            .map(|ring| {
                let positions = self.positions(ring)?;
                Ok(compute_signed_area(&positions) < -area_tolerance(perimeter(&positions)))
            })
            .collect()
    }

    fn is_reflex(&self, vertex: &ActiveVertex) -> bool {
        vertex.left != vertex.right
            && turn(&self.fronts[vertex.left], &self.fronts[vertex.right]) < -PARALLEL_EPSILON
    }

    // ------------------------------------------------------------------
    // Settling
    // ------------------------------------------------------------------

    /// Apply every change due at the current time. Returns whether anything
    /// changed.
    fn settle(&mut self) -> Result<bool> {
        let mut changed = false;
        loop {
            let rings = self.rings()?;
            let holes = self.hole_flags(&rings)?;
            let step = self.merge_coincident(&rings)?
                || self.split_at_fronts(&rings, &holes)?
                || self.pinch(&rings, &holes)?
                || self.collapse_flat(&rings)?;
            if !step {
                return Ok(changed);
            }

            changed = true;
            self.steps += 1;
            if self.steps > self.budget {
                return Err(Error::Inconsistent(format!(
                    "more than {} structural changes",
                    self.budget
                )));
            }
        }
    }

    /// Merge a run of coincident neighbours into one vertex, or end a ring
    /// whose vertices all coincide.
    fn merge_coincident(&mut self, rings: &[Vec<VertexKey>]) -> Result<bool> {
        for ring in rings {
            let len = ring.len();
            let positions = self.positions(ring)?;

            if positions.iter().all(|p| coincident(p, &positions[0])) {
                let kind = if len >= 3 { NodeKind::Peak } else { NodeKind::Ridge };
                let node = self.node_at(centroid(&positions), kind);
                trace!(node, vertices = len, "ring ends in a point");
                for &key in ring {
                    self.terminate(key, node)?;
                }
                return Ok(true);
            }

            for i in 0..len {
                let before = (i + len - 1) % len;
                let after = (i + 1) % len;
                if !coincident(&positions[i], &positions[after])
                    || coincident(&positions[before], &positions[i])
                {
                    continue;
                }

                let mut run = vec![ring[i]];
                let mut j = i;
                while run.len() < len && coincident(&positions[i], &positions[(j + 1) % len]) {
                    j = (j + 1) % len;
                    run.push(ring[j]);
                }

                let run_positions: Vec<Point2<f64>> =
                    (0..run.len()).map(|k| positions[(i + k) % len]).collect();
                if run.len() == len {
                    let node = self.node_at(centroid(&run_positions), NodeKind::Peak);
                    for &key in ring {
                        self.terminate(key, node)?;
                    }
                } else {
                    self.merge_run(&run, centroid(&run_positions))?;
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn merge_run(&mut self, run: &[VertexKey], position: Point2<f64>) -> Result<()> {
        let (first, last) = match (run.first(), run.last()) {
            (Some(&first), Some(&last)) => (self.vertex(first)?.clone(), self.vertex(last)?.clone()),
            _ => return Ok(()),
        };
        let node = self.node_at(position, NodeKind::Edge);
        trace!(node, merged = run.len(), "edge event");

        for &key in run {
            self.terminate(key, node)?;
        }
        self.spawn(position, node, first.left, last.right, first.prev, last.next)?;
        Ok(())
    }

    /// Split a ring where one of its vertices lies inside a piece of
    /// another front. When the piece belongs to another ring (a hole and
    /// the ring around it) the same reconnection joins the two rings.
    fn split_at_fronts(&mut self, rings: &[Vec<VertexKey>], holes: &[bool]) -> Result<bool> {
        let positions = rings
            .iter()
            .map(|ring| self.positions(ring))
            .collect::<Result<Vec<_>>>()?;

        for (r, ring) in rings.iter().enumerate() {
            if ring.len() < 3 {
                continue;
            }

            for (vi, &v) in ring.iter().enumerate() {
                let vertex = self.vertex(v)?;
                let (left, right) = (vertex.left, vertex.right);
                let p = positions[r][vi];

                for (s, other) in rings.iter().enumerate() {
                    if s != r && !holes[r] && !holes[s] {
                        continue;
                    }
                    let len = other.len();
                    if len < 2 {
                        continue;
                    }
                    for xi in 0..len {
                        let yi = (xi + 1) % len;
                        let (x, y) = (other[xi], other[yi]);
                        if x == v || y == v {
                            continue;
                        }
                        let front = self.vertex(x)?.right;
                        if front == left || front == right {
                            continue;
                        }
                        if !inside_piece(&p, &positions[s][xi], &positions[s][yi]) {
                            continue;
                        }

                        let node = self.node_at(p, NodeKind::Split);
                        trace!(node, front, joins = s != r, "split event");
                        let vertex = self.vertex(v)?.clone();
                        self.terminate(v, node)?;
                        self.spawn(p, node, vertex.left, front, vertex.prev, y)?;
                        self.spawn(p, node, front, vertex.right, x, vertex.next)?;
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// Reconnect two coincident vertices that are not neighbours. Within a
    /// ring this splits it; across a hole and its surrounding ring it joins
    /// them.
    fn pinch(&mut self, rings: &[Vec<VertexKey>], holes: &[bool]) -> Result<bool> {
        let positions = rings
            .iter()
            .map(|ring| self.positions(ring))
            .collect::<Result<Vec<_>>>()?;

        for (r, ring) in rings.iter().enumerate() {
            let len = ring.len();
            for i in 0..len {
                // Same ring: only non-neighbours of a ring of four or more
                if len >= 4 {
                    for j in (i + 2)..len {
                        if i == 0 && j == len - 1 {
                            continue;
                        }
                        if coincident(&positions[r][i], &positions[r][j]) {
                            let p = centroid(&[positions[r][i], positions[r][j]]);
                            self.reconnect(ring[i], ring[j], p)?;
                            return Ok(true);
                        }
                    }
                }

                for s in (r + 1)..rings.len() {
                    if !holes[r] && !holes[s] {
                        continue;
                    }
                    for (j, &other) in rings[s].iter().enumerate() {
                        if coincident(&positions[r][i], &positions[s][j]) {
                            let p = centroid(&[positions[r][i], positions[s][j]]);
                            self.reconnect(ring[i], other, p)?;
                            return Ok(true);
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    /// Vertex event at `p` between `a` and `b`: each continues with its own
    /// incoming front and the other's outgoing one.
    fn reconnect(&mut self, a: VertexKey, b: VertexKey, p: Point2<f64>) -> Result<()> {
        let va = self.vertex(a)?.clone();
        let vb = self.vertex(b)?.clone();
        let node = self.node_at(p, NodeKind::Split);
        trace!(node, "vertex event");

        self.terminate(a, node)?;
        self.terminate(b, node)?;
        self.spawn(p, node, va.left, vb.right, va.prev, vb.next)?;
        self.spawn(p, node, vb.left, va.right, vb.prev, va.next)?;
        Ok(())
    }

    /// Collapse a ring that has lost its area. Stretches covered by two
    /// different fronts become ridges.
    fn collapse_flat(&mut self, rings: &[Vec<VertexKey>]) -> Result<bool> {
        for ring in rings {
            let positions = self.positions(ring)?;
            let flat = ring.len() <= 2
                || compute_signed_area(&positions).abs()
                    <= area_tolerance(perimeter(&positions));
            if !flat {
                continue;
            }
            self.collapse(ring, &positions)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn collapse(&mut self, ring: &[VertexKey], positions: &[Point2<f64>]) -> Result<()> {
        let len = ring.len();
        let ring_nodes: Vec<usize> = positions
            .iter()
            .map(|p| self.node_at(*p, NodeKind::Ridge))
            .collect();

        let mut distinct: SmallVec<[usize; 8]> = SmallVec::new();
        for &node in &ring_nodes {
            if !distinct.contains(&node) {
                distinct.push(node);
            }
        }

        // Elementary stretches between consecutive nodes along each piece,
        // with the fronts covering them
        let mut order: Vec<(usize, usize)> = Vec::new();
        let mut cover: FxHashMap<(usize, usize), SmallVec<[usize; 2]>> = FxHashMap::default();

        for i in 0..len {
            let (a, b) = (positions[i], positions[(i + 1) % len]);
            let front = self.vertex(ring[i])?.right;
            let length = (b - a).norm();
            if length <= SNAP {
                continue;
            }
            let dir = (b - a) / length;

            let mut stops: SmallVec<[(f64, usize); 8]> = distinct
                .iter()
                .filter_map(|&node| {
                    let q = self.nodes[node].position;
                    let along = (q - a).dot(&dir);
                    let off = cross2(&dir, &(q - a)).abs();
                    (off <= SNAP && along >= -SNAP && along <= length + SNAP)
                        .then_some((along, node))
                })
                .collect();
            stops.sort_by(|p, q| p.0.total_cmp(&q.0));

            for pair in stops.windows(2) {
                let (s, e) = (pair[0].1, pair[1].1);
                if s == e {
                    continue;
                }
                let key = (s.min(e), s.max(e));
                let fronts = cover.entry(key).or_insert_with(|| {
                    order.push(key);
                    SmallVec::new()
                });
                if !fronts.contains(&front) {
                    fronts.push(front);
                }
            }
        }

        trace!(vertices = len, stretches = order.len(), "ring collapses");

        for (&key, &node) in ring.iter().zip(&ring_nodes) {
            self.terminate(key, node)?;
        }
        for key in order {
            if let Some(fronts) = cover.get(&key) {
                if fronts.len() >= 2 {
                    self.emit_arc(key.0, key.1, [fronts[0], fronts[1]]);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    fn rings(&self) -> Result<Vec<Vec<VertexKey>>> {
        let mut seen: FxHashSet<VertexKey> = FxHashSet::default();
        let mut rings = Vec::new();

        for start in self.vertices.keys() {
            if seen.contains(&start) {
                continue;
            }
            let mut ring = Vec::new();
            let mut key = start;
            loop {
                if !seen.insert(key) {
                    return Err(Error::Inconsistent("wavefront rings overlap".to_string()));
                }
                ring.push(key);
                key = self.vertex(key)?.next;
                if key == start {
                    break;
                }
                if ring.len() > self.vertices.len() {
                    return Err(Error::Inconsistent("wavefront ring does not close".to_string()));
                }
            }
            rings.push(ring);
        }
        Ok(rings)
    }

    fn positions(&self, ring: &[VertexKey]) -> Result<Vec<Point2<f64>>> {
        ring.iter()
            .map(|&k| Ok(self.vertex(k)?.position(self.now)))
            .collect()
    }

    fn vertex(&self, key: VertexKey) -> Result<&ActiveVertex> {
        self.vertices
            .get(key)
            .ok_or_else(|| Error::Inconsistent("dangling wavefront vertex".to_string()))
    }

    fn vertex_mut(&mut self, key: VertexKey) -> Result<&mut ActiveVertex> {
        self.vertices
            .get_mut(key)
            .ok_or_else(|| Error::Inconsistent("dangling wavefront vertex".to_string()))
    }

    /// Node at `position` and the current time, reusing one created earlier
    /// at the same instant.
    fn node_at(&mut self, position: Point2<f64>, kind: NodeKind) -> usize {
        let now = self.now;
        if let Some(&id) = self.recent.iter().find(|&&id| {
            let node = &self.nodes[id];
            (node.time - now).abs() <= EPSILON && coincident(&node.position, &position)
        }) {
            return id;
        }
        self.nodes.push(SkeletonNode {
            position,
            time: now,
            kind,
        });
        let id = self.nodes.len() - 1;
        self.recent.push(id);
        id
    }

    /// Insert a vertex between `prev` and `next`, starting now at `position`.
    fn spawn(
        &mut self,
        position: Point2<f64>,
        node: usize,
        left: usize,
        right: usize,
        prev: VertexKey,
        next: VertexKey,
    ) -> Result<VertexKey> {
        let (velocity, stalled) = if left == right {
            let front = &self.fronts[left];
            (front.normal * front.speed, false)
        } else {
            vertex_velocity(&self.fronts[left], &self.fronts[right])
        };

        let key = self.vertices.insert(ActiveVertex {
            origin: position,
            born: self.now,
            velocity,
            node,
            left,
            right,
            prev,
            next,
            stamp: 0,
            stalled,
        });
        self.vertex_mut(prev)?.next = key;
        self.vertex_mut(next)?.prev = key;
        self.fresh.push(key);
        Ok(key)
    }

    /// Remove a vertex, recording the arc it traced since its birth.
    fn terminate(&mut self, key: VertexKey, node: usize) -> Result<()> {
        let vertex = self
            .vertices
            .remove(key)
            .ok_or_else(|| Error::Inconsistent("dangling wavefront vertex".to_string()))?;
        self.emit_arc(vertex.node, node, [vertex.left, vertex.right]);
        Ok(())
    }

    fn emit_arc(&mut self, start: usize, end: usize, edges: [usize; 2]) {
        if start == end || edges[0] == edges[1] {
            return;
        }
        let (a, b) = (&self.fronts[edges[0]], &self.fronts[edges[1]]);
        if a.is_static && b.is_static {
            return;
        }
        let (from, to) = (&self.nodes[start], &self.nodes[end]);
        if coincident(&from.position, &to.position) && (from.time - to.time).abs() <= EPSILON {
            return;
        }

        let kind = if a.coplanar_with(b) {
            ArcKind::Coplanar
        } else if (from.time - to.time).abs() <= EPSILON {
            ArcKind::Ridge
        } else if a.is_static || b.is_static {
            ArcKind::Rake
        } else if turn(a, b) > 0.0 {
            ArcKind::Hip
        } else {
            ArcKind::Valley
        };

        self.arcs.push(SkeletonArc {
            start,
            end,
            edges,
            kind,
        });
    }
}

fn validate_ring(index: usize, ring: &[Point2<f64>], speeds: &[EdgeSpeed]) -> Result<()> {
    let n = ring.len();
    if n < 3 {
        return Err(Error::InvalidInput(format!(
            "ring {index}: {n} vertices, need at least 3"
        )));
    }
    if speeds.len() != n {
        return Err(Error::InvalidInput(format!(
            "ring {index}: {} edge speeds for {} edges",
            speeds.len(),
            n
        )));
    }
    if let Some(i) = speeds
        .iter()
        .position(|s| !s.value().is_finite() || s.value() < 0.0)
    {
        return Err(Error::InvalidInput(format!(
            "ring {index}: edge {i} has an invalid speed"
        )));
    }
    if ring.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "ring {index}: non-finite coordinate"
        )));
    }
    Ok(())
}

#[inline]
fn coincident(a: &Point2<f64>, b: &Point2<f64>) -> bool {
    (a - b).norm_squared() <= SNAP * SNAP
}

fn centroid(points: &[Point2<f64>]) -> Point2<f64> {
    let sum = points
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    Point2::from(sum / points.len().max(1) as f64)
}

/// `p` lies on the segment `a`-`b` away from both ends.
fn inside_piece(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> bool {
    let seg = b - a;
    let length = seg.norm();
    if length <= 2.0 * SNAP {
        return false;
    }
    let dir = seg / length;
    let along = (p - a).dot(&dir);
    along > SNAP && along < length - SNAP && cross2(&dir, &(p - a)).abs() <= SNAP
}
