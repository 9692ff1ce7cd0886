// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roofline Skeleton
//!
//! Weighted straight skeleton of a simple polygon, possibly with holes,
//! computed by moving every edge inward at its own speed and recording where
//! the fronts meet. Hole edges move away from their hole.
//! Edges with [`EdgeSpeed::Static`] stay in place, which is how gable walls
//! and flat verges are modelled: the neighbouring fronts slide along them
//! and leave rake arcs behind.
//!
//! Time doubles as height. With `speed = 1 / tan(pitch)` an edge's front at
//! time `t` is exactly the contour line of its roof plane at rise `t`.
//!
//! ```
//! use roofline_skeleton::{solve_skeleton, ArcKind, EdgeSpeed, SkeletonInput};
//! use nalgebra::Point2;
//!
//! let input = SkeletonInput::new(
//!     vec![
//!         Point2::new(0.0, 0.0),
//!         Point2::new(8000.0, 0.0),
//!         Point2::new(8000.0, 5000.0),
//!         Point2::new(0.0, 5000.0),
//!     ],
//!     vec![EdgeSpeed::Moving(1.0); 4],
//! );
//! let skeleton = solve_skeleton(&input, 16).unwrap();
//! assert_eq!(skeleton.count(ArcKind::Ridge), 1);
//! assert_eq!(skeleton.count(ArcKind::Hip), 4);
//! ```

pub mod error;
mod events;
mod faces;
mod solver;
pub mod types;
mod wavefront;

pub use error::{Error, Result};
pub use types::{
    ArcKind, EdgeSpeed, NodeKind, Skeleton, SkeletonArc, SkeletonFace, SkeletonHole,
    SkeletonInput, SkeletonNode,
};
pub use wavefront::VertexKey;

/// Default multiple of the edge count allowed as structural changes
pub const DEFAULT_BUDGET_FACTOR: usize = 16;

/// Solve the weighted straight skeleton of a counter-clockwise polygon and
/// its clockwise holes.
///
/// `budget_factor` bounds the work: propagation that needs more than
/// `budget_factor * n` structural changes is reported as
/// [`Error::Inconsistent`] instead of looping.
pub fn solve_skeleton(input: &SkeletonInput, budget_factor: usize) -> Result<Skeleton> {
    solver::Solver::new(input, budget_factor)?.run()
}
