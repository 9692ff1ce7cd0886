// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roofline Processing
//!
//! Turns building footprints and per-edge roofing directives into the 3D
//! line network of a hipped or gabled roof: eaves, ridges, hips, valleys and
//! gable rakes, plus the roof planes as clipped faces for quantity take-off.
//!
//! # Overview
//!
//! - [`solve_roof`] handles one footprint: overhang offset, weighted
//!   straight skeleton, height annotation and face reconciliation.
//! - [`merge_roofs`] handles a set of rooms: wings whose eaves meet are
//!   unioned into one roof, the rest are solved alone, and failures are
//!   reported per component.
//!
//! Coordinates are millimetres in a y-up plan; heights are `z`.
//!
//! # Example
//!
//! ```
//! use roofline_processing::{solve_roof, EdgeDirective, RoofConfig};
//! use roofline_geometry::Point2;
//!
//! let footprint = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(10000.0, 0.0),
//!     Point2::new(10000.0, 6000.0),
//!     Point2::new(0.0, 6000.0),
//! ];
//! let directives = [EdgeDirective::hip(35.0); 4];
//! let roof = solve_roof(&footprint, &directives, &RoofConfig::default()).unwrap();
//!
//! assert_eq!(roof.result.ridges.len(), 1);
//! assert_eq!(roof.result.hips.len(), 4);
//! assert!(roof.result.valleys.is_empty());
//! ```

pub mod assembly;
pub mod config;
pub mod directive;
pub mod error;
pub mod merge;
pub mod result;

mod eave;
mod reconcile;

pub use assembly::{solve_hip_roof, solve_roof};
pub use config::RoofConfig;
pub use directive::{EdgeBehavior, EdgeDirective};
pub use error::{ErrorResponse, Result, RoofError};
pub use merge::{merge_roofs, ComponentReport, ComponentStatus, MergeReport, RoomFootprint};
pub use result::{Point2D, Point3D, RoofFace, RoofResult, RoofSolution, RoofSummary, Segment3D};
