// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roofline Geometry
//!
//! Planar primitives, polygon booleans (via i_overlay) and straight-line
//! offsetting for building footprints, using nalgebra points in millimetres.

pub mod bool2d;
pub mod error;
pub mod offset;
pub mod primitives;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2};

pub use bool2d::{difference, intersection, total_area, union, Region};
pub use error::{Error, Result};
pub use offset::{correspond_edges, offset, offset_edges, OffsetRing, DEFAULT_MITER_LIMIT};
pub use primitives::{
    classify_point, compute_signed_area, contour_bounds, ensure_ccw, polygons_touch,
    segment_intersection, validate_polygon, Bounds, Contour, PointLocation,
    SegmentIntersection, EPSILON,
};
