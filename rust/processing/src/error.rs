// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof solving errors.
//!
//! Every variant is terminal for the footprint (or merged component) it was
//! raised for. Retrying the same input cannot succeed.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type alias for roof operations.
pub type Result<T> = std::result::Result<T, RoofError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoofError {
    #[error("Invalid footprint: {0}")]
    InvalidFootprint(String),

    #[error("Invalid edge directive: {0}")]
    InvalidDirective(String),

    #[error("Degenerate offset: {0}")]
    DegenerateOffset(String),

    #[error("Skeleton inconsistent: {0}")]
    SkeletonInconsistent(String),
}

impl RoofError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            RoofError::InvalidFootprint(_) => "INVALID_FOOTPRINT",
            RoofError::InvalidDirective(_) => "INVALID_DIRECTIVE",
            RoofError::DegenerateOffset(_) => "DEGENERATE_OFFSET",
            RoofError::SkeletonInconsistent(_) => "SKELETON_INCONSISTENT",
        }
    }
}

/// Failure body handed to callers instead of geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&RoofError> for ErrorResponse {
    fn from(err: &RoofError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code().to_string(),
        }
    }
}

impl Serialize for RoofError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ErrorResponse::from(self).serialize(serializer)
    }
}

impl From<roofline_geometry::Error> for RoofError {
    fn from(err: roofline_geometry::Error) -> Self {
        RoofError::InvalidFootprint(err.to_string())
    }
}

impl From<roofline_skeleton::Error> for RoofError {
    fn from(err: roofline_skeleton::Error) -> Self {
        RoofError::SkeletonInconsistent(err.to_string())
    }
}
