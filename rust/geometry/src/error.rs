// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when a ring fails validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Polygon contains a non-finite coordinate at vertex {0}")]
    NonFinite(usize),

    #[error("Polygon has zero area")]
    ZeroArea,

    #[error("Polygon edges {first} and {second} intersect")]
    SelfIntersecting { first: usize, second: usize },
}
