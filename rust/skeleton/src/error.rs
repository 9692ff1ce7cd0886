// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for skeleton solving.

/// Result type alias for skeleton operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while propagating the wavefront.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The polygon or its edge speeds cannot be solved at all.
    #[error("invalid skeleton input: {0}")]
    InvalidInput(String),

    /// Propagation did not terminate cleanly or produced faces that do not
    /// close. Partial output is discarded.
    #[error("skeleton inconsistent: {0}")]
    Inconsistent(String),
}
