// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-edge roofing directives.

use roofline_skeleton::EdgeSpeed;
use serde::{Deserialize, Serialize};

use crate::config::RoofConfig;
use crate::error::{Result, RoofError};

/// What the roof does above one footprint edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeBehavior {
    /// An inclined roof plane rises inward from the edge
    Hip,
    /// A vertical gable wall; the neighbouring planes meet above it
    Gable,
}

/// Directive for one footprint edge, aligned by index with the edge from
/// vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDirective {
    pub behavior: EdgeBehavior,
    /// Pitch in degrees, `None` for the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    /// Eave height in mm, `None` for the configured baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_height: Option<f64>,
}

impl EdgeDirective {
    pub fn hip(pitch: f64) -> Self {
        Self {
            behavior: EdgeBehavior::Hip,
            pitch: Some(pitch),
            baseline_height: None,
        }
    }

    pub fn gable() -> Self {
        Self {
            behavior: EdgeBehavior::Gable,
            pitch: None,
            baseline_height: None,
        }
    }

    /// HIP at the configured default pitch and baseline
    pub fn default_for(config: &RoofConfig) -> Self {
        Self {
            behavior: EdgeBehavior::Hip,
            pitch: None,
            baseline_height: Some(config.baseline_height),
        }
    }

    pub fn with_baseline(mut self, baseline_height: f64) -> Self {
        self.baseline_height = Some(baseline_height);
        self
    }

    /// Fill in the default pitch and baseline and check ranges.
    pub(crate) fn resolve(&self, index: usize, config: &RoofConfig) -> Result<ResolvedDirective> {
        let pitch = self.pitch.unwrap_or(config.default_pitch);
        let baseline = self.baseline_height.unwrap_or(config.baseline_height);
        if !pitch.is_finite() || !(0.0..90.0).contains(&pitch) {
            return Err(RoofError::InvalidDirective(format!(
                "edge {index}: pitch {pitch} is outside [0, 90)"
            )));
        }
        if !baseline.is_finite() {
            return Err(RoofError::InvalidDirective(format!(
                "edge {index}: baseline height is not finite"
            )));
        }
        Ok(ResolvedDirective {
            behavior: self.behavior,
            pitch,
            baseline,
        })
    }
}

/// Directive with its pitch and baseline settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedDirective {
    pub behavior: EdgeBehavior,
    /// Degrees
    pub pitch: f64,
    pub baseline: f64,
}

impl ResolvedDirective {
    /// Whether the edge carries a sloped plane. A zero pitch is a flat
    /// verge and behaves like a gable.
    pub fn is_sloped(&self) -> bool {
        self.behavior == EdgeBehavior::Hip && self.pitch > 0.0
    }

    /// Wavefront speed: horizontal run per unit of rise.
    pub fn speed(&self) -> EdgeSpeed {
        if self.is_sloped() {
            EdgeSpeed::Moving(1.0 / self.pitch.to_radians().tan())
        } else {
            EdgeSpeed::Static
        }
    }

    /// Rise per unit of horizontal run
    pub fn slope(&self) -> f64 {
        if self.is_sloped() {
            self.pitch.to_radians().tan()
        } else {
            0.0
        }
    }

    pub fn overhang(&self, config: &RoofConfig) -> f64 {
        match self.behavior {
            EdgeBehavior::Hip => config.overhang,
            EdgeBehavior::Gable => config.gable_overhang(),
        }
    }
}

/// Resolve a directive list against a footprint with `edge_count` edges.
pub(crate) fn resolve_all(
    directives: &[EdgeDirective],
    edge_count: usize,
    config: &RoofConfig,
) -> Result<Vec<ResolvedDirective>> {
    if directives.len() != edge_count {
        return Err(RoofError::InvalidDirective(format!(
            "{} directives for {} edges",
            directives.len(),
            edge_count
        )));
    }
    directives
        .iter()
        .enumerate()
        .map(|(i, d)| d.resolve(i, config))
        .collect()
}
