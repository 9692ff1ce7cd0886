// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Roof solving configuration.

use roofline_geometry::DEFAULT_MITER_LIMIT;
use roofline_skeleton::DEFAULT_BUDGET_FACTOR;

use crate::error::{Result, RoofError};

/// Global defaults for one solve call. Passed explicitly; the library never
/// reads ambient state.
#[derive(Debug, Clone, PartialEq)]
pub struct RoofConfig {
    /// Pitch in degrees for directives that do not name one.
    pub default_pitch: f64,
    /// Horizontal eave extension in mm, applied outward from every HIP edge.
    pub overhang: f64,
    /// Horizontal extension in mm past GABLE edges. `None` uses `overhang`.
    pub gable_overhang: Option<f64>,
    /// Eave height in mm for directives that do not name one.
    pub baseline_height: f64,
    /// Mitre length, in multiples of the offset, beyond which an eave corner
    /// is bevelled.
    pub miter_limit: f64,
    /// Structural changes allowed per eave vertex before a solve is declared
    /// inconsistent.
    pub event_budget_factor: usize,
    /// Solve independent roof components on the rayon pool.
    pub parallel: bool,
}

impl Default for RoofConfig {
    fn default() -> Self {
        Self {
            default_pitch: 30.0,
            overhang: 500.0,
            gable_overhang: None,
            baseline_height: 0.0,
            miter_limit: DEFAULT_MITER_LIMIT,
            event_budget_factor: DEFAULT_BUDGET_FACTOR,
            parallel: true,
        }
    }
}

impl RoofConfig {
    /// Load configuration from `ROOFLINE_*` environment variables, falling
    /// back to the defaults. Meant for binaries; library calls take the
    /// config as an argument.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_pitch: std::env::var("ROOFLINE_DEFAULT_PITCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_pitch),
            overhang: std::env::var("ROOFLINE_OVERHANG")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.overhang),
            gable_overhang: std::env::var("ROOFLINE_GABLE_OVERHANG")
                .ok()
                .and_then(|v| v.parse().ok()),
            baseline_height: std::env::var("ROOFLINE_BASELINE_HEIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.baseline_height),
            parallel: std::env::var("ROOFLINE_PARALLEL")
                .map(|v| !matches!(v.trim(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.parallel),
            ..defaults
        }
    }

    pub fn gable_overhang(&self) -> f64 {
        self.gable_overhang.unwrap_or(self.overhang)
    }

    pub fn with_overhang(mut self, overhang: f64) -> Self {
        self.overhang = overhang;
        self
    }

    pub fn with_default_pitch(mut self, pitch: f64) -> Self {
        self.default_pitch = pitch;
        self
    }

    pub fn with_gable_overhang(mut self, overhang: f64) -> Self {
        self.gable_overhang = Some(overhang);
        self
    }

    pub fn with_baseline_height(mut self, height: f64) -> Self {
        self.baseline_height = height;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.default_pitch.is_finite() || !(0.0..90.0).contains(&self.default_pitch) {
            return Err(RoofError::InvalidDirective(format!(
                "default pitch {} is outside [0, 90)",
                self.default_pitch
            )));
        }
        let overhangs = [self.overhang, self.gable_overhang()];
        if overhangs.iter().any(|o| !o.is_finite()) {
            return Err(RoofError::DegenerateOffset("overhang is not finite".into()));
        }
        if !self.baseline_height.is_finite() {
            return Err(RoofError::InvalidDirective(
                "baseline height is not finite".into(),
            ));
        }
        if self.miter_limit.is_nan() || self.miter_limit < 1.0 {
            return Err(RoofError::DegenerateOffset(format!(
                "miter limit {} is below 1",
                self.miter_limit
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gable_overhang_falls_back_to_overhang() {
        let config = RoofConfig::default().with_overhang(600.0);
        assert_eq!(config.gable_overhang(), 600.0);
        assert_eq!(config.with_gable_overhang(900.0).gable_overhang(), 900.0);
    }

    #[test]
    fn test_validate_rejects_vertical_default_pitch() {
        let config = RoofConfig::default().with_default_pitch(90.0);
        assert!(matches!(
            config.validate(),
            Err(RoofError::InvalidDirective(_))
        ));
        assert!(RoofConfig::default().validate().is_ok());
    }
}
