// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Public roof output types.

use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Plan coordinate in millimetres, as exchanged with callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl From<Point2D> for Point2<f64> {
    fn from(p: Point2D) -> Self {
        Point2::new(p.x, p.y)
    }
}

impl From<Point2<f64>> for Point2D {
    fn from(p: Point2<f64>) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Point in millimetres, `z` is the height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn on_plan(p: &Point2<f64>, z: f64) -> Self {
        Self { x: p.x, y: p.y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Point3D> for Point3<f64> {
    fn from(p: Point3D) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment3D {
    pub start: Point3D,
    pub end: Point3D,
}

impl Segment3D {
    pub fn new(start: Point3D, end: Point3D) -> Self {
        Self { start, end }
    }

    /// True length, slope included
    pub fn length(&self) -> f64 {
        (Point3::from(self.end) - Point3::from(self.start)).norm()
    }

    pub fn plan_length(&self) -> f64 {
        ((self.end.x - self.start.x).powi(2) + (self.end.y - self.start.y).powi(2)).sqrt()
    }
}

/// Classified roof line network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoofResult {
    pub eaves: Vec<Segment3D>,
    pub ridges: Vec<Segment3D>,
    pub hips: Vec<Segment3D>,
    pub valleys: Vec<Segment3D>,
    /// Sloped verges above gable walls
    #[serde(default)]
    pub rakes: Vec<Segment3D>,
}

impl RoofResult {
    pub fn is_empty(&self) -> bool {
        self.segments().next().is_none()
    }

    /// Every segment of every class
    pub fn segments(&self) -> impl Iterator<Item = &Segment3D> + '_ {
        self.eaves
            .iter()
            .chain(&self.ridges)
            .chain(&self.hips)
            .chain(&self.valleys)
            .chain(&self.rakes)
    }

    pub fn extend(&mut self, other: RoofResult) {
        self.eaves.extend(other.eaves);
        self.ridges.extend(other.ridges);
        self.hips.extend(other.hips);
        self.valleys.extend(other.valleys);
        self.rakes.extend(other.rakes);
    }

    /// Total line lengths per class, for quantity take-off
    pub fn summary(&self) -> RoofSummary {
        let total = |segments: &[Segment3D]| segments.iter().map(Segment3D::length).sum();
        RoofSummary {
            eave_length: total(&self.eaves),
            ridge_length: total(&self.ridges),
            hip_length: total(&self.hips),
            valley_length: total(&self.valleys),
            rake_length: total(&self.rakes),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofSummary {
    pub eave_length: f64,
    pub ridge_length: f64,
    pub hip_length: f64,
    pub valley_length: f64,
    pub rake_length: f64,
}

/// One roof plane, clipped to the eave polygon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoofFace {
    /// Wing (room) the governing edge belongs to; 0 for single solves
    pub wing: usize,
    /// Footprint edge the plane rises from
    pub edge: usize,
    /// Degrees
    pub pitch: f64,
    /// Counter-clockwise in plan
    pub outline: Vec<Point3D>,
    pub plan_area: f64,
    /// `plan_area / cos(pitch)`
    pub slope_area: f64,
}

/// Output of a single-footprint solve.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoofSolution {
    pub result: RoofResult,
    pub faces: Vec<RoofFace>,
}

impl RoofSolution {
    pub fn extend(&mut self, other: RoofSolution) {
        self.result.extend(other.result);
        self.faces.extend(other.faces);
    }

    pub fn plan_area(&self) -> f64 {
        self.faces.iter().map(|f| f.plan_area).sum()
    }

    pub fn slope_area(&self) -> f64 {
        self.faces.iter().map(|f| f.slope_area).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_uses_true_length() {
        let result = RoofResult {
            hips: vec![Segment3D::new(
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(3.0, 0.0, 4.0),
            )],
            ..Default::default()
        };
        let summary = result.summary();
        assert_relative_eq!(summary.hip_length, 5.0);
        assert_relative_eq!(result.hips[0].plan_length(), 3.0);
        assert_eq!(summary.ridge_length, 0.0);
    }

    #[test]
    fn test_json_shape() {
        let result = RoofResult {
            ridges: vec![Segment3D::new(
                Point3D::new(0.0, 1.0, 2.0),
                Point3D::new(3.0, 1.0, 2.0),
            )],
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ridges"][0]["start"]["z"], 2.0);
        assert!(json["eaves"].as_array().unwrap().is_empty());
    }
}
