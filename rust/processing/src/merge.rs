// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Multi-wing roofs.
//!
//! Wings whose eave polygons overlap or touch share one roof: their eaves
//! are unioned and solved as a single skeleton, so the ridge runs straight
//! across the joint. Wings that stay apart are solved on their own.
//! Components are independent of each other and may run on the rayon pool;
//! a failing component is reported and never takes the others down.

use nalgebra::Point2;
use rayon::prelude::*;
use roofline_geometry::primitives::{
    contour_bounds, ensure_ccw, ensure_cw, polygons_touch, EPSILON,
};
use roofline_geometry::union;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::assembly::{solve_eave, solve_eaves};
use crate::config::RoofConfig;
use crate::directive::EdgeDirective;
use crate::eave::{build_eaves, transfer, Eave};
use crate::error::{Result, RoofError};
use crate::result::{Point2D, RoofFace, RoofResult, RoofSolution};

/// One building wing (room) as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFootprint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub polygon: Vec<Point2D>,
    #[serde(default = "roofed")]
    pub has_roof: bool,
    /// One per polygon edge; `None` for HIP at the default pitch everywhere
    #[serde(
        default,
        rename = "edgeDirectives",
        skip_serializing_if = "Option::is_none"
    )]
    pub directives: Option<Vec<EdgeDirective>>,
}

fn roofed() -> bool {
    true
}

impl RoomFootprint {
    pub fn new(polygon: &[Point2<f64>]) -> Self {
        Self {
            id: None,
            polygon: polygon.iter().copied().map(Point2D::from).collect(),
            has_roof: true,
            directives: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_directives(mut self, directives: Vec<EdgeDirective>) -> Self {
        self.directives = Some(directives);
        self
    }

    pub fn without_roof(mut self) -> Self {
        self.has_roof = false;
        self
    }

    fn points(&self) -> Vec<Point2<f64>> {
        self.polygon.iter().copied().map(Point2::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ComponentStatus {
    Solved,
    Failed { error: RoofError },
}

/// Outcome for one group of wings that share a roof.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentReport {
    /// Indices into the room list
    pub wings: Vec<usize>,
    pub ids: Vec<String>,
    #[serde(flatten)]
    pub status: ComponentStatus,
}

impl ComponentReport {
    pub fn is_solved(&self) -> bool {
        self.status == ComponentStatus::Solved
    }
}

/// Concatenated geometry of every solved component plus the status of each.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    pub result: RoofResult,
    pub faces: Vec<RoofFace>,
    pub components: Vec<ComponentReport>,
}

impl MergeReport {
    pub fn failures(&self) -> impl Iterator<Item = &ComponentReport> + '_ {
        self.components.iter().filter(|c| !c.is_solved())
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// A roofed wing with its eave rings built.
struct Wing {
    index: usize,
    eaves: Vec<Eave>,
}

/// Solve the roofs over a set of rooms, merging wings whose eaves meet.
pub fn merge_roofs(rooms: &[RoomFootprint], config: &RoofConfig) -> MergeReport {
    let ids = |wings: &[usize]| -> Vec<String> {
        wings.iter().filter_map(|&i| rooms[i].id.clone()).collect()
    };

    let roofed: Vec<usize> = (0..rooms.len()).filter(|&i| rooms[i].has_roof).collect();
    let mut report = MergeReport::default();

    if let Err(error) = config.validate() {
        warn!(code = error.code(), %error, "roof configuration rejected");
        // Nothing was grouped, so every wing fails on its own
        for index in roofed {
            report.components.push(ComponentReport {
                ids: ids(&[index]),
                wings: vec![index],
                status: ComponentStatus::Failed {
                    error: error.clone(),
                },
            });
        }
        return report;
    }

    // Wings that cannot even be offset fail on their own
    let mut wings = Vec::with_capacity(roofed.len());
    let mut failed = Vec::new();
    for index in roofed {
        let room = &rooms[index];
        match build_eaves(index, &room.points(), room.directives.as_deref(), config) {
            Ok(eaves) => wings.push(Wing { index, eaves }),
            Err(error) => failed.push((vec![index], Err(error))),
        }
    }

    let groups = components(&wings);
    debug!(
        wings = wings.len(),
        components = groups.len(),
        "grouped wings by touching eaves"
    );

    let solve = |group: &Vec<usize>| -> (Vec<usize>, Result<RoofSolution>) {
        let members: Vec<&Wing> = group.iter().map(|&g| &wings[g]).collect();
        let indices = members.iter().map(|w| w.index).collect();
        (indices, solve_component(&members, config))
    };

    let solved: Vec<_> = if config.parallel {
        groups.par_iter().map(solve).collect()
    } else {
        groups.iter().map(solve).collect()
    };

    let mut outcomes: Vec<(Vec<usize>, Result<RoofSolution>)> =
        solved.into_iter().chain(failed).collect();
    outcomes.sort_by_key(|(wings, _)| wings.first().copied());

    for (wings, outcome) in outcomes {
        let status = match outcome {
            Ok(solution) => {
                report.result.extend(solution.result);
                report.faces.extend(solution.faces);
                ComponentStatus::Solved
            }
            Err(error) => {
                warn!(?wings, code = error.code(), %error, "roof component failed");
                ComponentStatus::Failed { error }
            }
        };
        report.components.push(ComponentReport {
            ids: ids(&wings),
            wings,
            status,
        });
    }

    info!(
        components = report.components.len(),
        failed = report.failures().count(),
        "merged roofs"
    );
    report
}

/// Group wings whose eave rings overlap or touch. Groups come out ordered by
/// their lowest wing, members ascending.
fn components(wings: &[Wing]) -> Vec<Vec<usize>> {
    let bounds: Vec<_> = wings
        .iter()
        .map(|w| {
            w.eaves
                .iter()
                .filter_map(|e| contour_bounds(&e.ring))
                .reduce(|a, b| a.union(&b))
                .map(|b| b.expand(EPSILON))
        })
        .collect();

    let mut parent: Vec<usize> = (0..wings.len()).collect();
    for a in 0..wings.len() {
        for b in (a + 1)..wings.len() {
            let (Some(ba), Some(bb)) = (&bounds[a], &bounds[b]) else {
                continue;
            };
            if !ba.overlaps(bb) {
                continue;
            }
            let touching = wings[a].eaves.iter().any(|ea| {
                wings[b]
                    .eaves
                    .iter()
                    .any(|eb| polygons_touch(&ea.ring, &eb.ring))
            });
            if touching {
                let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
                parent[ra.max(rb)] = ra.min(rb);
            }
        }
    }

    let mut groups: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for w in 0..wings.len() {
        let root = find(&mut parent, w);
        groups.entry(root).or_default().push(w);
    }
    let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
    groups.sort_by_key(|g| g[0]);
    groups
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn solve_component(wings: &[&Wing], config: &RoofConfig) -> Result<RoofSolution> {
    let [wing] = wings else {
        return solve_merged(wings, config);
    };
    solve_eaves(&wing.eaves, config)
}

/// Union the eaves of several wings and solve every resulting outline.
/// Wings that close a ring around a courtyard give an outline with a hole;
/// the courtyard eaves become fronts of the same skeleton.
fn solve_merged(wings: &[&Wing], config: &RoofConfig) -> Result<RoofSolution> {
    let sources: Vec<Eave> = wings.iter().flat_map(|w| w.eaves.iter().cloned()).collect();
    let rings: Vec<_> = sources.iter().map(|e| e.ring.clone()).collect();
    let regions = union(&rings);

    if regions.is_empty() {
        return Err(RoofError::DegenerateOffset(
            "merged eaves left nothing to roof".into(),
        ));
    }

    debug!(
        wings = wings.len(),
        outlines = regions.len(),
        courtyards = regions.iter().map(|r| r.holes.len()).sum::<usize>(),
        "solving merged eave"
    );

    let mut solution = RoofSolution::default();
    for region in &regions {
        let holes = region
            .holes
            .iter()
            .map(|hole| transfer(&ensure_cw(hole), &sources))
            .collect::<Result<Vec<_>>>()?;
        let eave = transfer(&ensure_ccw(&region.outer), &sources)?.with_holes(holes);
        solution.extend(solve_eave(&eave, config)?);
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> RoomFootprint {
        RoomFootprint::new(&[
            Point2::new(x, y),
            Point2::new(x + w, y),
            Point2::new(x + w, y + h),
            Point2::new(x, y + h),
        ])
    }

    #[test]
    fn test_room_wire_format() {
        let json = r#"{"id":"kitchen","polygon":[{"x":0,"y":0},{"x":4000,"y":0},{"x":4000,"y":3000}]}"#;
        let room: RoomFootprint = serde_json::from_str(json).unwrap();
        assert!(room.has_roof);
        assert_eq!(room.id.as_deref(), Some("kitchen"));
        assert!(room.directives.is_none());
        assert_eq!(room.polygon[1], Point2D { x: 4000.0, y: 0.0 });
    }

    #[test]
    fn test_touching_eaves_group_together() {
        let config = RoofConfig::default().with_overhang(600.0);
        let rooms = [
            rect(0.0, 0.0, 10000.0, 6000.0),
            rect(30000.0, 0.0, 10000.0, 6000.0),
            rect(11000.0, 0.0, 10000.0, 6000.0),
        ];
        let wings: Vec<Wing> = rooms
            .iter()
            .enumerate()
            .map(|(index, room)| Wing {
                index,
                eaves: build_eaves(index, &room.points(), None, &config).unwrap(),
            })
            .collect();
        assert_eq!(components(&wings), vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_rooms_without_roof_are_skipped() {
        let config = RoofConfig::default().sequential();
        let rooms = [
            rect(0.0, 0.0, 8000.0, 5000.0).with_id("hall"),
            rect(8000.0, 0.0, 3000.0, 5000.0).with_id("porch").without_roof(),
        ];
        let report = merge_roofs(&rooms, &config);
        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].wings, vec![0]);
        assert_eq!(report.components[0].ids, vec!["hall".to_string()]);
        assert!(report.is_complete());
        assert_eq!(report.result.ridges.len(), 1);
    }

    #[test]
    fn test_bad_config_fails_every_roofed_wing() {
        let config = RoofConfig::default().with_default_pitch(95.0);
        let rooms = [
            rect(0.0, 0.0, 8000.0, 5000.0).with_id("a"),
            rect(8000.0, 0.0, 8000.0, 5000.0).with_id("b"),
            rect(30000.0, 0.0, 3000.0, 3000.0).without_roof(),
        ];
        let report = merge_roofs(&rooms, &config);
        // Touching wings are not reported as merged: nothing was grouped
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.components[0].wings, vec![0]);
        assert_eq!(report.components[1].wings, vec![1]);
        assert_eq!(report.components[1].ids, vec!["b".to_string()]);
        assert_eq!(report.failures().count(), 2);
        assert!(report.result.is_empty());
    }

    #[test]
    fn test_courtyard_wings_share_one_roof() {
        let config = RoofConfig::default().with_overhang(500.0).sequential();
        // Four 4 m deep wings around a 6 x 4 m courtyard
        let rooms = [
            rect(0.0, 0.0, 14000.0, 4000.0),
            rect(10000.0, 4000.0, 4000.0, 4000.0),
            rect(0.0, 8000.0, 14000.0, 4000.0),
            rect(0.0, 4000.0, 4000.0, 4000.0),
        ];
        let report = merge_roofs(&rooms, &config);
        assert_eq!(report.components.len(), 1);
        assert_eq!(report.components[0].wings, vec![0, 1, 2, 3]);
        assert!(report.is_complete(), "{:?}", report.components);
        assert_eq!(report.result.valleys.len(), 4);
        assert_eq!(report.result.hips.len(), 4);
    }

    #[test]
    fn test_report_json_flags_failures() {
        let config = RoofConfig::default().sequential();
        let bowtie = RoomFootprint::new(&[
            Point2::new(0.0, 0.0),
            Point2::new(4000.0, 4000.0),
            Point2::new(4000.0, 0.0),
            Point2::new(0.0, 4000.0),
        ]);
        let report = merge_roofs(&[bowtie], &config);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["components"][0]["status"], "failed");
        assert_eq!(json["components"][0]["error"]["code"], "INVALID_FOOTPRINT");
    }
}
