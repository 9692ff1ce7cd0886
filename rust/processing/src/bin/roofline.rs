// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! roofline - solve roofs from a JSON request.
//!
//! Reads a request from the file named by the first argument, or stdin when
//! there is none (or it is `-`), and writes JSON to stdout.
//!
//! # Requests
//!
//! - Single footprint: `{"footprint": [{"x":..,"y":..}, ..], "edgeDirectives": [..]}`
//!   answers with a `RoofResult`.
//! - Rooms: `{"rooms": [{"id":.., "polygon": [..], "hasRoof": true, "edgeDirectives": [..]}]}`
//!   answers with a merge report carrying per-component status.
//!
//! Both accept `defaultPitch`, `overhang`, `gableOverhang` and
//! `baselineHeight` to override the `ROOFLINE_*` environment defaults.
//!
//! Failures print `{"error": .., "code": ..}` and exit with status 1.

use std::io::Read;
use std::process::ExitCode;

use roofline_geometry::Point2;
use roofline_processing::{
    merge_roofs, solve_hip_roof, solve_roof, EdgeDirective, ErrorResponse, Point2D, RoofConfig,
    RoofError, RoomFootprint,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("Could not read request: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed request: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Roof(#[from] RoofError),
}

impl CliError {
    fn response(&self) -> ErrorResponse {
        match self {
            CliError::Roof(err) => ErrorResponse::from(err),
            _ => ErrorResponse {
                error: self.to_string(),
                code: "INVALID_REQUEST".to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overrides {
    default_pitch: Option<f64>,
    overhang: Option<f64>,
    gable_overhang: Option<f64>,
    baseline_height: Option<f64>,
}

impl Overrides {
    fn apply(&self, mut config: RoofConfig) -> RoofConfig {
        if let Some(pitch) = self.default_pitch {
            config.default_pitch = pitch;
        }
        if let Some(overhang) = self.overhang {
            config.overhang = overhang;
        }
        if self.gable_overhang.is_some() {
            config.gable_overhang = self.gable_overhang;
        }
        if let Some(height) = self.baseline_height {
            config.baseline_height = height;
        }
        config
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoomsRequest {
    rooms: Vec<RoomFootprint>,
    #[serde(flatten)]
    overrides: Overrides,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FootprintRequest {
    footprint: Vec<Point2D>,
    #[serde(default)]
    edge_directives: Option<Vec<EdgeDirective>>,
    #[serde(flatten)]
    overrides: Overrides,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Request {
    Rooms(RoomsRequest),
    Footprint(FootprintRequest),
}

fn read_request(path: Option<String>) -> Result<Request, CliError> {
    let mut text = String::new();
    match path.as_deref() {
        None | Some("-") => {
            std::io::stdin().read_to_string(&mut text)?;
        }
        Some(path) => text = std::fs::read_to_string(path)?,
    }
    parse_request(&text)
}

fn parse_request(text: &str) -> Result<Request, CliError> {
    Ok(serde_json::from_str(text)?)
}

/// Returns the JSON answer and whether every roof solved.
fn run(request: Request, config: RoofConfig) -> Result<(String, bool), CliError> {
    match request {
        Request::Footprint(request) => {
            let config = request.overrides.apply(config);
            let footprint: Vec<Point2<f64>> =
                request.footprint.into_iter().map(Point2::from).collect();
            let solution = match &request.edge_directives {
                Some(directives) => solve_roof(&footprint, directives, &config)?,
                None => solve_hip_roof(&footprint, &config)?,
            };
            tracing::info!(
                ridges = solution.result.ridges.len(),
                hips = solution.result.hips.len(),
                valleys = solution.result.valleys.len(),
                plan_area = solution.plan_area(),
                "roof solved"
            );
            Ok((serde_json::to_string_pretty(&solution.result)?, true))
        }
        Request::Rooms(request) => {
            let config = request.overrides.apply(config);
            let report = merge_roofs(&request.rooms, &config);
            Ok((serde_json::to_string_pretty(&report)?, report.is_complete()))
        }
    }
}

/// What goes to stdout, and whether the process exits successfully.
fn respond(outcome: Result<(String, bool), CliError>) -> (String, bool) {
    match outcome {
        Ok(answer) => answer,
        Err(err) => {
            tracing::error!(error = %err, "request failed");
            let response = err.response();
            let json = serde_json::to_string_pretty(&response).unwrap_or_else(|_| {
                format!(r#"{{"error":"{}","code":"{}"}}"#, response.error, response.code)
            });
            (json, false)
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = RoofConfig::from_env();
    tracing::debug!(
        default_pitch = config.default_pitch,
        overhang = config.overhang,
        parallel = config.parallel,
        "loaded configuration"
    );

    let outcome = read_request(std::env::args().nth(1)).and_then(|request| run(request, config));
    let (json, success) = respond(outcome);
    println!("{json}");
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::Value;

    const RECTANGLE: &str =
        r#"[{"x":0,"y":0},{"x":9000,"y":0},{"x":9000,"y":6000},{"x":0,"y":6000}]"#;

    fn answer(text: &str, config: RoofConfig) -> (Value, bool) {
        let (json, success) = respond(parse_request(text).and_then(|r| run(r, config)));
        (serde_json::from_str(&json).unwrap(), success)
    }

    #[test]
    fn test_footprint_request_answers_with_roof_lines() {
        let text = format!(
            r#"{{"footprint":{RECTANGLE},"overhang":0,
                "edgeDirectives":[{{"behavior":"hip","pitch":35}},{{"behavior":"gable"}},
                                  {{"behavior":"hip","pitch":35}},{{"behavior":"gable"}}]}}"#
        );
        assert!(matches!(parse_request(&text), Ok(Request::Footprint(_))));

        let (json, success) = answer(&text, RoofConfig::default());
        assert!(success);
        assert_eq!(json["ridges"].as_array().unwrap().len(), 1);
        assert!(json["hips"].as_array().unwrap().is_empty());
        assert_eq!(json["eaves"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_rooms_request_answers_with_report() {
        let text = format!(r#"{{"rooms":[{{"id":"hall","polygon":{RECTANGLE}}}],"overhang":600}}"#);
        assert!(matches!(parse_request(&text), Ok(Request::Rooms(_))));

        let (json, success) = answer(&text, RoofConfig::default().sequential());
        assert!(success);
        assert_eq!(json["components"][0]["status"], "solved");
        assert_eq!(json["components"][0]["ids"][0], "hall");
    }

    #[test]
    fn test_overrides_replace_only_what_they_name() {
        let overrides: Overrides =
            serde_json::from_str(r#"{"defaultPitch":45,"gableOverhang":200}"#).unwrap();
        let base = RoofConfig::default().with_baseline_height(2400.0);
        let config = overrides.apply(base.clone());
        assert_eq!(config.default_pitch, 45.0);
        assert_eq!(config.gable_overhang, Some(200.0));
        assert_eq!(config.overhang, base.overhang);
        assert_eq!(config.baseline_height, 2400.0);
    }

    #[test]
    fn test_baseline_override_reaches_directives_without_one() {
        let text = format!(
            r#"{{"footprint":{RECTANGLE},"overhang":0,"baselineHeight":2700,
                "edgeDirectives":[{{"behavior":"hip","pitch":35}},{{"behavior":"gable"}},
                                  {{"behavior":"hip","pitch":35}},{{"behavior":"gable"}}]}}"#
        );
        let (json, success) = answer(&text, RoofConfig::default());
        assert!(success);
        for eave in json["eaves"].as_array().unwrap() {
            assert_relative_eq!(eave["start"]["z"].as_f64().unwrap(), 2700.0);
        }
        assert!(json["ridges"][0]["start"]["z"].as_f64().unwrap() > 2700.0);
    }

    #[test]
    fn test_failures_exit_unsuccessfully_with_a_code() {
        let (json, success) = answer("{\"footprint\": 3}", RoofConfig::default());
        assert!(!success);
        assert_eq!(json["code"], "INVALID_REQUEST");

        let (json, success) = answer(
            r#"{"footprint":[{"x":0,"y":0},{"x":1000,"y":0}]}"#,
            RoofConfig::default(),
        );
        assert!(!success);
        assert_eq!(json["code"], "INVALID_FOOTPRINT");
    }

    #[test]
    fn test_failed_component_still_prints_report() {
        let text = r#"{"rooms":[{"polygon":[{"x":0,"y":0},{"x":4000,"y":4000},
                                          {"x":4000,"y":0},{"x":0,"y":4000}]}]}"#;
        let (json, success) = answer(text, RoofConfig::default().sequential());
        assert!(!success);
        assert_eq!(json["components"][0]["status"], "failed");
        assert_eq!(json["components"][0]["error"]["code"], "INVALID_FOOTPRINT");
    }
}
