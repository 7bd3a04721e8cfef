// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The TSERequest document and the Solution it eventually produces.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"MAX"|"MIN"}` — the only two directions an objective can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectiveDirection {
    Max,
    Min,
}

impl ObjectiveDirection {
    /// `original_source/workflow_generator.py`'s fallback heuristic:
    /// metric names containing "Benefit" or "Score" default to MAX,
    /// everything else to MIN. Used only when a caller's request omits an
    /// explicit direction for a metric — the documented invariant is that
    /// direction is supplied, this is pure leniency for the absent case.
    pub fn heuristic_for(metric_name: &str) -> Self {
        if metric_name.contains("Benefit") || metric_name.contains("Score") {
            ObjectiveDirection::Max
        } else {
            ObjectiveDirection::Min
        }
    }
}

#[derive(Debug, Clone)]
pub struct Objective {
    pub metric_name: String,
    pub direction: ObjectiveDirection,
}

/// `mission.start` / `mission.duration` plus an opaque region descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub start: DateTime<Utc>,
    #[serde(with = "duration_iso8601_or_days")]
    pub duration: Duration,
    #[serde(default)]
    pub region: Value,
}

/// Each design-space axis names its range either by `numberSteps` (uniform
/// linear spacing, both endpoints inclusive) or `stepSize` (emits
/// `floor((max-min)/step)+1` points starting at `min`), per spec §9.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Range {
    Steps { min: f64, max: f64, #[serde(rename = "numberSteps")] number_steps: u32 },
    StepSize { min: f64, max: f64, #[serde(rename = "stepSize")] step_size: f64 },
    /// A single fixed value — no sweep on this axis.
    Fixed(f64),
}

impl Range {
    /// Enumerate this axis's values in deterministic order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            Range::Fixed(v) => vec![*v],
            Range::Steps { min, max, number_steps } => {
                if *number_steps <= 1 {
                    return vec![*min];
                }
                let n = *number_steps as f64;
                (0..*number_steps)
                    .map(|i| min + (max - min) * (i as f64) / (n - 1.0))
                    .collect()
            }
            Range::StepSize { min, max, step_size } => {
                if *step_size <= 0.0 {
                    return vec![*min];
                }
                let count = ((max - min) / step_size).floor() as u32 + 1;
                (0..count).map(|i| min + (*step_size) * (i as f64)).collect()
            }
        }
    }
}

/// One parameter sweep block (a constellation, a satellite payload, a
/// ground station) as a bag of named axes plus whatever scalar fields the
/// evaluators need verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SweepBlock {
    #[serde(flatten)]
    pub axes: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DesignSpace {
    #[serde(default, rename = "spaceSegment")]
    pub space_segment: Vec<SweepBlock>,
    #[serde(default)]
    pub launchers: Vec<SweepBlock>,
    #[serde(default)]
    pub satellites: Vec<SweepBlock>,
    #[serde(default, rename = "groundSegment")]
    pub ground_segment: Vec<SweepBlock>,
    #[serde(default, rename = "groundStations")]
    pub ground_stations: Vec<SweepBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TseRequest {
    pub mission: Mission,
    #[serde(rename = "designSpace")]
    pub design_space: DesignSpace,
    #[serde(default)]
    pub settings: Map<String, Value>,
    pub objectives: HashMap<String, Option<ObjectiveDirection>>,
    #[serde(default, rename = "toolConstraints")]
    pub tool_constraints: HashMap<String, String>,
    #[serde(rename = "callbackUrl")]
    pub callback_url: String,
}

impl TseRequest {
    /// Resolve each declared objective's direction, applying the
    /// Benefit/Score heuristic when the caller left it null.
    pub fn resolved_objectives(&self) -> Vec<Objective> {
        self.objectives
            .iter()
            .map(|(name, dir)| Objective {
                metric_name: name.clone(),
                direction: dir.unwrap_or_else(|| ObjectiveDirection::heuristic_for(name)),
            })
            .collect()
    }

    /// The hypervolume reference point `R` for one objective axis (spec
    /// §4.5: "worst acceptable objective vector", a per-axis value, not a
    /// single scalar shared by every objective). Read from an optional
    /// `objectiveReferences` object in the request's free-form `settings`,
    /// keyed by metric name; falls back to `default` (the Dispatcher's
    /// configured `objective_reference`) when the caller supplies none.
    pub fn objective_reference(&self, metric_name: &str, default: f64) -> f64 {
        self.settings
            .get("objectiveReferences")
            .and_then(Value::as_object)
            .and_then(|refs| refs.get(metric_name))
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }
}

/// The completed per-architecture record streamed to `callbackUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    #[serde(rename = "solutionId")]
    pub solution_id: String,
    #[serde(rename = "designVariables")]
    pub design_variables: Map<String, Value>,
    pub objectives: Map<String, Value>,
    /// Not part of the wire format's happy path but emitted per §7 for a
    /// partial-run architecture.
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub errored: bool,
}

/// `(de)serialize_with` module discriminating ISO-8601 duration strings
/// from whole-day integers, per spec §4.4/§6.
mod duration_iso8601_or_days {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_days())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Days(i64),
            Iso(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Days(days) => Ok(Duration::days(days)),
            Raw::Iso(text) => parse_iso8601_duration(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 duration: {text}"))),
        }
    }

    /// Minimal `PnDTnHnMnS` parser covering the day/hour/minute/second
    /// designators the design-space missions actually use.
    fn parse_iso8601_duration(text: &str) -> Option<Duration> {
        let rest = text.strip_prefix('P')?;
        let (date_part, time_part) = match rest.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (rest, None),
        };

        let mut total = Duration::zero();
        total = total + parse_designators(date_part, &[('D', 1), ('W', 7)])?;
        if let Some(t) = time_part {
            total = total + parse_time_designators(t)?;
        }
        Some(total)
    }

    fn parse_designators(part: &str, units: &[(char, i64)]) -> Option<Duration> {
        let mut total = Duration::zero();
        let mut number = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
            } else if let Some((_, days_per_unit)) = units.iter().find(|(u, _)| *u == ch) {
                let value: f64 = number.parse().ok()?;
                number.clear();
                total = total + Duration::seconds((value * (*days_per_unit as f64) * 86400.0) as i64);
            } else {
                return None;
            }
        }
        Some(total)
    }

    fn parse_time_designators(part: &str) -> Option<Duration> {
        let mut total = Duration::zero();
        let mut number = String::new();
        for ch in part.chars() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
            } else {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let seconds_per_unit = match ch {
                    'H' => 3600.0,
                    'M' => 60.0,
                    'S' => 1.0,
                    _ => return None,
                };
                total = total + Duration::seconds((value * seconds_per_unit) as i64);
            }
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_direction_heuristic_matches_original_source() {
        assert_eq!(ObjectiveDirection::heuristic_for("InstrumentBenefitScore"), ObjectiveDirection::Max);
        assert_eq!(ObjectiveDirection::heuristic_for("LifecycleCost"), ObjectiveDirection::Min);
    }

    #[test]
    fn steps_range_is_endpoint_inclusive() {
        let range = Range::Steps { min: 400.0, max: 600.0, number_steps: 3 };
        assert_eq!(range.values(), vec![400.0, 500.0, 600.0]);
    }

    #[test]
    fn step_size_range_floors_point_count() {
        let range = Range::StepSize { min: 0.0, max: 10.0, step_size: 3.0 };
        // floor((10-0)/3)+1 = 4 points: 0, 3, 6, 9
        assert_eq!(range.values(), vec![0.0, 3.0, 6.0, 9.0]);
    }

    #[test]
    fn duration_accepts_iso8601_days() {
        let mission: Mission = serde_json::from_value(serde_json::json!({
            "start": "2024-01-01T00:00:00Z",
            "duration": "P1D"
        })).unwrap();
        assert_eq!(mission.duration.num_days(), 1);
    }

    #[test]
    fn duration_accepts_integer_days() {
        let mission: Mission = serde_json::from_value(serde_json::json!({
            "start": "2024-01-01T00:00:00Z",
            "duration": 7
        })).unwrap();
        assert_eq!(mission.duration.num_days(), 7);
    }
}
