// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Design-space Cartesian-product enumeration (spec §4.3 "Architecture
//! enumeration", §9 "Design-space enumeration order").

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schemas::tse::{DesignSpace, Range, SweepBlock};
use crate::schemas::Architecture;

/// Standard gravitational parameter constant for the sun-synchronous
/// inclination approximation below (km^3/s^2, scaled for the formula's
/// conventional units).
const SSO_COEFFICIENT: f64 = 12_352_000.0;
const EARTH_RADIUS_KM: f64 = 6378.137;

enum SweepAxis {
    Values(Vec<Value>),
    SsoInclination,
}

/// Enumerate every architecture implied by a `DesignSpace`, one concrete
/// point per Cartesian-product combination of declared axes. Duplicate
/// combinations that arise from overlapping range endpoints collapse onto
/// one id (S6) — ids are assigned in stable first-occurrence order so
/// `enumerate_design_space` is itself deterministic (Testable Property 3's
/// sibling requirement for the Dispatcher).
pub fn enumerate_design_space(design_space: &DesignSpace) -> Vec<Architecture> {
    let blocks: Vec<&SweepBlock> = design_space
        .space_segment
        .iter()
        .chain(design_space.launchers.iter())
        .chain(design_space.satellites.iter())
        .chain(design_space.ground_segment.iter())
        .chain(design_space.ground_stations.iter())
        .collect();

    // Flatten axis names across every block into one ordered map so the
    // Cartesian product is taken over a deterministic key order.
    let mut axes: BTreeMap<String, SweepAxis> = BTreeMap::new();
    for block in &blocks {
        for (key, value) in &block.axes {
            axes.entry(key.clone()).or_insert_with(|| classify_axis(key, value));
        }
    }

    let keys: Vec<String> = axes.keys().cloned().collect();
    let mut combos: Vec<Map<String, Value>> = vec![Map::new()];

    for key in &keys {
        let axis = &axes[key];
        combos = match axis {
            SweepAxis::Values(values) => {
                let mut next = Vec::with_capacity(combos.len() * values.len().max(1));
                for combo in &combos {
                    for value in values {
                        let mut extended = combo.clone();
                        extended.insert(key.clone(), value.clone());
                        next.push(extended);
                    }
                }
                next
            }
            SweepAxis::SsoInclination => {
                // Resolved in a second pass once altitude is known.
                combos
            }
        };
    }

    for combo in &mut combos {
        if axes.values().any(|a| matches!(a, SweepAxis::SsoInclination)) {
            let altitude = combo.get("altitude").and_then(Value::as_f64).unwrap_or(500.0);
            combo.insert("inclination".to_string(), Value::from(sun_synchronous_inclination(altitude)));
        }
    }

    // Collapse duplicates (S6) while preserving first-occurrence order.
    let mut seen: Vec<Map<String, Value>> = Vec::new();
    for combo in combos {
        if !seen.contains(&combo) {
            seen.push(combo);
        }
    }

    seen.into_iter()
        .enumerate()
        .map(|(n, body)| Architecture::new(format!("arch-{n}"), Value::Object(body)))
        .collect()
}

fn classify_axis(key: &str, value: &Value) -> SweepAxis {
    if key == "inclination" && value.as_str() == Some("SSO") {
        return SweepAxis::SsoInclination;
    }
    match serde_json::from_value::<Range>(value.clone()) {
        Ok(range) => SweepAxis::Values(range.values().into_iter().map(Value::from).collect()),
        Err(_) => SweepAxis::Values(vec![value.clone()]),
    }
}

/// Analytic sun-synchronous inclination from circular-orbit altitude (km),
/// using the standard J2-perturbation approximation
/// `cos(i) = -(R_E + h)^3.5 / C`. Not iteratively refined — adequate for a
/// design-space sweep input, not for mission-grade orbit determination.
fn sun_synchronous_inclination(altitude_km: f64) -> f64 {
    let semi_major_axis = EARTH_RADIUS_KM + altitude_km;
    let cos_i = -(semi_major_axis.powf(3.5)) / SSO_COEFFICIENT;
    let cos_i = cos_i.clamp(-1.0, 1.0);
    cos_i.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block(axes: Map<String, Value>) -> SweepBlock {
        SweepBlock { axes }
    }

    #[test]
    fn single_fixed_axis_yields_one_architecture() {
        let mut design_space = DesignSpace::default();
        let mut axes = Map::new();
        axes.insert("numSatellites".into(), json!(1));
        design_space.satellites.push(block(axes));

        let archs = enumerate_design_space(&design_space);
        assert_eq!(archs.len(), 1);
        assert_eq!(archs[0].id, "arch-0");
    }

    #[test]
    fn two_axes_cartesian_product_yields_four_architectures() {
        let mut design_space = DesignSpace::default();
        let mut axes = Map::new();
        axes.insert("altitude".into(), json!({"min": 400.0, "max": 600.0, "numberSteps": 2}));
        axes.insert("numPlanes".into(), json!({"min": 1.0, "max": 2.0, "numberSteps": 2}));
        design_space.space_segment.push(block(axes));

        let archs = enumerate_design_space(&design_space);
        assert_eq!(archs.len(), 4);
        let ids: Vec<&str> = archs.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["arch-0", "arch-1", "arch-2", "arch-3"]);
    }

    #[test]
    fn overlapping_endpoints_collapse_to_distinct_ids() {
        let mut design_space = DesignSpace::default();
        let mut axes = Map::new();
        // stepSize sweep that revisits the same value at both ends.
        axes.insert("altitude".into(), json!({"min": 500.0, "max": 500.0, "stepSize": 100.0}));
        design_space.space_segment.push(block(axes));

        let archs = enumerate_design_space(&design_space);
        assert_eq!(archs.len(), 1);
        assert_eq!(archs[0].id, "arch-0");
    }

    #[test]
    fn sso_inclination_is_resolved_from_altitude() {
        let mut design_space = DesignSpace::default();
        let mut axes = Map::new();
        axes.insert("altitude".into(), json!(700.0));
        axes.insert("inclination".into(), json!("SSO"));
        design_space.space_segment.push(block(axes));

        let archs = enumerate_design_space(&design_space);
        assert_eq!(archs.len(), 1);
        let inclination = archs[0].body.get("inclination").and_then(Value::as_f64).unwrap();
        assert!(inclination > 90.0 && inclination < 110.0);
    }
}
