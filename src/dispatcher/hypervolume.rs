// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Grid-approximated hypervolume tracker (spec §4.5). A deliberate REDESIGN
//! away from `original_source/hypervolume_calculator.py`'s offline exact
//! pass (`pymoo.indicators.hv.HV`, run once over a finished `summary.csv`):
//! exact HV is exponential in objective count, and a Dispatcher that is
//! still running needs a monotone progress indicator, not an exact number
//! computed after the fact.

use crate::schemas::tse::ObjectiveDirection;

#[derive(Debug, Clone, Copy)]
pub struct Axis {
    pub direction: ObjectiveDirection,
    /// The worst acceptable value on this axis — the reference point `R`.
    pub reference: f64,
}

/// Grid over `G^k` cells tracking, per spec: "On each new Solution `s`,
/// compute cell `c`... If `c` was not already dominated, mark every cell
/// `c' <= c` componentwise as dominated."
pub struct HypervolumeTracker {
    resolution: u32,
    axes: Vec<Axis>,
    dominated: Vec<bool>,
    pareto_front: Vec<Vec<f64>>,
}

impl HypervolumeTracker {
    pub fn new(resolution: u32, axes: Vec<Axis>) -> Self {
        let cell_count = (resolution as usize).pow(axes.len() as u32);
        Self {
            resolution,
            axes,
            dominated: vec![false; cell_count],
            pareto_front: Vec::new(),
        }
    }

    /// Record a new objective vector (ordered to match `axes`). Returns the
    /// updated `hv` value, which this tracker guarantees is non-decreasing
    /// (Testable Property 9).
    pub fn record(&mut self, objectives: &[f64]) -> f64 {
        let cell = self.project_to_cell(objectives);
        if !self.dominated[self.cell_index(&cell)] {
            self.mark_dominated(&cell);
        }
        self.update_pareto_front(objectives);
        self.hv()
    }

    pub fn hv(&self) -> f64 {
        let dominated_count = self.dominated.iter().filter(|d| **d).count() as f64;
        let cell_count = self.dominated.len() as f64;
        let volume: f64 = self.axes.iter().map(|a| a.reference.abs()).product();
        (dominated_count / cell_count) * volume
    }

    pub fn pareto_front(&self) -> &[Vec<f64>] {
        &self.pareto_front
    }

    /// `c = floor((R - s)/R * (G-1))`, clipped to `[0, G-1]` and oriented so
    /// that improving objectives always move towards cell 0 (MIN: smaller
    /// is better already; MAX: mirrored against the reference point first).
    fn project_to_cell(&self, objectives: &[f64]) -> Vec<u32> {
        objectives
            .iter()
            .zip(&self.axes)
            .map(|(&value, axis)| {
                let normalized = match axis.direction {
                    ObjectiveDirection::Min => (axis.reference - value) / axis.reference,
                    ObjectiveDirection::Max => (value - axis.reference) / axis.reference.max(f64::EPSILON),
                };
                let scaled = normalized * (self.resolution as f64 - 1.0);
                scaled.floor().clamp(0.0, (self.resolution - 1) as f64) as u32
            })
            .collect()
    }

    fn cell_index(&self, cell: &[u32]) -> usize {
        let mut index = 0usize;
        for &c in cell {
            index = index * self.resolution as usize + c as usize;
        }
        index
    }

    /// Mark every cell `c' <= c` componentwise as dominated (monotone union).
    fn mark_dominated(&mut self, cell: &[u32]) {
        let k = cell.len();
        let mut counters = vec![0u32; k];
        loop {
            if counters.iter().zip(cell).all(|(c, &limit)| *c <= limit) {
                let idx = self.cell_index(&counters);
                self.dominated[idx] = true;
            }
            if !increment_counters(&mut counters, cell) {
                break;
            }
        }
    }

    fn update_pareto_front(&mut self, objectives: &[f64]) {
        let minimized: Vec<f64> = objectives
            .iter()
            .zip(&self.axes)
            .map(|(&v, a)| match a.direction {
                ObjectiveDirection::Min => v,
                ObjectiveDirection::Max => -v,
            })
            .collect();

        if self
            .pareto_front
            .iter()
            .any(|existing| dominates(existing, &minimized))
        {
            return;
        }
        self.pareto_front.retain(|existing| !dominates(&minimized, existing));
        self.pareto_front.push(objectives.to_vec());
    }
}

fn dominates(a: &[f64], b: &[f64]) -> bool {
    a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
}

fn increment_counters(counters: &mut [u32], limits: &[u32]) -> bool {
    for i in (0..counters.len()).rev() {
        if counters[i] < limits[i] {
            counters[i] += 1;
            return true;
        }
        counters[i] = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn min_axis(reference: f64) -> Axis {
        Axis { direction: ObjectiveDirection::Min, reference }
    }

    #[test]
    fn hv_is_non_decreasing_as_points_arrive() {
        let mut tracker = HypervolumeTracker::new(11, vec![min_axis(1000.0), min_axis(1000.0)]);
        let mut last = 0.0;
        for point in [[900.0, 900.0], [500.0, 700.0], [300.0, 300.0]] {
            let hv = tracker.record(&point);
            assert!(hv >= last);
            last = hv;
        }
    }

    #[test]
    fn pareto_front_never_contains_mutually_dominated_members() {
        let mut tracker = HypervolumeTracker::new(11, vec![min_axis(1000.0)]);
        tracker.record(&[500.0]);
        tracker.record(&[200.0]);
        assert_eq!(tracker.pareto_front().len(), 1);
        assert_eq!(tracker.pareto_front()[0], vec![200.0]);
    }
}
