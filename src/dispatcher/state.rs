// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run state: the state machine (spec §4.3) and the in-flight
//! architecture table. The table is mutated only from the correlation task
//! (single-writer, per spec §5's shared-resource policy) and snapshotted
//! under a short lock for the enumeration task's back-pressure check.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::schemas::Solution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Received,
    Planned,
    Running,
    Collecting,
    Done,
    Cancelled,
}

/// One architecture's progress against its required-metric bitmap. A metric
/// result arriving before an upstream metric is still accepted — completion
/// is decided by set membership, not arrival order (spec §4.3 "Ordering
/// guarantees").
pub struct ArchitectureProgress {
    required_metrics: HashSet<String>,
    received: HashMap<String, Value>,
    pub design_variables: Map<String, Value>,
    pub errored: bool,
}

impl ArchitectureProgress {
    pub fn new(required_metrics: &[&str], design_variables: Map<String, Value>) -> Self {
        Self {
            required_metrics: required_metrics.iter().map(|m| m.to_string()).collect(),
            received: HashMap::new(),
            design_variables,
            errored: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.errored || self.required_metrics.iter().all(|m| self.received.contains_key(m))
    }

    pub fn record_metric(&mut self, metric: &str, value: Value) {
        if self.required_metrics.contains(metric) {
            self.received.insert(metric.to_string(), value);
        }
    }

    /// A dependency/handler error surfaced for this architecture. Completion
    /// is forced immediately — the run does not wait out the remaining
    /// metrics (spec §7: "the Dispatcher never halts on a single
    /// architecture's failure; it records and continues").
    pub fn mark_errored(&mut self) {
        self.errored = true;
    }

    /// Assemble the Solution, filling any metric that never arrived with
    /// `sentinel` (spec §7: "others set to a configured sentinel").
    pub fn into_solution(self, id: String, sentinel: &Value) -> Solution {
        let mut objectives = Map::new();
        for metric in &self.required_metrics {
            let value = self.received.get(metric).cloned().unwrap_or_else(|| sentinel.clone());
            objectives.insert(metric.clone(), value);
        }
        Solution {
            solution_id: id,
            design_variables: self.design_variables,
            objectives,
            errored: self.errored,
        }
    }
}

/// The table of architectures currently in flight for one run, guarded by a
/// single async mutex. Single logical writer (the correlation task); the
/// enumeration task only ever takes a short-lived lock to check occupancy
/// against `max_in_flight`.
#[derive(Default)]
pub struct InFlightTable {
    inner: Mutex<HashMap<String, ArchitectureProgress>>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn insert(&self, architecture_id: String, progress: ArchitectureProgress) {
        self.inner.lock().await.insert(architecture_id, progress);
    }

    pub async fn remove(&self, architecture_id: &str) -> Option<ArchitectureProgress> {
        self.inner.lock().await.remove(architecture_id)
    }

    /// Apply `f` to the named architecture's progress, returning whatever
    /// `f` returns. `None` if the architecture is unknown (already
    /// completed, cancelled, or never dispatched under this run).
    pub async fn with_mut<R>(&self, architecture_id: &str, f: impl FnOnce(&mut ArchitectureProgress) -> R) -> Option<R> {
        let mut guard = self.inner.lock().await;
        guard.get_mut(architecture_id).map(f)
    }

    pub async fn drain_ids(&self) -> Vec<String> {
        self.inner.lock().await.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub workflow_id: String,
    pub status: RunStatus,
    pub solutions_delivered: usize,
    pub pending: usize,
    pub hypervolume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_completes_once_every_metric_arrives() {
        let mut progress = ArchitectureProgress::new(&["LifecycleCost", "CoverageFraction"], Map::new());
        assert!(!progress.is_complete());
        progress.record_metric("LifecycleCost", json!(100.0));
        assert!(!progress.is_complete());
        progress.record_metric("CoverageFraction", json!(0.8));
        assert!(progress.is_complete());
    }

    #[test]
    fn out_of_order_metric_arrival_still_completes() {
        let mut progress = ArchitectureProgress::new(&["A", "B"], Map::new());
        progress.record_metric("B", json!(1.0));
        progress.record_metric("A", json!(2.0));
        assert!(progress.is_complete());
    }

    #[tokio::test]
    async fn in_flight_table_tracks_occupancy() {
        let table = InFlightTable::new();
        table.insert("arch-0".into(), ArchitectureProgress::new(&["A"], Map::new())).await;
        assert_eq!(table.len().await, 1);
        table.remove("arch-0").await;
        assert_eq!(table.len().await, 0);
    }
}
