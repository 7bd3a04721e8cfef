// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The correlation task: the single writer of a run's in-flight
//! architecture table (spec §5). Drains inbound `ResultEnvelope`s from the
//! run's private channel, updates the owning architecture's bitmap, and on
//! completion assembles a Solution, appends it to the CSV, updates the
//! hypervolume tracker, and fires the callback (spec §4.3 "Correlation &
//! completion").

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Semaphore};

use crate::observability::messages::{dispatcher::ArchitectureCompleted, StructuredLog};
use crate::schemas::envelope::ResultEnvelope;
use crate::schemas::{Solution, Workflow};

use super::callback::CallbackClient;
use super::hypervolume::{Axis, HypervolumeTracker};
use super::state::{ArchitectureProgress, InFlightTable, RunStatus};
use super::summary::SummaryWriter;

/// The terminal message delivered to `callbackUrl` on cancellation (spec
/// §4.3 "Cancellation").
#[derive(Debug, serde::Serialize)]
struct CancelledNotice<'a> {
    workflow_id: &'a str,
    cancelled: bool,
}

pub struct Correlator {
    pub workflow: Arc<Workflow>,
    pub table: Arc<InFlightTable>,
    pub summary: SummaryWriter,
    pub hypervolume: Mutex<HypervolumeTracker>,
    pub callback: Arc<CallbackClient>,
    pub dispatch_permits: Arc<Semaphore>,
    pub objective_sentinel: Value,
    pub status: Mutex<RunStatus>,
    pub total_architectures: AtomicUsize,
    pub completed_architectures: AtomicUsize,
    pub solutions_delivered: AtomicUsize,
}

impl Correlator {
    /// `objective_references` is the per-metric reference point `R` (spec
    /// §4.5's "worst acceptable objective vector", one scalar per axis, not
    /// one shared by all of them); a metric absent from the map falls back
    /// to `default_reference`.
    pub fn new(
        workflow: Arc<Workflow>,
        summary: SummaryWriter,
        callback: Arc<CallbackClient>,
        dispatch_permits: Arc<Semaphore>,
        objective_references: BTreeMap<String, f64>,
        default_reference: f64,
        hv_resolution: u32,
        objective_sentinel: Value,
    ) -> Self {
        let axes = workflow
            .objectives
            .iter()
            .map(|o| Axis {
                direction: o.direction,
                reference: objective_references.get(&o.metric_name).copied().unwrap_or(default_reference),
            })
            .collect();

        Self {
            workflow,
            table: Arc::new(InFlightTable::new()),
            summary,
            hypervolume: Mutex::new(HypervolumeTracker::new(hv_resolution, axes)),
            callback,
            dispatch_permits,
            objective_sentinel,
            status: Mutex::new(RunStatus::Received),
            total_architectures: AtomicUsize::new(0),
            completed_architectures: AtomicUsize::new(0),
            solutions_delivered: AtomicUsize::new(0),
        }
    }

    pub async fn set_status(&self, status: RunStatus) {
        *self.status.lock().await = status;
    }

    pub async fn current_status(&self) -> RunStatus {
        *self.status.lock().await
    }

    pub fn set_total_architectures(&self, count: usize) {
        self.total_architectures.store(count, Ordering::SeqCst);
    }

    /// Register one dispatched architecture before its requests go out, so
    /// a result that races ahead of the enumeration loop still finds a
    /// table entry to update.
    pub async fn register_architecture(&self, architecture_id: String, progress: ArchitectureProgress) {
        self.table.insert(architecture_id, progress).await;
    }

    /// Drains `receiver` until it closes (run torn down) or cancellation is
    /// observed. Spawned once per run by the Dispatcher's HTTP handler.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::UnboundedReceiver<(String, ResultEnvelope)>) {
        self.set_status(RunStatus::Running).await;

        while let Some((architecture_id, envelope)) = receiver.recv().await {
            if self.current_status().await == RunStatus::Cancelled {
                // In-flight results are logged and dropped once cancelled
                // (spec §4.3 "Cancellation").
                tracing::info!(workflow_id = %self.workflow.workflow_id, architecture_id, "dropping result: run cancelled");
                continue;
            }
            self.apply_result(architecture_id, envelope).await;
        }
    }

    async fn apply_result(&self, architecture_id: String, envelope: ResultEnvelope) {
        let completed = self
            .table
            .with_mut(&architecture_id, |progress| {
                if envelope.is_err() {
                    progress.mark_errored();
                } else if let Some(results) = envelope.results.as_ref().and_then(Value::as_object) {
                    for (metric, value) in results {
                        progress.record_metric(metric, value.clone());
                    }
                }
                progress.is_complete()
            })
            .await;

        match completed {
            Some(true) => self.complete_architecture(architecture_id).await,
            Some(false) | None => {}
        }
    }

    async fn complete_architecture(&self, architecture_id: String) {
        let progress = match self.table.remove(&architecture_id).await {
            Some(p) => p,
            None => return,
        };
        let errored = progress.errored;
        let solution = progress.into_solution(architecture_id.clone(), &self.objective_sentinel);

        ArchitectureCompleted { workflow_id: &self.workflow.workflow_id, architecture_id: &architecture_id, errored }.log();

        if !errored {
            let ordered: Vec<f64> = self
                .workflow
                .objectives
                .iter()
                .map(|o| solution.objectives.get(&o.metric_name).and_then(Value::as_f64).unwrap_or(0.0))
                .collect();
            self.hypervolume.lock().await.record(&ordered);
        }

        self.summary.append(solution.clone());
        self.deliver_callback(solution);

        self.dispatch_permits.add_permits(1);
        let completed_so_far = self.completed_architectures.fetch_add(1, Ordering::SeqCst) + 1;
        self.solutions_delivered.fetch_add(1, Ordering::SeqCst);

        if completed_so_far >= self.total_architectures.load(Ordering::SeqCst) {
            self.set_status(RunStatus::Done).await;
        } else {
            self.set_status(RunStatus::Collecting).await;
        }
    }

    fn deliver_callback(&self, solution: Solution) {
        let callback = Arc::clone(&self.callback);
        tokio::spawn(async move {
            let _ = callback.deliver(&solution).await;
        });
    }

    /// Transition to CANCELLED and fire the terminal callback. Does not
    /// drain outstanding requests itself — those simply get dropped by
    /// `run` as they arrive (or never arrive, since peer HTTP calls close
    /// their request contexts on cancellation, per spec §5).
    pub async fn cancel(&self) {
        self.set_status(RunStatus::Cancelled).await;
        let notice = CancelledNotice { workflow_id: &self.workflow.workflow_id, cancelled: true };
        let _ = self.callback.deliver(&notice).await;
    }

    pub async fn summary_snapshot(&self) -> super::state::RunSummary {
        super::state::RunSummary {
            workflow_id: self.workflow.workflow_id.clone(),
            status: self.current_status().await,
            solutions_delivered: self.solutions_delivered.load(Ordering::SeqCst),
            pending: self.table.len().await,
            hypervolume: self.hypervolume.lock().await.hv(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::workflow::ObjectiveOwned;
    use crate::schemas::tse::ObjectiveDirection;
    use std::time::Duration;

    fn workflow() -> Arc<Workflow> {
        Arc::new(Workflow {
            workflow_id: "wf-test".into(),
            nodes: vec![],
            objectives: vec![ObjectiveOwned { metric_name: "LifecycleCost".into(), direction: ObjectiveDirection::Min }],
            metric_producers: BTreeMap::new(),
            publish_metrics: BTreeMap::new(),
            tool_levels: BTreeMap::new(),
            subscribe_topic: "wf-test/#".into(),
        })
    }

    #[tokio::test]
    async fn a_single_architecture_completes_and_advances_status() {
        let dir = tempfile::tempdir().unwrap();
        let (summary, _handle) = SummaryWriter::spawn(dir.path().to_path_buf(), vec!["LifecycleCost".into()]);
        let callback = Arc::new(CallbackClient::new("http://127.0.0.1:0/callback", Duration::from_millis(50), 1));
        let permits = Arc::new(Semaphore::new(1));
        let correlator = Arc::new(Correlator::new(
            workflow(),
            summary,
            callback,
            permits,
            BTreeMap::new(),
            1_000_000.0,
            11,
            serde_json::json!(1_000_000.0),
        ));
        correlator.set_total_architectures(1);
        correlator
            .register_architecture("arch-0".into(), ArchitectureProgress::new(&["LifecycleCost"], serde_json::Map::new()))
            .await;

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(("arch-0".to_string(), ResultEnvelope::ok("CostTool", "wf-test", "CostEstimation", serde_json::json!({"LifecycleCost": 42.0}))))
            .unwrap();
        drop(tx);

        correlator.clone().run(rx).await;
        assert_eq!(correlator.current_status().await, RunStatus::Done);
        assert_eq!(correlator.solutions_delivered.load(Ordering::SeqCst), 1);
    }
}
