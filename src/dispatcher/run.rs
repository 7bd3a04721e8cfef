// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ties the Dispatcher's pieces together for one TSE run: synthesize the
//! workflow, enumerate the design space, dispatch every architecture to
//! each objective metric's producer, and hand the rest off to the
//! [`Correlator`](super::correlation::Correlator) (spec §4.3's state
//! machine: RECEIVED → PLANNED → RUNNING → COLLECTING/DONE, or CANCELLED).

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

use crate::config::DispatcherSettings;
use crate::errors::DispatchError;
use crate::graph::KnowledgeGraphClient;
use crate::observability::messages::{dispatcher::RunAccepted, StructuredLog};
use crate::schemas::envelope::{EvaluationRequest, FunctionDependencies};
use crate::schemas::{Architecture, TseRequest, Workflow};
use crate::synth::Synthesizer;

use super::bus::DispatcherBus;
use super::callback::CallbackClient;
use super::correlation::Correlator;
use super::enumerate::enumerate_design_space;
use super::state::{ArchitectureProgress, RunStatus, RunSummary};
use super::summary::SummaryWriter;

/// Live registry of runs this process has accepted, keyed by workflow id —
/// what `GET /tse/<id>` and `DELETE /tse/<id>` look up.
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<Correlator>>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, workflow_id: String, correlator: Arc<Correlator>) {
        self.inner.write().await.insert(workflow_id, correlator);
    }

    pub async fn get(&self, workflow_id: &str) -> Option<Arc<Correlator>> {
        self.inner.read().await.get(workflow_id).cloned()
    }
}

pub struct Run;

impl Run {
    /// Accepts a `TSERequest`, synthesizes its workflow, and — on success —
    /// spawns the background dispatch/correlation tasks before returning.
    /// The caller (the `POST /tse` handler) gets back a `workflow_id`
    /// immediately; everything past synthesis happens off the request path,
    /// matching the `202 Accepted` contract (spec §4.3).
    pub async fn accept(
        request: TseRequest,
        settings: Arc<DispatcherSettings>,
        graph: KnowledgeGraphClient,
        bus: Arc<DispatcherBus>,
        registry: RunRegistry,
    ) -> Result<String, DispatchError> {
        let workflow_id = Uuid::new_v4().to_string();

        let synthesizer = Synthesizer::new(graph);
        let workflow = synthesizer.synthesize(&workflow_id, &request).await?;
        let workflow = Arc::new(workflow);

        let architectures = enumerate_design_space(&request.design_space);
        RunAccepted { workflow_id: &workflow_id, architecture_count: architectures.len() }.log();

        let run_dir = PathBuf::from(&settings.out_dir).join(&workflow_id);
        persist_architectures(run_dir.clone(), architectures.clone()).await;

        let columns = summary_columns(&architectures, workflow.required_metrics());
        let (summary, _summary_handle) = SummaryWriter::spawn(run_dir, columns);

        let callback = Arc::new(CallbackClient::new(
            request.callback_url.clone(),
            settings.callback_timeout(),
            settings.callback_retry_attempts,
        ));

        let dispatch_permits = Arc::new(Semaphore::new(settings.max_in_flight));

        // Per-objective hypervolume reference (spec §4.5's `R` is a vector,
        // one worst-acceptable value per axis), overridable per metric via
        // the request's free-form `settings.objectiveReferences`.
        let objective_references: BTreeMap<String, f64> = workflow
            .objectives
            .iter()
            .map(|o| (o.metric_name.clone(), request.objective_reference(&o.metric_name, settings.objective_reference)))
            .collect();

        let correlator = Arc::new(Correlator::new(
            Arc::clone(&workflow),
            summary,
            callback,
            Arc::clone(&dispatch_permits),
            objective_references,
            settings.objective_reference,
            settings.hypervolume_resolution,
            Value::from(settings.objective_reference),
        ));
        correlator.set_total_architectures(architectures.len());
        correlator.set_status(RunStatus::Planned).await;

        let receiver = bus.subscribe_run(&workflow_id, &workflow.subscribe_topic).await?;
        registry.insert(workflow_id.clone(), Arc::clone(&correlator)).await;

        tokio::spawn(Arc::clone(&correlator).run(receiver));
        tokio::spawn(dispatch_architectures(workflow, architectures, bus, correlator, workflow_id.clone()));

        Ok(workflow_id)
    }
}

async fn dispatch_architectures(
    workflow: Arc<Workflow>,
    architectures: Vec<Architecture>,
    bus: Arc<DispatcherBus>,
    correlator: Arc<Correlator>,
    workflow_id: String,
) {
    let dependencies_snapshot: HashMap<String, FunctionDependencies> = workflow
        .nodes
        .iter()
        .map(|node| {
            (
                node.function.clone(),
                FunctionDependencies { dependencies: node.dependencies.iter().map(|(k, v)| (k.clone(), v.clone())).collect() },
            )
        })
        .collect();
    // The Evaluator Runtime is pull-based: a function resolves its own
    // upstream REQUIRES chain on demand (`resolve_dependencies`), so
    // dispatch only needs to reach each objective metric's producer, not
    // every Level-1 node (spec §4.3 "Dispatch"; see `Workflow::objective_producer_nodes`).
    let producer_nodes: Vec<_> = workflow.objective_producer_nodes().into_iter().cloned().collect();
    let required_metrics: Vec<&str> = workflow.required_metrics();

    for architecture in architectures {
        if correlator.current_status().await == RunStatus::Cancelled {
            break;
        }

        // Back-pressure: wait for capacity before this architecture counts
        // as in flight. The permit is released by the correlator once the
        // architecture completes (spec §4.3 "Back-pressure").
        let permit = correlator.dispatch_permits.acquire().await.expect("dispatch semaphore is never closed");
        permit.forget();

        if correlator.current_status().await == RunStatus::Cancelled {
            correlator.dispatch_permits.add_permits(1);
            break;
        }

        let design_variables: Map<String, Value> = architecture.design_variables().into_iter().collect();
        correlator
            .register_architecture(architecture.id.clone(), ArchitectureProgress::new(&required_metrics, design_variables))
            .await;

        let result_topic = format!("{}/{}", workflow_id, architecture.id);
        for node in &producer_nodes {
            let request = EvaluationRequest {
                architecture: architecture.clone(),
                workflow_id: workflow_id.clone(),
                function: node.function.clone(),
                result_topic: result_topic.clone(),
                dependencies: dependencies_snapshot.clone(),
                extra: Default::default(),
            };
            let topic = format!("evaluators/{}/{}", node.tool, node.function);
            if let Err(err) = bus.dispatch(&topic, &request).await {
                tracing::error!(error = %err, topic, architecture_id = %architecture.id, "failed to dispatch producer request");
            }
        }
    }
}

async fn persist_architectures(run_dir: PathBuf, architectures: Vec<Architecture>) {
    let handle = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        for architecture in &architectures {
            let dir = run_dir.join(&architecture.id);
            std::fs::create_dir_all(&dir)?;
            let body = serde_json::to_vec_pretty(architecture)?;
            std::fs::write(dir.join("arch.json"), body)?;
        }
        Ok(())
    });
    if let Err(err) = handle.await {
        tracing::error!(error = %err, "architecture persistence task panicked");
    }
}

fn summary_columns(architectures: &[Architecture], required_metrics: Vec<&str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut columns = Vec::new();
    for architecture in architectures {
        for (name, _) in architecture.design_variables() {
            if seen.insert(name.clone()) {
                columns.push(name);
            }
        }
    }
    columns.extend(required_metrics.into_iter().map(str::to_string));
    columns
}

impl From<RunSummary> for Value {
    fn from(summary: RunSummary) -> Self {
        serde_json::to_value(summary).unwrap_or(Value::Null)
    }
}
