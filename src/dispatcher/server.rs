// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! HTTP ingress for the TSE Dispatcher (spec §6): `POST /tse`, `GET
//! /tse/<workflow_id>`, `DELETE /tse/<workflow_id>`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::config::DispatcherSettings;
use crate::errors::DispatchError;
use crate::graph::KnowledgeGraphClient;
use crate::observability::messages::{dispatcher::RunCancelled, StructuredLog};
use crate::schemas::TseRequest;

use super::bus::DispatcherBus;
use super::run::{Run, RunRegistry};
use super::state::RunStatus;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<DispatcherSettings>,
    pub graph: KnowledgeGraphClient,
    pub bus: Arc<DispatcherBus>,
    pub registry: RunRegistry,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tse", post(submit_tse))
        .route("/tse/:workflow_id", get(run_status))
        .route("/tse/:workflow_id", delete(cancel_run))
        .with_state(state)
}

#[derive(Serialize)]
struct AcceptedBody {
    workflow_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// `POST /tse` — accept a `TSERequest`, synthesize its workflow, and return
/// `202 Accepted` immediately (spec §4.3). Synthesis failure is the only
/// case that halts before any dispatch (spec §7); it is reported
/// synchronously as `400` with a body naming `InfeasibleError` and the
/// first offending constraint (S2).
async fn submit_tse(
    State(state): State<AppState>,
    Json(request): Json<TseRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let result = Run::accept(
        request,
        Arc::clone(&state.settings),
        state.graph.clone(),
        Arc::clone(&state.bus),
        state.registry.clone(),
    )
    .await;

    match result {
        Ok(workflow_id) => (
            StatusCode::ACCEPTED,
            Json(serde_json::to_value(AcceptedBody { workflow_id }).expect("AcceptedBody always serializes")),
        ),
        Err(DispatchError::Infeasible(err)) => (
            StatusCode::BAD_REQUEST,
            Json(
                serde_json::to_value(ErrorBody { error: "InfeasibleError", message: err.to_string() })
                    .expect("ErrorBody always serializes"),
            ),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(
                serde_json::to_value(ErrorBody { error: "DispatchError", message: err.to_string() })
                    .expect("ErrorBody always serializes"),
            ),
        ),
    }
}

/// `GET /tse/<workflow_id>` — status, solutions delivered, pending count,
/// hypervolume (spec §6).
async fn run_status(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.registry.get(&workflow_id).await {
        Some(correlator) => {
            let snapshot = correlator.summary_snapshot().await;
            (StatusCode::OK, Json(serde_json::to_value(snapshot).expect("RunSummary always serializes")))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(
                serde_json::to_value(ErrorBody { error: "UnknownWorkflow", message: workflow_id })
                    .expect("ErrorBody always serializes"),
            ),
        ),
    }
}

/// `DELETE /tse/<workflow_id>` — cancel a run (spec §4.3 "Cancellation").
async fn cancel_run(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.registry.get(&workflow_id).await {
        Some(correlator) => {
            if correlator.current_status().await == RunStatus::Cancelled {
                return (
                    StatusCode::CONFLICT,
                    Json(
                        serde_json::to_value(ErrorBody { error: "AlreadyCancelled", message: workflow_id })
                            .expect("ErrorBody always serializes"),
                    ),
                );
            }
            correlator.cancel().await;
            state.bus.unsubscribe_run(&workflow_id).await;
            RunCancelled {
                workflow_id: &workflow_id,
                solutions_delivered: correlator.summary_snapshot().await.solutions_delivered,
            }
            .log();
            (StatusCode::OK, Json(serde_json::json!({ "workflow_id": workflow_id, "cancelled": true })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(
                serde_json::to_value(ErrorBody { error: "UnknownWorkflow", message: workflow_id })
                    .expect("ErrorBody always serializes"),
            ),
        ),
    }
}

// Handler bodies here are thin glue over `Run::accept`, `Correlator`, and
// `RunRegistry`, each exercised directly by their own test modules; routing
// this thin would need a live broker and graph to test meaningfully.
