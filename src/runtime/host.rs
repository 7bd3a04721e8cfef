// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Evaluator Runtime host: dual ingress (HTTP peer calls, MQTT fan-out
//! dispatch), both running the same operational pipeline (spec §4.2) and
//! producing the identical `ResultEnvelope`.
//!
//! Generalizes the teacher's `engine::{LevelByLevelExecutor, WorkQueueExecutor}`
//! + `traits::Processor` pattern: a `Function` plays the role of a
//! `Processor`, and the teacher's `ExecutorOptions::max_concurrency` knob
//! now bounds concurrent in-flight `EvaluationRequest`s via a
//! `tokio::sync::Semaphore` rather than an in-process DAG level barrier.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio::sync::Semaphore;

use crate::config::EvaluatorSettings;
use crate::observability::messages::{
    runtime::{HandlerCompleted, RequestReceived, WorkerPoolSaturated},
    StructuredLog,
};
use crate::schemas::envelope::{EvaluationRequest, ResultEnvelope};

use super::peer::resolve_dependencies;
use super::registry::FunctionRegistry;

pub struct EvaluatorHost {
    settings: EvaluatorSettings,
    registry: FunctionRegistry,
    http_client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    saturated: AtomicBool,
}

impl EvaluatorHost {
    pub fn new(settings: EvaluatorSettings, registry: FunctionRegistry) -> Self {
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrency));
        let http_client = reqwest::Client::builder()
            .timeout(settings.peer_call_timeout())
            .build()
            .expect("reqwest client configuration is static and always valid");
        Self {
            settings,
            registry,
            http_client,
            semaphore,
            saturated: AtomicBool::new(false),
        }
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/:function", post(handle_http))
            .with_state(self)
    }

    /// Runs the MQTT subscriber loop until the connection is lost. Every
    /// inbound message spawns an independent task — the idiomatic async
    /// equivalent of `original_source`'s `threading.Thread(target=process_request)`
    /// per message.
    pub async fn run_bus_subscriber(self: Arc<Self>) -> Result<(), rumqttc::ClientError> {
        let mut options = MqttOptions::new(
            self.settings.bus.client_id.clone(),
            self.settings.bus.broker_host.clone(),
            self.settings.bus.broker_port,
        );
        options.set_keep_alive(std::time::Duration::from_secs(60));

        let (client, mut event_loop) = AsyncClient::new(options, 64);
        let topic = format!("evaluators/{}/+", self.settings.tool_name);
        client.subscribe(&topic, QoS::AtLeastOnce).await?;

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let host = Arc::clone(&self);
                    let client = client.clone();
                    let payload = publish.payload.to_vec();
                    tokio::spawn(async move {
                        host.handle_bus_message(client, payload).await;
                    });
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(error = %err, "mqtt event loop error; reconnecting");
                    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                }
            }
        }
    }

    async fn handle_bus_message(&self, client: AsyncClient, payload: Vec<u8>) {
        let request: EvaluationRequest = match serde_json::from_slice(&payload) {
            Ok(req) => req,
            Err(err) => {
                tracing::error!(error = %err, "malformed EvaluationRequest on bus; dropping");
                return;
            }
        };

        let result_topic = request.result_topic.clone();
        let canonical_topic = format!(
            "evaluators/{}/results/{}",
            self.settings.tool_name, request.function
        );

        let (envelope, _status) = self.handle(request, "bus").await;
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize result envelope");
                return;
            }
        };

        for topic in [result_topic, canonical_topic] {
            if let Err(err) = client.publish(topic, QoS::AtLeastOnce, false, body.clone()).await {
                tracing::error!(error = %err, "failed to publish result envelope");
            }
        }
    }

    /// Core pipeline shared by both ingress paths: acquire a worker-pool
    /// permit (back-pressure, never rejection), resolve dependencies in
    /// parallel, invoke the handler, and produce the result envelope. The
    /// `RuntimeError` (when present) carries the status code the HTTP path
    /// should respond with; the bus path always publishes the envelope.
    async fn handle(&self, request: EvaluationRequest, via: &str) -> (ResultEnvelope, Option<crate::errors::RuntimeError>) {
        use crate::errors::RuntimeError;

        RequestReceived { function: &request.function, workflow_id: &request.workflow_id, via }.log();

        if self.semaphore.available_permits() == 0 && !self.saturated.swap(true, Ordering::Relaxed) {
            WorkerPoolSaturated { evaluator: &self.settings.tool_name, capacity: self.settings.max_concurrency }.log();
        }
        let _permit = self.semaphore.acquire().await.expect("semaphore is never closed");
        self.saturated.store(false, Ordering::Relaxed);

        let started = std::time::Instant::now();

        let handler = match self.registry.get(&request.function) {
            Some(handler) => handler,
            None => {
                let err = RuntimeError::UnknownFunction(request.function.clone());
                let envelope = ResultEnvelope::err(&self.settings.tool_name, &request.workflow_id, &request.function, err.to_string());
                return (envelope, Some(err));
            }
        };

        let dependency_results = match resolve_dependencies(
            &self.http_client,
            &self.registry,
            &request,
            self.settings.peer_call_timeout(),
            self.settings.peer_call_retry_attempts,
        )
        .await
        {
            Ok(results) => results,
            Err(err) => {
                let envelope = ResultEnvelope::err(&self.settings.tool_name, &request.workflow_id, &request.function, err.to_string());
                return (envelope, Some(err));
            }
        };

        match handler.invoke(&request.architecture, &dependency_results).await {
            Ok(value) => {
                HandlerCompleted {
                    function: &request.function,
                    workflow_id: &request.workflow_id,
                    elapsed_ms: started.elapsed().as_millis(),
                }
                .log();
                let envelope = ResultEnvelope::ok(&self.settings.tool_name, &request.workflow_id, &request.function, value);
                (envelope, None)
            }
            Err(err) => {
                let envelope = ResultEnvelope::err(&self.settings.tool_name, &request.workflow_id, &request.function, err.to_string());
                let status_err = RuntimeError::Handler { function: request.function.clone(), reason: err.to_string() };
                (envelope, Some(status_err))
            }
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handle_http(
    State(host): State<Arc<EvaluatorHost>>,
    Path(function): Path<String>,
    Json(mut request): Json<EvaluationRequest>,
) -> (StatusCode, Json<ResultEnvelope>) {
    request.function = function;
    let (envelope, status_err) = host.handle(request, "http").await;
    let status = match status_err {
        None => StatusCode::OK,
        Some(err) => StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    };
    (status, Json(envelope))
}
