// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Integration coverage for `EvaluatorHost`'s HTTP ingress (spec §4.2,
//! §6): a request whose function declares a peer dependency resolves that
//! dependency over real HTTP before the handler runs (Testable Property 6,
//! "dependency marshalling"), and a handler/unknown-function failure
//! surfaces as the documented status code.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tradecore::config::{BusSettings, EvaluatorSettings};
use tradecore::errors::RuntimeError;
use tradecore::runtime::stub::{FailingFunction, StubFunction};
use tradecore::runtime::{EvaluatorHost, Function, FunctionRegistry};
use tradecore::schemas::envelope::{DependencyRef, EvaluationRequest, FunctionDependencies};
use tradecore::schemas::{Architecture, ResultEnvelope};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Echoes back whatever dependency results it was handed, so the test can
/// assert they arrived keyed exactly by dependency function name.
struct EchoDependencies;

#[async_trait]
impl Function for EchoDependencies {
    fn name(&self) -> &str {
        "Access"
    }

    async fn invoke(&self, _architecture: &Architecture, deps: &HashMap<String, Value>) -> Result<Value, RuntimeError> {
        Ok(json!({ "seenDependencies": deps }))
    }
}

async fn spawn_host(registry: FunctionRegistry) -> String {
    let settings = EvaluatorSettings {
        tool_name: "TestTool".into(),
        listen_addr: "127.0.0.1:0".into(),
        bus: BusSettings { broker_host: "localhost".into(), broker_port: 1883, client_id: "test-tool".into() },
        max_concurrency: 4,
        peer_call_timeout_seconds: 5,
        peer_call_retry_attempts: 1,
        functions: vec![],
    };
    let host = Arc::new(EvaluatorHost::new(settings, registry));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, host.router()).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn resolves_peer_dependency_before_invoking_handler() {
    let peer = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/Propagation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            ResultEnvelope::ok("OrbitPy", "wf-1", "Propagation", json!({"orbitState": "stable"})),
        ))
        .mount(&peer)
        .await;

    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(EchoDependencies));
    let base_url = spawn_host(registry).await;

    let mut dependencies = HashMap::new();
    let mut access_deps = HashMap::new();
    access_deps.insert("Propagation".to_string(), DependencyRef::Peer(format!("{}/Propagation", peer.uri())));
    dependencies.insert("Access".to_string(), FunctionDependencies { dependencies: access_deps });

    let request = EvaluationRequest {
        architecture: Architecture::new("arch-0", json!({"numSatellites": 4})),
        workflow_id: "wf-1".to_string(),
        function: "Access".to_string(),
        result_topic: "wf-1/arch-0".to_string(),
        dependencies,
        extra: Default::default(),
    };

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}/Access"))
        .json(&request)
        .send()
        .await
        .expect("request to the evaluator host should succeed");

    assert_eq!(response.status(), 200);
    let envelope: ResultEnvelope = response.json().await.unwrap();
    assert!(envelope.error.is_none());
    let results = envelope.results.unwrap();
    assert_eq!(results["seenDependencies"]["Propagation"]["orbitState"], "stable");
}

#[tokio::test]
async fn resolves_self_bound_dependency_by_invoking_the_local_handler() {
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(StubFunction {
        name: "Propagation".into(),
        payload: json!({"orbitState": "in-process"}),
    }));
    registry.register(Arc::new(EchoDependencies));
    let base_url = spawn_host(registry).await;

    let mut dependencies = HashMap::new();
    let mut access_deps = HashMap::new();
    access_deps.insert("Propagation".to_string(), DependencyRef::SameTool(tradecore::schemas::envelope::SelfSentinel));
    dependencies.insert("Access".to_string(), FunctionDependencies { dependencies: access_deps });

    let request = EvaluationRequest {
        architecture: Architecture::new("arch-0", json!({})),
        workflow_id: "wf-4".to_string(),
        function: "Access".to_string(),
        result_topic: "wf-4/arch-0".to_string(),
        dependencies,
        extra: Default::default(),
    };

    let client = reqwest::Client::new();
    let response = client.post(format!("{base_url}/Access")).json(&request).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let envelope: ResultEnvelope = response.json().await.unwrap();
    let results = envelope.results.unwrap();
    assert_eq!(results["seenDependencies"]["Propagation"]["orbitState"], "in-process");
}

#[tokio::test]
async fn unknown_function_surfaces_as_400() {
    let base_url = spawn_host(FunctionRegistry::new()).await;

    let request = EvaluationRequest {
        architecture: Architecture::new("arch-0", json!({})),
        workflow_id: "wf-2".to_string(),
        function: "NoSuchFunction".to_string(),
        result_topic: "wf-2/arch-0".to_string(),
        dependencies: HashMap::new(),
        extra: Default::default(),
    };

    let client = reqwest::Client::new();
    let response = client.post(format!("{base_url}/NoSuchFunction")).json(&request).send().await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn handler_failure_surfaces_as_500_without_blocking_the_process() {
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(FailingFunction { name: "Cost".into(), reason: "simulated failure".into() }));
    let base_url = spawn_host(registry).await;

    let request = EvaluationRequest {
        architecture: Architecture::new("arch-0", json!({})),
        workflow_id: "wf-3".to_string(),
        function: "Cost".to_string(),
        result_topic: "wf-3/arch-0".to_string(),
        dependencies: HashMap::new(),
        extra: Default::default(),
    };

    let client = reqwest::Client::new();
    let response = client.post(format!("{base_url}/Cost")).json(&request).send().await.unwrap();
    assert_eq!(response.status(), 500);

    // The process is still alive for an unrelated request (spec §4.2
    // "A failed request never blocks unrelated requests").
    let health = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);
}
