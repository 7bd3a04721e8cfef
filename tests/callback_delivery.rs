// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Integration coverage for `CallbackClient` against a real HTTP listener
//! (spec §4.3 "Correlation & completion": "pushes it to `callbackUrl`
//! (HTTP POST, fire-and-retry up to N times with exponential backoff)").
//! `wiremock` stands in for the caller's callback endpoint.

use std::time::Duration;

use serde_json::json;
use tradecore::dispatcher::CallbackClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn delivers_solution_body_to_callback_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = CallbackClient::new(format!("{}/callback", server.uri()), Duration::from_secs(1), 3);
    let solution = json!({
        "solutionId": "arch-0",
        "designVariables": {"numSatellites": 4},
        "objectives": {"LifecycleCost": 42.0}
    });

    client.deliver(&solution).await.expect("delivery should succeed against a healthy endpoint");
}

#[tokio::test]
async fn retries_on_failure_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = CallbackClient::new(format!("{}/callback", server.uri()), Duration::from_secs(1), 5);
    let notice = json!({"workflow_id": "wf-1", "cancelled": true});

    client.deliver(&notice).await.expect("should eventually succeed after transient failures");
}

#[tokio::test]
async fn reports_permanent_failure_after_exhausting_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/callback"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = CallbackClient::new(format!("{}/callback", server.uri()), Duration::from_secs(1), 2);
    let solution = json!({"solutionId": "arch-1", "designVariables": {}, "objectives": {}});

    let result = client.deliver(&solution).await;
    assert!(result.is_err(), "permanently failing endpoint must surface an error, not hang or panic");
}
