// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Outbound dependency resolution: calling peer evaluators over HTTP, or —
//! for the `self` sentinel — invoking the local handler in-process.
//!
//! The peer-HTTP branch is the seam the teacher left unimplemented —
//! `ProcessorMap::from_config` explicitly returns `Err("HTTP client
//! support is not yet supported")` for `BackendType::Http`. Dependencies
//! bound to a different tool live on a separate process entirely, so
//! resolving them always means an outbound HTTP call. A `self`-bound
//! dependency is produced by the same evaluator, so it is resolved (and,
//! recursively, its own dependencies) without a network hop.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::errors::RuntimeError;
use crate::observability::messages::{runtime::DependencyResolutionFailed, StructuredLog};
use crate::schemas::envelope::{DependencyRef, EvaluationRequest, FunctionDependencies};
use crate::schemas::ResultEnvelope;

use super::registry::FunctionRegistry;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolve every dependency of `function` declared in the request's
/// dependency map, in parallel where independent (spec §4.2 step 2).
/// Boxed because a `self`-bound dependency resolves by recursing into this
/// same function for its own dependencies.
pub fn resolve_dependencies<'a>(
    client: &'a reqwest::Client,
    registry: &'a FunctionRegistry,
    outer: &'a EvaluationRequest,
    timeout: Duration,
    retry_attempts: u32,
) -> BoxFuture<'a, Result<HashMap<String, Value>, RuntimeError>> {
    Box::pin(async move {
        let own = match outer.own_dependencies() {
            Some(deps) => deps,
            None => return Ok(HashMap::new()),
        };

        let calls = own.dependencies.iter().map(|(dep_name, dep_ref)| {
            resolve_one(client, registry, outer, dep_name, dep_ref, timeout, retry_attempts)
        });

        let results = join_all(calls).await;
        let mut out = HashMap::new();
        for result in results {
            let (dep_name, value) = result?;
            out.insert(dep_name, value);
        }
        Ok(out)
    })
}

async fn resolve_one(
    client: &reqwest::Client,
    registry: &FunctionRegistry,
    outer: &EvaluationRequest,
    dep_name: &str,
    dep_ref: &DependencyRef,
    timeout: Duration,
    retry_attempts: u32,
) -> Result<(String, Value), RuntimeError> {
    let uri = match dep_ref.peer_uri() {
        Some(uri) => uri.to_string(),
        None => return resolve_same_tool(client, registry, outer, dep_name, timeout, retry_attempts).await,
    };

    let inner_request = EvaluationRequest {
        architecture: outer.architecture.clone(),
        workflow_id: outer.workflow_id.clone(),
        function: dep_name.to_string(),
        result_topic: outer.result_topic.clone(),
        dependencies: {
            let mut m = HashMap::new();
            if let Some(deps) = outer.dependencies.get(dep_name) {
                m.insert(dep_name.to_string(), FunctionDependencies { dependencies: deps.dependencies.clone() });
            }
            m
        },
        extra: Default::default(),
    };

    let backoff = ExponentialBackoff::from_millis(50).map(jitter).take(retry_attempts as usize);
    let dep_name_owned = dep_name.to_string();
    let result = Retry::spawn(backoff, || async {
        client
            .post(&uri)
            .timeout(timeout)
            .json(&inner_request)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())
    })
    .await;

    let response = match result {
        Ok(response) => response,
        Err(reason) => {
            let err = RuntimeError::Timeout { function: dep_name_owned.clone(), uri: uri.clone() };
            DependencyResolutionFailed { function: &outer.function, dependency: dep_name, reason: &reason }.log();
            return Err(err);
        }
    };

    let envelope: ResultEnvelope = response
        .json()
        .await
        .map_err(|e| RuntimeError::Dependency { function: dep_name_owned.clone(), uri: uri.clone(), reason: e.to_string() })?;

    if let Some(error) = envelope.error {
        let err = RuntimeError::Dependency { function: dep_name_owned.clone(), uri, reason: error.clone() };
        DependencyResolutionFailed { function: &outer.function, dependency: dep_name, reason: &error }.log();
        return Err(err);
    }

    let value = envelope.results.unwrap_or(Value::Null);
    Ok((dep_name_owned, value))
}

/// `self` sentinel: `dep_name` is implemented by this same evaluator, so
/// its result comes from invoking the registered handler directly rather
/// than an HTTP round trip. Its own dependencies (which may themselves be
/// `self`-bound or peer-bound) are resolved first via the same recursive
/// call, matching the ordinary HTTP path's "resolve deps, then invoke".
async fn resolve_same_tool(
    client: &reqwest::Client,
    registry: &FunctionRegistry,
    outer: &EvaluationRequest,
    dep_name: &str,
    timeout: Duration,
    retry_attempts: u32,
) -> Result<(String, Value), RuntimeError> {
    let handler = registry
        .get(dep_name)
        .ok_or_else(|| RuntimeError::UnknownFunction(dep_name.to_string()))?;

    let inner_request = EvaluationRequest {
        architecture: outer.architecture.clone(),
        workflow_id: outer.workflow_id.clone(),
        function: dep_name.to_string(),
        result_topic: outer.result_topic.clone(),
        dependencies: outer.dependencies.clone(),
        extra: Default::default(),
    };

    let nested_results = resolve_dependencies(client, registry, &inner_request, timeout, retry_attempts).await?;
    let value = handler.invoke(&outer.architecture, &nested_results).await?;
    Ok((dep_name.to_string(), value))
}
