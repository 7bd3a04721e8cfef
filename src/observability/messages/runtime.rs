// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use tracing::{info_span, Span};

use super::StructuredLog;

pub struct RequestReceived<'a> {
    pub function: &'a str,
    pub workflow_id: &'a str,
    pub via: &'a str,
}

impl fmt::Display for RequestReceived<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received {} request for function '{}' (workflow {})",
            self.via, self.function, self.workflow_id
        )
    }
}

impl StructuredLog for RequestReceived<'_> {
    fn log(&self) {
        tracing::debug!(
            function = self.function,
            workflow_id = self.workflow_id,
            via = self.via,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("runtime", event = name, function = self.function, workflow_id = self.workflow_id)
    }
}

pub struct DependencyResolutionFailed<'a> {
    pub function: &'a str,
    pub dependency: &'a str,
    pub reason: &'a str,
}

impl fmt::Display for DependencyResolutionFailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dependency '{}' of function '{}' failed: {}",
            self.dependency, self.function, self.reason
        )
    }
}

impl StructuredLog for DependencyResolutionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            function = self.function,
            dependency = self.dependency,
            reason = self.reason,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("runtime", event = name, function = self.function, dependency = self.dependency)
    }
}

pub struct HandlerCompleted<'a> {
    pub function: &'a str,
    pub workflow_id: &'a str,
    pub elapsed_ms: u128,
}

impl fmt::Display for HandlerCompleted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "function '{}' completed in {}ms (workflow {})",
            self.function, self.elapsed_ms, self.workflow_id
        )
    }
}

impl StructuredLog for HandlerCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            function = self.function,
            workflow_id = self.workflow_id,
            elapsed_ms = self.elapsed_ms as u64,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("runtime", event = name, function = self.function, workflow_id = self.workflow_id)
    }
}

pub struct WorkerPoolSaturated<'a> {
    pub evaluator: &'a str,
    pub capacity: usize,
}

impl fmt::Display for WorkerPoolSaturated<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker pool for '{}' saturated at capacity {}; new requests will wait",
            self.evaluator, self.capacity
        )
    }
}

impl StructuredLog for WorkerPoolSaturated<'_> {
    fn log(&self) {
        tracing::warn!(evaluator = self.evaluator, capacity = self.capacity, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        info_span!("runtime", event = name, evaluator = self.evaluator)
    }
}
