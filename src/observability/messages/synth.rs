// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use tracing::{info_span, Span};

use super::StructuredLog;

/// A metric resolved to zero candidate functions — synthesis is about to
/// fail infeasible.
pub struct NoFunctionForMetric<'a> {
    pub metric: &'a str,
}

impl fmt::Display for NoFunctionForMetric<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no functions calculate metric '{}'", self.metric)
    }
}

impl StructuredLog for NoFunctionForMetric<'_> {
    fn log(&self) {
        tracing::warn!(metric = self.metric, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        info_span!("synth", event = name, metric = self.metric)
    }
}

/// A cycle was found while closing the REQUIRES dependency graph.
pub struct CyclicDependencyDetected<'a> {
    pub cycle: &'a [String],
}

impl fmt::Display for CyclicDependencyDetected<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cyclic dependency detected: {}", self.cycle.join(" -> "))
    }
}

impl StructuredLog for CyclicDependencyDetected<'_> {
    fn log(&self) {
        tracing::error!(cycle = ?self.cycle, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        info_span!("synth", event = name, cycle_len = self.cycle.len())
    }
}

/// A workflow was successfully synthesized.
pub struct WorkflowSynthesized<'a> {
    pub workflow_id: &'a str,
    pub node_count: usize,
    pub tool_count: usize,
}

impl fmt::Display for WorkflowSynthesized<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "synthesized workflow {}: {} nodes across {} tools",
            self.workflow_id, self.node_count, self.tool_count
        )
    }
}

impl StructuredLog for WorkflowSynthesized<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            node_count = self.node_count,
            tool_count = self.tool_count,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("synth", event = name, workflow_id = self.workflow_id)
    }
}
