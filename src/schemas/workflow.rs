// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The synthesized workflow document (spec §3 `WorkflowNode` / `Workflow`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::DependencyRef;
use super::tse::Objective;

/// One (function, tool) binding placed at an integer level ≥ 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub function: String,
    pub tool: String,
    pub level: u32,
    /// required function name → resolved URI of the tool implementing it,
    /// or the sentinel `self` if bound to the same tool. `BTreeMap` so the
    /// synthesized document serializes with a stable key order (Testable
    /// Property 3: Determinism) instead of `HashMap`'s per-process
    /// randomized iteration order.
    pub dependencies: BTreeMap<String, DependencyRef>,
}

/// Ordered collection of WorkflowNodes plus top-level objectives and
/// publish/subscribe wiring. Immutable once synthesized — shared by
/// reference across every architecture dispatched under one `workflow_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub workflow_id: String,
    pub nodes: Vec<WorkflowNode>,
    #[serde(skip)]
    pub objectives: Vec<ObjectiveOwned>,
    /// metric name → producing function name, the binding `dispatch_architectures`
    /// (`dispatcher::run`) dispatches to directly: each objective metric's
    /// producer pulls its own upstream `REQUIRES` chain via
    /// `resolve_dependencies`, so dispatch never needs to target every
    /// Level-1 node. `BTreeMap` for deterministic serialization.
    pub metric_producers: BTreeMap<String, String>,
    /// metric name → publish endpoint `evaluators/<tool>/<function>`.
    pub publish_metrics: BTreeMap<String, String>,
    /// tool name → max(level over its functions), from a second DFS over
    /// the tool-granularity graph induced by cross-tool dependencies.
    pub tool_levels: BTreeMap<String, u32>,
    /// aggregation topic the Dispatcher itself subscribes to.
    pub subscribe_topic: String,
}

/// Owned copy of [`Objective`] so `Workflow` doesn't borrow from the
/// originating `TseRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveOwned {
    pub metric_name: String,
    pub direction: super::tse::ObjectiveDirection,
}

impl From<&Objective> for ObjectiveOwned {
    fn from(o: &Objective) -> Self {
        Self {
            metric_name: o.metric_name.clone(),
            direction: o.direction,
        }
    }
}

impl Workflow {
    /// Level-1 nodes: functions with no required upstream functions. Not a
    /// dispatch entry point by itself — the Evaluator Runtime is pull-based
    /// (a function resolves its own upstream `REQUIRES` chain on demand via
    /// `resolve_dependencies`), so dispatch must target each objective's
    /// *producer*, not every Level-1 node. See [`Workflow::objective_producer_nodes`].
    pub fn entry_nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.iter().filter(|n| n.level == 1)
    }

    pub fn node_for_function(&self, function: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.function == function)
    }

    /// The distinct (function, tool) nodes that produce a requested
    /// objective metric — what `dispatch_architectures` (`dispatcher::run`)
    /// actually requests per architecture. Each producer resolves its own
    /// upstream dependencies before its handler runs, so dispatching only
    /// the producers is sufficient to pull the whole workflow (spec §4.2
    /// step 2, §4.3 "Dispatch"). Deduplicated by function name (two
    /// objectives sharing one producer dispatch once) and returned in
    /// stable function-name order.
    pub fn objective_producer_nodes(&self) -> Vec<&WorkflowNode> {
        let mut functions: Vec<&str> = self
            .objectives
            .iter()
            .filter_map(|o| self.metric_producers.get(&o.metric_name).map(String::as_str))
            .collect();
        functions.sort_unstable();
        functions.dedup();
        functions
            .into_iter()
            .filter_map(|function| self.node_for_function(function))
            .collect()
    }

    /// Every required metric name, for building the Dispatcher's
    /// per-architecture completion bitmap.
    pub fn required_metrics(&self) -> Vec<&str> {
        self.objectives.iter().map(|o| o.metric_name.as_str()).collect()
    }
}
