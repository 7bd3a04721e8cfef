// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Synthesis-time failure. All failure paths collapse into a single
//! `InfeasibleError` naming the first offending constraint — mirrors the
//! teacher's `ValidationError` taxonomy (`config/validation.rs`), generalized
//! from processors to functions and widened with tool-binding/cycle cases.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfeasibleError {
    #[error("no functions calculate metric '{metric}'")]
    NoFunctionForMetric { metric: String },

    #[error("tool '{tool}' does not implement function '{function}'")]
    ToolDoesNotImplementFunction { tool: String, function: String },

    #[error("no tools implement function '{function}'")]
    NoToolForFunction { function: String },

    #[error("cycle through {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },
}

impl InfeasibleError {
    /// The constraint name this failure should surface first, per the
    /// "first offending constraint" contract (spec §4.1 Failure semantics).
    pub fn offending_constraint(&self) -> &str {
        match self {
            InfeasibleError::NoFunctionForMetric { metric } => metric,
            InfeasibleError::ToolDoesNotImplementFunction { tool, .. } => tool,
            InfeasibleError::NoToolForFunction { function } => function,
            InfeasibleError::Cycle { cycle } => cycle.first().map(String::as_str).unwrap_or(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_missing_metric() {
        let err = InfeasibleError::NoFunctionForMetric { metric: "LifecycleCost".into() };
        assert!(err.to_string().contains("LifecycleCost"));
    }

    #[test]
    fn display_mentions_nonexistent_tool() {
        let err = InfeasibleError::ToolDoesNotImplementFunction {
            tool: "NonexistentTool".into(),
            function: "CostEstimation".into(),
        };
        let text = err.to_string();
        assert!(text.contains("NonexistentTool"));
        assert!(text.contains("CostEstimation"));
    }
}
