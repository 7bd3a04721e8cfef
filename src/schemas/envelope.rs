// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `EvaluationRequest` / `ResultEnvelope` — the two envelopes that cross
//! every Evaluator Runtime boundary, whether carried over HTTP (peer calls)
//! or the pub/sub bus (Dispatcher fan-out).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Architecture;

/// Resolved location of one required upstream function: either the literal
/// sentinel `self` (same tool, no network hop) or a fully-qualified peer URI
/// (`http://host:port/<function>`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DependencyRef {
    SameTool(SelfSentinel),
    Peer(String),
}

/// Serializes/deserializes as the literal string `"self"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfSentinel;

impl Serialize for SelfSentinel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("self")
    }
}

impl<'de> Deserialize<'de> for SelfSentinel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "self" {
            Ok(SelfSentinel)
        } else {
            Err(serde::de::Error::custom(
                "expected literal \"self\" for same-tool dependency",
            ))
        }
    }
}

impl DependencyRef {
    pub fn is_self(&self) -> bool {
        matches!(self, DependencyRef::SameTool(_))
    }

    pub fn peer_uri(&self) -> Option<&str> {
        match self {
            DependencyRef::Peer(uri) => Some(uri.as_str()),
            DependencyRef::SameTool(_) => None,
        }
    }
}

/// Per-function dependency map: required function name → resolved ref.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDependencies {
    pub dependencies: HashMap<String, DependencyRef>,
}

/// The envelope crossing every Evaluator Runtime boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub architecture: Architecture,
    pub workflow_id: String,
    pub function: String,
    pub result_topic: String,
    /// Keyed by function name (including `function` itself for peer calls
    /// that only need their own dependency slice, and upstream functions
    /// the dispatcher snapshotted at synthesis time).
    pub dependencies: HashMap<String, FunctionDependencies>,

    /// Unknown fields preserved verbatim so a forwarding hop never drops
    /// caller-supplied extras (design-space sweep ids, debug hints, etc.).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EvaluationRequest {
    /// The dependency map this function itself should resolve before
    /// invoking its handler.
    pub fn own_dependencies(&self) -> Option<&FunctionDependencies> {
        self.dependencies.get(&self.function)
    }
}

/// Successful or failed result returned by a function invocation, on both
/// the HTTP and pub/sub paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub evaluator: String,
    pub workflow_id: String,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn ok(evaluator: impl Into<String>, workflow_id: impl Into<String>, function: impl Into<String>, results: Value) -> Self {
        Self {
            evaluator: evaluator.into(),
            workflow_id: workflow_id.into(),
            function: function.into(),
            results: Some(results),
            error: None,
        }
    }

    pub fn err(evaluator: impl Into<String>, workflow_id: impl Into<String>, function: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            evaluator: evaluator.into(),
            workflow_id: workflow_id.into(),
            function: function.into(),
            results: None,
            error: Some(error.into()),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_ref_round_trips_self_sentinel() {
        let value = serde_json::to_value(DependencyRef::SameTool(SelfSentinel)).unwrap();
        assert_eq!(value, Value::String("self".into()));
        let parsed: DependencyRef = serde_json::from_value(value).unwrap();
        assert!(parsed.is_self());
    }

    #[test]
    fn dependency_ref_round_trips_peer_uri() {
        let value = serde_json::to_value(DependencyRef::Peer("http://orbitpy:8080/Propagation".into())).unwrap();
        let parsed: DependencyRef = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.peer_uri(), Some("http://orbitpy:8080/Propagation"));
    }

    #[test]
    fn evaluation_request_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "architecture": {"id": "arch-0", "numSatellites": 4},
            "workflow_id": "wf-1",
            "function": "CoverageAnalysis",
            "result_topic": "wf-1/arch-0",
            "dependencies": {},
            "debugHint": "replay-me"
        });
        let req: EvaluationRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.extra.get("debugHint").unwrap(), "replay-me");
    }
}
