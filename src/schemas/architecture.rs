// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque candidate design. The core never interprets its contents beyond
/// the `id` field it stamps on during enumeration; everything else rides
/// along as an untyped JSON object so evaluators can read whatever fields
/// their function needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Architecture {
    pub id: String,
    #[serde(flatten)]
    pub body: Value,
}

impl Architecture {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }

    /// Flatten design variables (the non-`id` top-level scalars) into the
    /// name → value pairs that land as `summary.csv` columns.
    pub fn design_variables(&self) -> Vec<(String, Value)> {
        match self.body.as_object() {
            Some(map) => map
                .iter()
                .filter(|(k, _)| k.as_str() != "id")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => Vec::new(),
        }
    }
}
