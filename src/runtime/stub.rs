// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test-only function handlers, mirroring the teacher's
//! `backends::stub::{StubProcessor, FailingProcessor}` pattern generalized
//! to the `Function` trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RuntimeError;
use crate::schemas::Architecture;

use super::function::Function;

/// Always succeeds, echoing a fixed payload.
pub struct StubFunction {
    pub name: String,
    pub payload: Value,
}

#[async_trait]
impl Function for StubFunction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _architecture: &Architecture, _deps: &HashMap<String, Value>) -> Result<Value, RuntimeError> {
        Ok(self.payload.clone())
    }
}

/// Always fails, for exercising Testable Property 5 (a failure never
/// blocks unrelated requests) and the Dispatcher's `errored` path (S5).
pub struct FailingFunction {
    pub name: String,
    pub reason: String,
}

#[async_trait]
impl Function for FailingFunction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _architecture: &Architecture, _deps: &HashMap<String, Value>) -> Result<Value, RuntimeError> {
        Err(RuntimeError::Handler { function: self.name.clone(), reason: self.reason.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn stub_function_echoes_payload() {
        let stub = StubFunction { name: "Cost".into(), payload: serde_json::json!({"LifecycleCost": 42.0}) };
        let arch = Architecture::new("arch-0", serde_json::json!({}));
        let result = stub.invoke(&arch, &HashMap::new()).await.unwrap();
        assert_eq!(result["LifecycleCost"], 42.0);
    }

    #[tokio::test]
    async fn failing_function_surfaces_handler_error() {
        let failing = FailingFunction { name: "Cost".into(), reason: "simulated failure".into() };
        let arch = Architecture::new("arch-0", serde_json::json!({}));
        let err = failing.invoke(&arch, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Handler { .. }));
    }
}
