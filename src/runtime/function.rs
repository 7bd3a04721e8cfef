// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The handler trait every registered function implements. Plays the role
//! of the teacher's `traits::processor::Processor`, generalized from a
//! protobuf `ProcessorRequest`/`ProcessorResponse` pair to the JSON
//! dependency-results map the Evaluator Runtime marshals per spec §4.2 step 3.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RuntimeError;
use crate::schemas::Architecture;

/// A single atomic computation a tool exposes. Implementations must be
/// side-effect-free beyond logging (spec §4.2 "State") — any expensive
/// read-only resource (orbit models, numerical tables) is initialized once
/// by the host and handed to the handler by reference, not reloaded per call.
#[async_trait]
pub trait Function: Send + Sync {
    /// The function name this handler answers to, matching the knowledge
    /// graph's `Function.name` and the `POST /<function_name>` route.
    fn name(&self) -> &str;

    /// Invoke with the architecture and the already-resolved results of
    /// every declared dependency, keyed exactly by dependency function name
    /// (Testable Property 6).
    async fn invoke(
        &self,
        architecture: &Architecture,
        dependency_results: &HashMap<String, Value>,
    ) -> Result<Value, RuntimeError>;
}
