// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-request failure taxonomy for the Evaluator Runtime, mirroring the
//! teacher's `ProcessorMapError` shape (`errors/processor_map.rs`) but keyed
//! by function name and HTTP/bus outcome rather than by backend type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("function '{0}' is not implemented by this evaluator")]
    UnknownFunction(String),

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("dependency '{function}' at {uri} did not respond within the deadline")]
    Timeout { function: String, uri: String },

    #[error("dependency '{function}' at {uri} returned an error: {reason}")]
    Dependency {
        function: String,
        uri: String,
        reason: String,
    },

    #[error("handler for '{function}' failed: {reason}")]
    Handler { function: String, reason: String },
}

impl RuntimeError {
    /// HTTP status this failure surfaces as on the synchronous peer path.
    pub fn status_code(&self) -> u16 {
        match self {
            RuntimeError::UnknownFunction(_) | RuntimeError::Malformed(_) => 400,
            RuntimeError::Timeout { .. } | RuntimeError::Dependency { .. } | RuntimeError::Handler { .. } => 500,
        }
    }
}
