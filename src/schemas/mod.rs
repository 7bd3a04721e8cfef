// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire envelopes exchanged over HTTP and the pub/sub bus.
//!
//! Every type here round-trips through `serde_json` and keeps an `extra`
//! catch-all map so unknown fields survive a parse → forward hop instead of
//! being silently dropped (see `design::Unknown` in [`envelope`]).

pub mod architecture;
pub mod envelope;
pub mod tse;
pub mod workflow;

pub use architecture::Architecture;
pub use envelope::{DependencyRef, EvaluationRequest, FunctionDependencies, ResultEnvelope};
pub use tse::{DesignSpace, Mission, Objective, ObjectiveDirection, Solution, TseRequest};
pub use workflow::{ObjectiveOwned, Workflow, WorkflowNode};
