// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::InfeasibleError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("workflow synthesis failed: {0}")]
    Infeasible(#[from] InfeasibleError),

    #[error("unknown workflow id '{0}'")]
    UnknownWorkflow(String),

    #[error("run '{0}' was already cancelled")]
    AlreadyCancelled(String),

    #[error("callback delivery to {url} failed after {attempts} attempts: {reason}")]
    CallbackFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("lost connection to the pub/sub bus: {0}")]
    BusUnavailable(String),
}
