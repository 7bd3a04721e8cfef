// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use tracing::{info_span, Span};

use super::StructuredLog;

pub struct RunAccepted<'a> {
    pub workflow_id: &'a str,
    pub architecture_count: usize,
}

impl fmt::Display for RunAccepted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted run {}: {} architectures enumerated",
            self.workflow_id, self.architecture_count
        )
    }
}

impl StructuredLog for RunAccepted<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            architecture_count = self.architecture_count,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("dispatcher", event = name, workflow_id = self.workflow_id)
    }
}

pub struct ArchitectureCompleted<'a> {
    pub workflow_id: &'a str,
    pub architecture_id: &'a str,
    pub errored: bool,
}

impl fmt::Display for ArchitectureCompleted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "architecture {} ({}) completed{}",
            self.architecture_id,
            self.workflow_id,
            if self.errored { " with errors" } else { "" }
        )
    }
}

impl StructuredLog for ArchitectureCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            architecture_id = self.architecture_id,
            errored = self.errored,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!(
            "dispatcher",
            event = name,
            workflow_id = self.workflow_id,
            architecture_id = self.architecture_id
        )
    }
}

pub struct CallbackDeliveryFailed<'a> {
    pub url: &'a str,
    pub attempt: u32,
    pub reason: &'a str,
}

impl fmt::Display for CallbackDeliveryFailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "callback to {} failed on attempt {}: {}",
            self.url, self.attempt, self.reason
        )
    }
}

impl StructuredLog for CallbackDeliveryFailed<'_> {
    fn log(&self) {
        tracing::warn!(url = self.url, attempt = self.attempt, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        info_span!("dispatcher", event = name, url = self.url, attempt = self.attempt)
    }
}

pub struct RunCancelled<'a> {
    pub workflow_id: &'a str,
    pub solutions_delivered: usize,
}

impl fmt::Display for RunCancelled<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {} cancelled after {} solutions delivered",
            self.workflow_id, self.solutions_delivered
        )
    }
}

impl StructuredLog for RunCancelled<'_> {
    fn log(&self) {
        tracing::info!(
            workflow_id = self.workflow_id,
            solutions_delivered = self.solutions_delivered,
            "{}",
            self
        );
    }

    fn span(&self, name: &str) -> Span {
        info_span!("dispatcher", event = name, workflow_id = self.workflow_id)
    }
}
