// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and distributed tracing.
//!
//! Each message type implements:
//!
//! * `Display` - Human-readable output (supports future i18n)
//! * `StructuredLog` - Machine-readable fields + span creation
//!
//! # Usage
//! ```rust
//! use tradecore::observability::messages::{StructuredLog, synth::WorkflowSynthesized};
//!
//! let msg = WorkflowSynthesized { workflow_id: "wf-1", node_count: 4, tool_count: 3 };
//! msg.log();
//! let span = msg.span("workflow_synthesis");
//! let _guard = span.enter();
//! ```

pub mod dispatcher;
pub mod runtime;
pub mod synth;

use tracing::Span;

/// Trait for messages that support structured logging and distributed
/// tracing: emit a log event with machine-readable fields, or open a span
/// carrying those same fields as attributes.
pub trait StructuredLog {
    /// Emit a log event. Human-readable via `Display`, machine-readable via
    /// whatever fields the implementor chooses to attach.
    fn log(&self);

    /// Open a span named `name` with this message's fields as attributes.
    fn span(&self, name: &str) -> Span;
}
