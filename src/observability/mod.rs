// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging, tracing, and metrics.
//!
//! This module provides centralized message types for all diagnostic and
//! operational logging across the synthesizer, evaluator runtime, and
//! dispatcher. Message types follow a struct-based pattern with `Display`
//! implementations to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Enable future internationalization without code changes
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::synth` - workflow synthesis events
//! * `messages::runtime` - evaluator request lifecycle events
//! * `messages::dispatcher` - TSE run lifecycle and correlation events

pub mod messages;
