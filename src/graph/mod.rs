// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A small, read-only knowledge-graph client. Wraps a pooled `neo4rs` graph
//! handle and exposes exactly the three Cypher shapes the Workflow
//! Synthesizer needs — mirroring `original_source/workflow_generator.py`'s
//! `execute_query` calls one-for-one, generalized from raw dict results into
//! typed rows.

mod client;

pub use client::{KnowledgeGraphClient, KnowledgeGraphError};
