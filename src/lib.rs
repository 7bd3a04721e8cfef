// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod graph;
pub mod observability;
pub mod runtime;
pub mod schemas;
pub mod synth;
