// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Workflow Synthesizer: metric resolution, dependency closure, tool
//! binding, level assignment, and workflow document assembly (spec §4.1).

pub mod levels;
pub mod synthesizer;

pub use synthesizer::Synthesizer;
