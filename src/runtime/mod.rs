// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The Evaluator Runtime framework every evaluator service embeds (spec §4.2).

pub mod function;
pub mod host;
pub mod peer;
pub mod registry;

pub mod stub;

pub use function::Function;
pub use host::EvaluatorHost;
pub use registry::FunctionRegistry;
